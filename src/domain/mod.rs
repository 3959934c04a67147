pub mod event_log;
pub mod fault;
pub mod grid;
pub mod restoration;

pub use event_log::*;
pub use fault::*;
pub use grid::*;
pub use restoration::*;
