use thiserror::Error;

/// Failures of the FLISR engine and its store boundary
#[derive(Debug, Error)]
pub enum FlisrError {
    /// Non-positive or non-finite physical inputs, or unparseable timestamps
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timestamp delta cannot be represented exactly as an f64
    #[error("Precision error: {0}")]
    Precision(String),

    /// Fault event missing, already resolved, or lacking connection/timestamps
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persist step failed and was rolled back
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Read-side store failure
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl FlisrError {
    /// Errors raised by the distance estimator
    pub fn is_calculation(&self) -> bool {
        matches!(self, FlisrError::InvalidParameter(_) | FlisrError::Precision(_))
    }
}
