use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::commands::{self, CommandChannel};
use crate::config::Config;
use crate::flisr::FlisrWorkflow;
use crate::repo::{GridStore, Repositories};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub store: Arc<dyn GridStore>,
    pub workflow: Arc<FlisrWorkflow>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Repositories::new(&cfg).await?;
        let channel = commands::build_channel(&cfg.commands)?;
        info!(mode = ?cfg.commands.mode, "switch command channel ready");
        Ok(Self::from_parts(cfg, repos.store, channel))
    }

    /// Wire state from already-built components
    pub fn from_parts(
        cfg: Config,
        store: Arc<dyn GridStore>,
        commands: Arc<dyn CommandChannel>,
    ) -> Self {
        let workflow = Arc::new(FlisrWorkflow::new(store.clone(), commands));
        Self {
            cfg,
            store,
            workflow,
        }
    }
}
