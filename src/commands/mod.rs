//! Switch command channel to field devices.
//!
//! Delivery is fire-and-forget: a successful send means the command left this
//! process, not that the device acted on it.

pub mod http;
pub mod log;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use uuid::Uuid;

use crate::config::{CommandMode, CommandsConfig};
use crate::domain::ConnectionId;

pub use http::HttpCommandChannel;
pub use log::LoggingCommandChannel;

/// Source tag stamped on commands issued by the restoration workflow
pub const FLISR_SOURCE: &str = "FLISR";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SwitchAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchCommand {
    pub id: Uuid,
    pub connection_id: ConnectionId,
    pub command: SwitchAction,
    pub source: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl SwitchCommand {
    pub fn new(connection_id: ConnectionId, command: SwitchAction, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id,
            command,
            source: FLISR_SOURCE.to_string(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn send_switch_command(&self, command: &SwitchCommand) -> Result<()>;
}

/// Build the channel selected by `[commands]` configuration
pub fn build_channel(cfg: &CommandsConfig) -> Result<Arc<dyn CommandChannel>> {
    match cfg.mode {
        CommandMode::Log => Ok(Arc::new(LoggingCommandChannel::new())),
        CommandMode::Http => {
            let url = cfg
                .gateway_url
                .clone()
                .context("commands.gateway_url is required when commands.mode = \"http\"")?;
            let channel = HttpCommandChannel::new(
                url,
                Duration::from_secs(cfg.http_timeout_seconds.max(1)),
            )?;
            Ok(Arc::new(channel))
        }
    }
}
