use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{CommandChannel, SwitchCommand};

/// Channel that records and traces commands instead of talking to devices.
///
/// Used in simulation mode and as a test double.
#[derive(Debug, Default)]
pub struct LoggingCommandChannel {
    sent: Mutex<Vec<SwitchCommand>>,
}

impl LoggingCommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands dispatched so far, oldest first
    pub fn sent(&self) -> Vec<SwitchCommand> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl CommandChannel for LoggingCommandChannel {
    async fn send_switch_command(&self, command: &SwitchCommand) -> Result<()> {
        info!(
            command_id = %command.id,
            connection_id = command.connection_id,
            command = %command.command,
            source = %command.source,
            reason = %command.reason,
            "switch command dispatched"
        );
        self.sent.lock().push(command.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SwitchAction;

    #[tokio::test]
    async fn test_records_commands_in_order() {
        let channel = LoggingCommandChannel::new();
        channel
            .send_switch_command(&SwitchCommand::new(1, SwitchAction::Open, "isolate"))
            .await
            .unwrap();
        channel
            .send_switch_command(&SwitchCommand::new(2, SwitchAction::Close, "backfeed"))
            .await
            .unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].command, SwitchAction::Open);
        assert_eq!(sent[1].connection_id, 2);
    }
}
