use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{CommandChannel, SwitchCommand};

/// Posts switch commands as JSON to a field gateway.
///
/// Any transport error or non-2xx status is a dispatch failure.
pub struct HttpCommandChannel {
    client: reqwest::Client,
    url: String,
}

impl HttpCommandChannel {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build command gateway client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CommandChannel for HttpCommandChannel {
    async fn send_switch_command(&self, command: &SwitchCommand) -> Result<()> {
        debug!(
            url = %self.url,
            connection_id = command.connection_id,
            command = %command.command,
            "posting switch command"
        );
        self.client
            .post(&self.url)
            .json(command)
            .send()
            .await
            .with_context(|| format!("Failed to reach command gateway at {}", self.url))?
            .error_for_status()
            .context("Command gateway rejected switch command")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SwitchAction;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_command_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/switch"))
            .and(body_partial_json(serde_json::json!({
                "connection_id": 7,
                "command": "OPEN",
                "source": "FLISR"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let channel =
            HttpCommandChannel::new(format!("{}/switch", server.uri()), Duration::from_secs(2))
                .unwrap();
        channel
            .send_switch_command(&SwitchCommand::new(7, SwitchAction::Open, "isolate"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_gateway_error_is_dispatch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let channel =
            HttpCommandChannel::new(format!("{}/switch", server.uri()), Duration::from_secs(2))
                .unwrap();
        let result = channel
            .send_switch_command(&SwitchCommand::new(7, SwitchAction::Close, "backfeed"))
            .await;
        assert!(result.is_err());
    }
}
