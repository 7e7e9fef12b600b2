//! Emergency stop.

use async_trait::async_trait;
use roverctl_core::error::ToolError;
use roverctl_core::tool::{Tool, ToolOutcome};
use roverctl_device::DeviceClient;
use std::sync::Arc;
use tracing::info;

pub struct StopTool {
    client: Arc<DeviceClient>,
}

impl StopTool {
    pub fn new(client: Arc<DeviceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for StopTool {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> &str {
        "Immediately stop all robot motors."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        _arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        match self.client.stop().await {
            Ok(ack) => {
                info!(%ack, "Motors stopped");
                Ok(ToolOutcome::text(format!(
                    "✓ Motors stopped. Response: {ack}"
                )))
            }
            Err(e) => Ok(ToolOutcome::failure(format!(
                "✗ Failed to stop motors: {e}"
            ))),
        }
    }
}
