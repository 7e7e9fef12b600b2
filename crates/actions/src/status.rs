//! Device health check.

use async_trait::async_trait;
use roverctl_core::error::ToolError;
use roverctl_core::tool::{Tool, ToolOutcome};
use roverctl_device::DeviceClient;
use std::sync::Arc;

pub struct GetStatusTool {
    client: Arc<DeviceClient>,
}

impl GetStatusTool {
    pub fn new(client: Arc<DeviceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetStatusTool {
    fn name(&self) -> &str {
        "get_status"
    }

    fn description(&self) -> &str {
        "Get the robot's current status: camera health and WiFi connectivity."
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
        match self.client.status().await {
            Ok(status) => Ok(ToolOutcome::text(status.render())),
            Err(e) => Ok(ToolOutcome::failure(format!(
                "✗ Failed to get status: {e}"
            ))),
        }
    }
}
