//! Single-move actions: move_forward, move_backward, turn_left, turn_right.
//!
//! Pattern: issue motor command → settle delay → capture and return a photo.
//! Motor failures are soft (failure text the engine can adapt to); camera
//! failures escalate.

use async_trait::async_trait;
use roverctl_core::error::ToolError;
use roverctl_core::motion::{MAX_DURATION_MS, MIN_DURATION_MS, MoveAction};
use roverctl_core::tool::{Tool, ToolOutcome};
use roverctl_device::DeviceClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One directional movement action.
pub struct MovementTool {
    client: Arc<DeviceClient>,
    action: MoveAction,
    default_duration_ms: u64,
    settle_ms: u64,
}

impl MovementTool {
    pub fn new(
        client: Arc<DeviceClient>,
        action: MoveAction,
        default_duration_ms: u64,
        settle_ms: u64,
    ) -> Self {
        Self {
            client,
            action,
            default_duration_ms,
            settle_ms,
        }
    }

    fn verb(&self) -> &'static str {
        match self.action {
            MoveAction::Forward => "move forward",
            MoveAction::Backward => "move backward",
            MoveAction::Left => "turn left",
            MoveAction::Right => "turn right",
        }
    }
}

#[async_trait]
impl Tool for MovementTool {
    fn name(&self) -> &str {
        match self.action {
            MoveAction::Forward => "move_forward",
            MoveAction::Backward => "move_backward",
            MoveAction::Left => "turn_left",
            MoveAction::Right => "turn_right",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            MoveAction::Forward => {
                "Move the robot forward for a specified duration, then return a photo of what it sees."
            }
            MoveAction::Backward => {
                "Move the robot backward for a specified duration, then return a photo of what it sees."
            }
            MoveAction::Left => {
                "Turn the robot left for a specified duration (default 250ms, ~45-60 degrees), then return a photo."
            }
            MoveAction::Right => {
                "Turn the robot right for a specified duration (default 250ms, ~45-60 degrees), then return a photo."
            }
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "duration": {
                    "type": "integer",
                    "description": format!(
                        "Duration in milliseconds ({MIN_DURATION_MS}-{MAX_DURATION_MS}). Defaults to {}.",
                        self.default_duration_ms
                    ),
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        let duration_ms = arguments["duration"]
            .as_u64()
            .unwrap_or(self.default_duration_ms);

        info!(action = %self.action, duration_ms, "Executing movement");

        match self.client.motor(self.action, duration_ms).await {
            Ok(ack) => {
                info!(action = %self.action, %ack, "Movement acknowledged");
            }
            Err(e) => {
                // Soft failure: surfaced to the engine, which may retry
                return Ok(ToolOutcome::failure(format!(
                    "✗ Failed to {}: {e}",
                    self.verb()
                )));
            }
        }

        // Let motion and vibration stabilize before looking
        tokio::time::sleep(Duration::from_millis(self.settle_ms)).await;

        let photo = self
            .client
            .capture_photo()
            .await
            .map_err(|source| ToolError::Camera {
                action: self.name().to_string(),
                source,
            })?;

        Ok(ToolOutcome::image(photo.image_ref()))
    }
}
