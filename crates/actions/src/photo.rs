//! Standalone photo capture, without moving.

use async_trait::async_trait;
use roverctl_core::error::ToolError;
use roverctl_core::tool::{Tool, ToolOutcome};
use roverctl_device::DeviceClient;
use std::sync::Arc;
use tracing::info;

pub struct CapturePhotoTool {
    client: Arc<DeviceClient>,
}

impl CapturePhotoTool {
    pub fn new(client: Arc<DeviceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CapturePhotoTool {
    fn name(&self) -> &str {
        "capture_photo"
    }

    fn description(&self) -> &str {
        "Capture a photo from the robot's camera without moving. \
         Use this to re-inspect the current scene."
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
        let photo = self
            .client
            .capture_photo()
            .await
            .map_err(|source| ToolError::Camera {
                action: self.name().to_string(),
                source,
            })?;

        info!(path = %photo.archived_path.display(), "Photo captured");

        Ok(ToolOutcome::image(photo.image_ref()))
    }
}
