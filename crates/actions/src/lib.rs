//! Action catalog for roverctl.
//!
//! Each action is a thin, documented delegation to the device client.
//! Movement actions couple every motor command to fresh visual feedback:
//! command → settle delay → photo, so the reasoning engine never acts on
//! stale imagery.

pub mod batch;
pub mod movement;
pub mod photo;
pub mod status;
pub mod stop;

#[cfg(test)]
pub(crate) mod test_support;

use roverctl_config::DeviceConfig;
use roverctl_core::motion::{DEFAULT_MOVE_DURATION_MS, DEFAULT_TURN_DURATION_MS, MoveAction};
use roverctl_core::tool::ToolRegistry;
use roverctl_device::DeviceClient;
use std::sync::Arc;

pub use batch::ExecuteMovesTool;
pub use movement::MovementTool;
pub use photo::CapturePhotoTool;
pub use status::GetStatusTool;
pub use stop::StopTool;

/// Create the catalog registry for one robot.
pub fn registry(client: Arc<DeviceClient>, config: &DeviceConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for action in [MoveAction::Forward, MoveAction::Backward] {
        registry.register(Box::new(MovementTool::new(
            client.clone(),
            action,
            DEFAULT_MOVE_DURATION_MS,
            config.settle_ms,
        )));
    }
    for action in [MoveAction::Left, MoveAction::Right] {
        registry.register(Box::new(MovementTool::new(
            client.clone(),
            action,
            DEFAULT_TURN_DURATION_MS,
            config.settle_ms,
        )));
    }
    registry.register(Box::new(ExecuteMovesTool::new(
        client.clone(),
        config.inter_move_settle_ms,
        config.settle_ms,
    )));
    registry.register(Box::new(StopTool::new(client.clone())));
    registry.register(Box::new(GetStatusTool::new(client.clone())));
    registry.register(Box::new(CapturePhotoTool::new(client)));
    registry
}
