//! Batched movement: execute a sequence of moves with one final photo.
//!
//! Best-effort, not transactional: unknown action names are skipped with a
//! warning, and a per-move device failure is recorded but does not halt the
//! remaining moves. Exactly one photo is captured, after the final move.

use async_trait::async_trait;
use roverctl_core::error::ToolError;
use roverctl_core::motion::{MAX_DURATION_MS, MIN_DURATION_MS, Move, MoveAction};
use roverctl_core::tool::{Tool, ToolOutcome};
use roverctl_device::DeviceClient;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The `execute_moves` batch action.
pub struct ExecuteMovesTool {
    client: Arc<DeviceClient>,
    inter_move_settle_ms: u64,
    settle_ms: u64,
}

impl ExecuteMovesTool {
    pub fn new(client: Arc<DeviceClient>, inter_move_settle_ms: u64, settle_ms: u64) -> Self {
        Self {
            client,
            inter_move_settle_ms,
            settle_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMove {
    action: String,
    #[serde(default)]
    duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    moves: Vec<RawMove>,
}

#[async_trait]
impl Tool for ExecuteMovesTool {
    fn name(&self) -> &str {
        "execute_moves"
    }

    fn description(&self) -> &str {
        "Execute a sequence of moves in order (forward, backward, left, right), \
         then return a single photo taken after the final move. Use this instead \
         of individual move calls when you already know the whole maneuver."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "moves": {
                    "type": "array",
                    "description": "Moves to execute, in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "action": {
                                "type": "string",
                                "enum": ["forward", "backward", "left", "right"],
                            },
                            "duration": {
                                "type": "integer",
                                "description": format!(
                                    "Duration in milliseconds ({MIN_DURATION_MS}-{MAX_DURATION_MS})"
                                ),
                            }
                        },
                        "required": ["action"]
                    }
                }
            },
            "required": ["moves"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        let args: BatchArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        // Resolve names up front; unknown actions are skipped, not fatal
        let mut moves = Vec::new();
        for raw in &args.moves {
            match raw.action.parse::<MoveAction>() {
                Ok(action) => moves.push(Move::new(
                    action,
                    raw.duration.unwrap_or(roverctl_core::motion::DEFAULT_MOVE_DURATION_MS),
                )),
                Err(_) => {
                    warn!(action = %raw.action, "Skipping unknown move action in batch");
                }
            }
        }

        info!(
            requested = args.moves.len(),
            executing = moves.len(),
            "Executing move batch"
        );

        let last = moves.len().saturating_sub(1);
        for (i, mv) in moves.iter().enumerate() {
            if let Err(e) = self.client.motor(mv.action, mv.duration_ms).await {
                // Best-effort: record and keep going
                warn!(action = %mv.action, error = %e, "Move failed inside batch");
            }
            if i < last {
                tokio::time::sleep(Duration::from_millis(self.inter_move_settle_ms)).await;
            }
        }

        // Longer settle before the single final capture
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{jpeg_bytes, ok_json, test_client, RecordingTransport, TransportError};
    use roverctl_core::item::ToolPayload;

    fn batch_args() -> serde_json::Value {
        serde_json::json!({
            "moves": [
                { "action": "forward", "duration": 500 },
                { "action": "right", "duration": 250 },
                { "action": "bogus", "duration": 100 },
            ]
        })
    }

    #[tokio::test]
    async fn executes_known_moves_in_order_with_one_capture() {
        let transport = RecordingTransport::new(vec![
            ok_json(b"{}"),
            ok_json(b"{}"),
            ok_json(&jpeg_bytes()),
        ]);
        let (client, _dir) = test_client(transport.clone());
        let tool = ExecuteMovesTool::new(client, 0, 0);

        let outcome = tool.execute(batch_args()).await.unwrap();
        assert!(matches!(outcome.payload, ToolPayload::Image { .. }));

        let requests = transport.requests();
        assert_eq!(requests.len(), 3, "two moves plus exactly one capture");
        assert!(requests[0].ends_with("motor/forward?duration=500"));
        assert!(requests[1].ends_with("motor/right?duration=250"));
        assert!(requests[2].ends_with("camera/photo"));
    }

    #[tokio::test]
    async fn per_move_failure_does_not_halt_the_batch() {
        let transport = RecordingTransport::new(vec![
            Err(TransportError::Failed("robot busy".into())),
            ok_json(b"{}"),
            ok_json(&jpeg_bytes()),
        ]);
        let (client, _dir) = test_client(transport.clone());
        let tool = ExecuteMovesTool::new(client, 0, 0);

        let outcome = tool
            .execute(serde_json::json!({
                "moves": [
                    { "action": "forward", "duration": 500 },
                    { "action": "left", "duration": 250 },
                ]
            }))
            .await
            .unwrap();

        assert!(outcome.success);
        let requests = transport.requests();
        assert!(requests[1].ends_with("motor/left?duration=250"));
        assert!(requests[2].ends_with("camera/photo"));
    }

    #[tokio::test]
    async fn missing_duration_uses_default() {
        let transport = RecordingTransport::new(vec![ok_json(b"{}"), ok_json(&jpeg_bytes())]);
        let (client, _dir) = test_client(transport.clone());
        let tool = ExecuteMovesTool::new(client, 0, 0);

        tool.execute(serde_json::json!({ "moves": [{ "action": "backward" }] }))
            .await
            .unwrap();
        assert!(transport.requests()[0].ends_with("motor/backward?duration=500"));
    }

    #[tokio::test]
    async fn empty_batch_still_captures_once() {
        let transport = RecordingTransport::new(vec![ok_json(&jpeg_bytes())]);
        let (client, _dir) = test_client(transport.clone());
        let tool = ExecuteMovesTool::new(client, 0, 0);

        let outcome = tool
            .execute(serde_json::json!({ "moves": [] }))
            .await
            .unwrap();
        assert!(matches!(outcome.payload, ToolPayload::Image { .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn malformed_arguments_rejected() {
        let transport = RecordingTransport::new(vec![]);
        let (client, _dir) = test_client(transport);
        let tool = ExecuteMovesTool::new(client, 0, 0);

        let err = tool
            .execute(serde_json::json!({ "moves": "forward" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn final_capture_failure_escalates() {
        let transport =
            RecordingTransport::new(vec![ok_json(b"{}"), Err(TransportError::Timeout)]);
        let (client, _dir) = test_client(transport);
        let tool = ExecuteMovesTool::new(client, 0, 0);

        let err = tool
            .execute(serde_json::json!({ "moves": [{ "action": "forward", "duration": 200 }] }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Camera { .. }));
    }
}
