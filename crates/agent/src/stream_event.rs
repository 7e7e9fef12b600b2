//! Events relayed out of a running task.
//!
//! The turn loop sends these over a channel so a frontend (the CLI, a test
//! harness) can show progress without knowing anything about the engine or
//! the device.

use serde::{Deserialize, Serialize};

/// One observable step of a task run, in occurrence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Streamed assistant prose.
    Text { text: String },

    /// Streamed reasoning (ephemeral).
    Reasoning { text: String },

    /// An action is about to run.
    ToolCall {
        name: String,
        arguments: serde_json::Value,
    },

    /// An action finished.
    ToolResult {
        name: String,
        success: bool,
        summary: String,
    },

    /// A fresh photo entered the log (seed capture or an action's result).
    PhotoCaptured { action: String },

    /// The log was pruned after a turn.
    Pruned { discarded: usize, retained: usize },

    /// The task finished.
    Done {
        final_text: Option<String>,
        turns: u32,
    },

    /// The task failed.
    Error { message: String },
}

impl TaskEvent {
    /// The event's tag, for terse logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Reasoning { .. } => "reasoning",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::PhotoCaptured { .. } => "photo_captured",
            Self::Pruned { .. } => "pruned",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_is_tagged() {
        let event = TaskEvent::ToolResult {
            name: "move_forward".into(),
            success: true,
            summary: "[image, 4096 chars]".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        assert!(json.contains("move_forward"));
        assert_eq!(event.event_type(), "tool_result");
    }

    #[test]
    fn done_event_roundtrip() {
        let event = TaskEvent::Done {
            final_text: Some("Reached the charger.".into()),
            turns: 7,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TaskEvent = serde_json::from_str(&json).unwrap();
        match back {
            TaskEvent::Done { final_text, turns } => {
                assert_eq!(final_text.as_deref(), Some("Reached the charger."));
                assert_eq!(turns, 7);
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }
}
