//! ReasoningEngine trait — the abstraction over the language-model backend.
//!
//! An engine knows how to take the current conversation log and produce one
//! turn of output: streamed reasoning fragments, streamed assistant text,
//! and zero or more requested tool calls. A turn terminates when the engine
//! either requests tools or completes with a final message.

use crate::error::EngineError;
use crate::item::LogItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An action spec sent to the engine so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The action name.
    pub name: String,

    /// Description of what the action does.
    pub description: String,

    /// JSON Schema describing the action's parameters.
    pub parameters: serde_json::Value,
}

/// One turn's worth of input for the engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// The model to use (e.g. "gpt-5").
    pub model: String,

    /// System-level instructions for the controller persona.
    pub instructions: String,

    /// The pruned conversation log, in insertion order.
    pub items: Vec<LogItem>,

    /// Actions the engine may request.
    pub tools: Vec<ToolSpec>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens to generate, if bounded.
    pub max_output_tokens: Option<u32>,
}

/// A complete tool invocation requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCall {
    /// Unique call ID assigned by the engine.
    pub id: String,

    /// The action name.
    pub name: String,

    /// Arguments as a JSON string (accumulated from streamed deltas).
    pub arguments: String,
}

/// Events streamed out of a single engine turn, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Partial assistant prose.
    TextDelta { text: String },

    /// Partial reasoning output (ephemeral, not user-facing).
    ReasoningDelta { text: String },

    /// The engine finished the turn by requesting these calls, in order.
    ToolCalls { calls: Vec<RequestedCall> },

    /// The engine finished the turn with a final message and no calls.
    Completed { final_text: Option<String> },
}

/// The core ReasoningEngine trait.
///
/// The turn loop calls [`run_turn`](ReasoningEngine::run_turn) without
/// knowing which backend is in use. The returned channel yields events in
/// arrival order; if the consumer is slow the channel buffers, it never
/// drops.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// A human-readable name for this engine (e.g. "openai", "azure").
    fn name(&self) -> &str;

    /// Run one turn, streaming events as they arrive.
    async fn run_turn(
        &self,
        request: EngineRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<EngineEvent, EngineError>>,
        EngineError,
    >;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_event_serialization() {
        let event = EngineEvent::ToolCalls {
            calls: vec![RequestedCall {
                id: "call_1".into(),
                name: "move_forward".into(),
                arguments: r#"{"duration":500}"#.into(),
            }],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_calls""#));
        assert!(json.contains("move_forward"));
    }

    #[test]
    fn tool_spec_serialization() {
        let spec = ToolSpec {
            name: "turn_left".into(),
            description: "Turn the robot left".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "duration": { "type": "integer" }
                }
            }),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("turn_left"));
        assert!(json.contains("duration"));
    }

    #[test]
    fn completed_event_roundtrip() {
        let event = EngineEvent::Completed {
            final_text: Some("Task finished.".into()),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        match back {
            EngineEvent::Completed { final_text } => {
                assert_eq!(final_text.as_deref(), Some("Task finished."))
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }
}
