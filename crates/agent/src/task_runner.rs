//! The turn loop implementation.

use crate::pruning::{prune, PruningPolicy};
use crate::stream_event::TaskEvent;
use roverctl_core::engine::{EngineEvent, EngineRequest, ReasoningEngine, RequestedCall};
use roverctl_core::error::{Error, Result};
use roverctl_core::item::{ConversationItem, ConversationLog, ImageRef, ToolPayload};
use roverctl_core::motion::{MoveAction, MoveHistory};
use roverctl_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The controller persona sent as system instructions on every turn.
pub const CONTROLLER_INSTRUCTIONS: &str = "\
You are driving a small two-wheeled robot with a forward-facing camera. \
You see through photos returned after every action: study each one before \
deciding the next move.

Guidelines:
- Move in small increments. Forward/backward default to 500ms; turns \
default to 250ms (roughly 45-60 degrees).
- If a photo is blurry or too dark, capture another one before moving.
- If the robot seems stuck (the view does not change after a move), back \
up and try a different direction.
- Use execute_moves when you already know a whole maneuver; use single \
moves when you need to look between steps.
- When the task is complete, stop calling actions and describe the result.";

/// Drives one task from seed photo to completion.
///
/// The runner owns nothing device-specific: it talks to the robot only
/// through the action registry and to the model only through the
/// [`ReasoningEngine`] trait.
pub struct TaskRunner {
    /// The reasoning engine backend
    engine: Arc<dyn ReasoningEngine>,

    /// Action registry
    tools: Arc<ToolRegistry>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per engine response
    max_output_tokens: Option<u32>,

    /// System instructions for the controller persona
    instructions: String,

    /// Log pruning policy
    policy: PruningPolicy,

    /// Maximum engine turns per task
    max_turns: u32,
}

impl TaskRunner {
    /// Create a new runner.
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            engine,
            tools,
            model: model.into(),
            temperature,
            max_output_tokens: None,
            instructions: CONTROLLER_INSTRUCTIONS.into(),
            policy: PruningPolicy::default(),
            max_turns: 100,
        }
    }

    /// Set the maximum number of engine turns per task.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    /// Set the max tokens per engine response.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Override the controller instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set the pruning policy.
    pub fn with_pruning(mut self, policy: PruningPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Capture the seed photo. Failure here aborts the task: without an
    /// initial view there is nothing for the engine to reason about.
    async fn seed_photo(&self) -> Result<Option<ImageRef>> {
        let call = ToolCall {
            id: "seed".into(),
            name: "capture_photo".into(),
            arguments: serde_json::json!({}),
        };
        let outcome = self.tools.execute(&call).await?;
        match outcome.payload {
            ToolPayload::Image { image } => Ok(Some(image)),
            ToolPayload::Text { text } => Err(Error::Internal(format!(
                "seed capture returned text instead of a photo: {text}"
            ))),
        }
    }

    /// Run one task to completion.
    ///
    /// This is the main entry point. It:
    /// 1. Seeds the log with the task text and an initial photo
    /// 2. Asks the engine for a turn, relaying streamed output
    /// 3. Executes any requested actions and appends the paired results
    /// 4. Prunes the log, then loops until the engine completes
    ///
    /// Returns the engine's final message, or `None` if the turn budget
    /// ran out first.
    pub async fn run(&self, task: &str, relay: mpsc::Sender<TaskEvent>) -> Result<Option<String>> {
        info!(task, max_turns = self.max_turns, "Starting task");

        let seed_image = self.seed_photo().await?;
        let _ = relay
            .send(TaskEvent::PhotoCaptured {
                action: "seed".into(),
            })
            .await;

        let mut log = ConversationLog::new();
        log.push(ConversationItem::UserMessage {
            text: task.to_string(),
            image: seed_image,
        });

        let mut history = MoveHistory::new();
        let specs = self.tools.specs();

        for turn in 1..=self.max_turns {
            debug!(turn, log_items = log.len(), "Engine turn");

            let request = EngineRequest {
                model: self.model.clone(),
                instructions: self.instructions.clone(),
                items: log.items().to_vec(),
                tools: specs.clone(),
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            };

            let mut rx = self.engine.run_turn(request).await?;

            let mut turn_text = String::new();
            let mut turn_reasoning = String::new();
            let mut requested: Option<Vec<RequestedCall>> = None;
            let mut completed: Option<Option<String>> = None;

            while let Some(event) = rx.recv().await {
                match event {
                    Ok(EngineEvent::TextDelta { text }) => {
                        turn_text.push_str(&text);
                        let _ = relay.send(TaskEvent::Text { text }).await;
                    }
                    Ok(EngineEvent::ReasoningDelta { text }) => {
                        turn_reasoning.push_str(&text);
                        let _ = relay.send(TaskEvent::Reasoning { text }).await;
                    }
                    Ok(EngineEvent::ToolCalls { calls }) => {
                        requested = Some(calls);
                    }
                    Ok(EngineEvent::Completed { final_text }) => {
                        completed = Some(final_text);
                    }
                    Err(e) => {
                        let _ = relay
                            .send(TaskEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                        return Err(e.into());
                    }
                }
            }

            if !turn_reasoning.is_empty() {
                log.push(ConversationItem::ReasoningFragment {
                    text: turn_reasoning,
                });
            }
            if !turn_text.is_empty() {
                log.push(ConversationItem::AssistantMessage {
                    text: turn_text.clone(),
                });
            }

            if let Some(calls) = requested {
                self.execute_calls(calls, &mut log, &mut history, &relay)
                    .await;

                if let Some(report) = prune(&mut log, &history, &self.policy) {
                    let _ = relay
                        .send(TaskEvent::Pruned {
                            discarded: report.pruned,
                            retained: report.retained,
                        })
                        .await;
                }
                continue;
            }

            // No calls: the turn is final
            let final_text = completed
                .flatten()
                .or_else(|| (!turn_text.is_empty()).then(|| turn_text.clone()));
            info!(turn, "Task completed");
            let _ = relay
                .send(TaskEvent::Done {
                    final_text: final_text.clone(),
                    turns: turn,
                })
                .await;
            return Ok(final_text);
        }

        warn!(max_turns = self.max_turns, "Turn budget exhausted");
        let _ = relay
            .send(TaskEvent::Done {
                final_text: None,
                turns: self.max_turns,
            })
            .await;
        Ok(None)
    }

    /// Execute requested calls in order, appending each call and its paired
    /// result before moving to the next.
    async fn execute_calls(
        &self,
        calls: Vec<RequestedCall>,
        log: &mut ConversationLog,
        history: &mut MoveHistory,
        relay: &mpsc::Sender<TaskEvent>,
    ) {
        for requested in calls {
            let arguments: serde_json::Value = match serde_json::from_str(&requested.arguments) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        action = %requested.name,
                        error = %e,
                        "Engine sent unparseable arguments, using empty object"
                    );
                    serde_json::json!({})
                }
            };

            log.push(ConversationItem::ToolCall {
                id: requested.id.clone(),
                action: requested.name.clone(),
                arguments: arguments.clone(),
            });
            let _ = relay
                .send(TaskEvent::ToolCall {
                    name: requested.name.clone(),
                    arguments: arguments.clone(),
                })
                .await;

            if let Some(action) = MoveAction::from_tool_name(&requested.name) {
                history.record(action);
            }

            let call = ToolCall {
                id: requested.id.clone(),
                name: requested.name.clone(),
                arguments,
            };

            match self.tools.execute(&call).await {
                Ok(outcome) => {
                    let _ = relay
                        .send(TaskEvent::ToolResult {
                            name: requested.name.clone(),
                            success: outcome.success,
                            summary: outcome.payload.summary(),
                        })
                        .await;
                    if matches!(outcome.payload, ToolPayload::Image { .. }) {
                        let _ = relay
                            .send(TaskEvent::PhotoCaptured {
                                action: requested.name.clone(),
                            })
                            .await;
                    }
                    log.push(ConversationItem::ToolResult {
                        call_id: requested.id,
                        payload: outcome.payload,
                    });
                }
                Err(e) => {
                    // Surfaced to the engine as result text so it can adapt
                    warn!(action = %requested.name, error = %e, "Action failed");
                    let message = format!("Error: {e}");
                    let _ = relay
                        .send(TaskEvent::ToolResult {
                            name: requested.name.clone(),
                            success: false,
                            summary: message.clone(),
                        })
                        .await;
                    log.push(ConversationItem::ToolResult {
                        call_id: requested.id,
                        payload: ToolPayload::text(message),
                    });
                }
            }
        }
    }
}
