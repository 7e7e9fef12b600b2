//! Tool trait — the abstraction over robot actions.
//!
//! Tools are what give the agent the ability to act in the world: drive the
//! motors, capture a photo, check device status. Each action in the catalog
//! implements this trait and is registered in the [`ToolRegistry`].

use crate::engine::ToolSpec;
use crate::error::ToolError;
use crate::item::ToolPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request to execute an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the engine's tool_call id).
    pub id: String,

    /// Name of the action to execute.
    pub name: String,

    /// Arguments as a JSON value.
    pub arguments: serde_json::Value,
}

/// The result of an action execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the action executed successfully. Soft device failures set
    /// this to `false` while still carrying a failure-text payload the
    /// reasoning engine can act on.
    pub success: bool,

    /// The output payload: text or image.
    pub payload: ToolPayload,
}

impl ToolOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: ToolPayload::text(text),
        }
    }

    pub fn image(image: crate::item::ImageRef) -> Self {
        Self {
            success: true,
            payload: ToolPayload::image(image),
        }
    }

    /// A soft failure: surfaced to the engine as failure text, never raised.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: ToolPayload::text(text),
        }
    }
}

/// The core Tool trait.
///
/// Each catalog action (move_forward, turn_left, execute_moves, ...)
/// implements this trait. Tools are registered in the ToolRegistry and made
/// available to the turn loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this action (e.g., "move_forward").
    fn name(&self) -> &str;

    /// A description of what this action does (sent to the engine).
    fn description(&self) -> &str;

    /// JSON Schema describing this action's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the action with the given arguments.
    async fn execute(&self, arguments: serde_json::Value)
        -> std::result::Result<ToolOutcome, ToolError>;

    /// Convert this action into a ToolSpec for sending to the engine.
    fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available actions.
///
/// The turn loop uses this to:
/// 1. Get action specs to send to the engine
/// 2. Look up and execute actions when the engine requests them
///
/// Iteration order is name-sorted so the spec list sent to the engine is
/// stable across runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register an action. Replaces any existing action with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get an action by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all action specs (for sending to the engine).
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.to_spec()).collect()
    }

    /// Execute an action call.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone()).await
    }

    /// List all registered action names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}
