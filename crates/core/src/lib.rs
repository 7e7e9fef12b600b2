//! # roverctl Core
//!
//! Domain types, traits, and error definitions for the roverctl robot
//! teleoperation agent. This crate defines the domain model that all other
//! crates implement against; it knows nothing about HTTP, the device wire
//! format, or any concrete engine backend.
//!
//! ## Design Philosophy
//!
//! Every subsystem boundary is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod engine;
pub mod error;
pub mod item;
pub mod motion;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use engine::{EngineEvent, EngineRequest, ReasoningEngine, RequestedCall, ToolSpec};
pub use error::{DeviceError, EngineError, Error, Result, ToolError};
pub use item::{ConversationItem, ConversationLog, ImageRef, LogItem, ToolPayload};
pub use motion::{Move, MoveAction, MoveHistory};
pub use tool::{Tool, ToolCall, ToolOutcome, ToolRegistry};
