//! Movement domain types.
//!
//! The robot exposes four directional motor endpoints plus stop. Durations
//! are documented by the device firmware as 50–5000 ms; out-of-range values
//! are passed through uncorrected (endpoint contract, not enforced here).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Documented minimum motor duration in milliseconds.
pub const MIN_DURATION_MS: u64 = 50;
/// Documented maximum motor duration in milliseconds.
pub const MAX_DURATION_MS: u64 = 5000;
/// Default duration for forward/backward moves.
pub const DEFAULT_MOVE_DURATION_MS: u64 = 500;
/// Default duration for turns (~45-60 degrees on most surfaces).
pub const DEFAULT_TURN_DURATION_MS: u64 = 250;

/// A directional motor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveAction {
    Forward,
    Backward,
    Left,
    Right,
}

impl MoveAction {
    /// The motor endpoint path segment for this action.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Map a catalog tool name to a movement action, if it is one.
    /// Used by the turn loop to feed the move history.
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "move_forward" => Some(Self::Forward),
            "move_backward" => Some(Self::Backward),
            "turn_left" => Some(Self::Left),
            "turn_right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for MoveAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown move action '{other}'")),
        }
    }
}

/// One entry of a movement batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub action: MoveAction,
    pub duration_ms: u64,
}

impl Move {
    pub fn new(action: MoveAction, duration_ms: u64) -> Self {
        Self {
            action,
            duration_ms,
        }
    }

    /// Whether the duration lies in the documented device range.
    pub fn in_documented_range(&self) -> bool {
        (MIN_DURATION_MS..=MAX_DURATION_MS).contains(&self.duration_ms)
    }
}

/// Append-only record of executed movement action names.
///
/// Retained in full for the lifetime of a task, regardless of conversation
/// log pruning; pruning summaries display only the most recent entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveHistory {
    moves: Vec<String>,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: MoveAction) {
        self.moves.push(action.endpoint().to_string());
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The most recent `n` movement names, oldest first.
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.moves.len().saturating_sub(n);
        &self.moves[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_endpoint_mapping() {
        assert_eq!(MoveAction::Forward.endpoint(), "forward");
        assert_eq!(MoveAction::Right.endpoint(), "right");
        assert_eq!("backward".parse::<MoveAction>().unwrap(), MoveAction::Backward);
        assert!("sideways".parse::<MoveAction>().is_err());
    }

    #[test]
    fn tool_name_mapping() {
        assert_eq!(
            MoveAction::from_tool_name("turn_left"),
            Some(MoveAction::Left)
        );
        assert_eq!(MoveAction::from_tool_name("get_status"), None);
        assert_eq!(MoveAction::from_tool_name("stop"), None);
    }

    #[test]
    fn documented_range() {
        assert!(Move::new(MoveAction::Forward, 50).in_documented_range());
        assert!(Move::new(MoveAction::Forward, 5000).in_documented_range());
        assert!(!Move::new(MoveAction::Forward, 49).in_documented_range());
        assert!(!Move::new(MoveAction::Forward, 9000).in_documented_range());
    }

    #[test]
    fn history_recent_window() {
        let mut history = MoveHistory::new();
        for _ in 0..7 {
            history.record(MoveAction::Forward);
        }
        history.record(MoveAction::Left);
        for _ in 0..4 {
            history.record(MoveAction::Right);
        }
        assert_eq!(history.len(), 12);

        let recent = history.recent(10);
        assert_eq!(recent.len(), 10);
        // Oldest two entries fell out of the window
        assert_eq!(recent[0], "forward");
        assert_eq!(recent[5], "left");
        assert_eq!(recent[9], "right");

        // Window larger than history returns everything
        assert_eq!(history.recent(100).len(), 12);
    }
}
