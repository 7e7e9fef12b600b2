//! Conversation items and the conversation log.
//!
//! These are the core value objects that flow through the entire system:
//! the caller seeds a task → the reasoning engine requests actions → the
//! device answers with text or photos → everything lands, in order, in the
//! [`ConversationLog`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An inline base64-encoded JPEG, as consumed by the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// `data:image/jpeg;base64,...` data URL.
    pub data_url: String,
}

impl ImageRef {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }
}

/// The payload of a tool result: either plain text or an image.
///
/// An explicit sum type — every consumer must handle both variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolPayload {
    Text { text: String },
    Image { image: ImageRef },
}

impl ToolPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(image: ImageRef) -> Self {
        Self::Image { image }
    }

    /// A short human-readable rendering for relays and logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Image { image } => format!("[image, {} chars]", image.data_url.len()),
        }
    }
}

/// One interaction item in the conversation between the agent and the robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    /// A message from the caller. The seed item carries the task text plus
    /// the initial photo.
    UserMessage {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<ImageRef>,
    },

    /// The engine requested an action.
    ToolCall {
        id: String,
        action: String,
        arguments: serde_json::Value,
    },

    /// The paired result for a [`ConversationItem::ToolCall`].
    ToolResult {
        call_id: String,
        payload: ToolPayload,
    },

    /// Final or intermediate assistant prose.
    AssistantMessage { text: String },

    /// Streamed reasoning. Ephemeral: retained in the log for pruning
    /// bookkeeping but never sent back to the engine or shown as output.
    ReasoningFragment { text: String },
}

impl ConversationItem {
    /// The action name, if this item is a tool call.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            Self::ToolCall { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// A conversation item plus its identity and insertion timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogItem {
    /// Unique item ID.
    pub id: String,

    /// The item itself.
    pub item: ConversationItem,

    /// When the item was appended.
    pub timestamp: DateTime<Utc>,
}

impl LogItem {
    pub fn new(item: ConversationItem) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item,
            timestamp: Utc::now(),
        }
    }
}

/// The append-only, ordered record of one task execution.
///
/// Invariants:
/// - insertion order is preserved;
/// - every `ToolCall` is followed by exactly one `ToolResult` with a
///   matching `call_id` before the next `ToolCall` is appended;
/// - the first item (initial photo + task) survives pruning verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    items: Vec<LogItem>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an item to the log.
    pub fn push(&mut self, item: ConversationItem) {
        self.items.push(LogItem::new(item));
    }

    /// The seed item (initial photo + task), if the log has been seeded.
    pub fn seed(&self) -> Option<&LogItem> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[LogItem] {
        &self.items
    }

    /// Replace the log with `[seed] + last `keep` items`, returning how many
    /// interior items were discarded. Used only by the pruning policy.
    ///
    /// No-op (returns 0) unless the log is strictly longer than `keep + 1`.
    pub fn retain_seed_and_tail(&mut self, keep: usize) -> usize {
        if self.items.len() <= keep + 1 {
            return 0;
        }
        let discarded = self.items.len() - keep - 1;
        let tail_start = self.items.len() - keep;
        let mut retained = Vec::with_capacity(keep + 1);
        retained.push(self.items[0].clone());
        retained.extend_from_slice(&self.items[tail_start..]);
        self.items = retained;
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(n: usize) -> ConversationItem {
        ConversationItem::AssistantMessage {
            text: format!("item {n}"),
        }
    }

    #[test]
    fn log_preserves_insertion_order() {
        let mut log = ConversationLog::new();
        for n in 0..5 {
            log.push(text_item(n));
        }
        let texts: Vec<_> = log
            .items()
            .iter()
            .map(|li| match &li.item {
                ConversationItem::AssistantMessage { text } => text.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(texts, vec!["item 0", "item 1", "item 2", "item 3", "item 4"]);
    }

    #[test]
    fn retain_seed_and_tail_keeps_first_item() {
        let mut log = ConversationLog::new();
        log.push(ConversationItem::UserMessage {
            text: "seed task".into(),
            image: None,
        });
        for n in 0..24 {
            log.push(text_item(n));
        }
        assert_eq!(log.len(), 25);

        let discarded = log.retain_seed_and_tail(20);
        assert_eq!(discarded, 4);
        assert_eq!(log.len(), 21);
        match &log.seed().unwrap().item {
            ConversationItem::UserMessage { text, .. } => assert_eq!(text, "seed task"),
            other => panic!("Seed item replaced: {other:?}"),
        }
        // Tail is the most recent 20 items
        match &log.items().last().unwrap().item {
            ConversationItem::AssistantMessage { text } => assert_eq!(text, "item 23"),
            other => panic!("Unexpected tail: {other:?}"),
        }
    }

    #[test]
    fn retain_seed_and_tail_noop_when_short() {
        let mut log = ConversationLog::new();
        for n in 0..10 {
            log.push(text_item(n));
        }
        assert_eq!(log.retain_seed_and_tail(20), 0);
        assert_eq!(log.len(), 10);
    }

    #[test]
    fn tool_payload_is_explicit_sum_type() {
        let text = ToolPayload::text("✓ Moved forward");
        let image = ToolPayload::image(ImageRef::new("data:image/jpeg;base64,AAAA"));
        match text {
            ToolPayload::Text { ref text } => assert!(text.contains("forward")),
            ToolPayload::Image { .. } => panic!("wrong variant"),
        }
        assert!(image.summary().starts_with("[image"));
    }

    #[test]
    fn item_serialization_roundtrip() {
        let item = ConversationItem::ToolResult {
            call_id: "call_1".into(),
            payload: ToolPayload::text("done"),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        let back: ConversationItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
