//! Conversation log pruning.
//!
//! Photos dominate the log's token footprint, so the log is trimmed after
//! every turn: keep the seed item (task text + initial photo) plus the most
//! recent `retention_turns * items_per_turn` items, and drop everything in
//! between. The move history is never pruned; its recent tail is logged at
//! each prune so the path travelled stays reconstructable.

use roverctl_config::PruningConfig;
use roverctl_core::item::ConversationLog;
use roverctl_core::motion::MoveHistory;
use tracing::info;

/// How much of the log survives a prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruningPolicy {
    /// How many recent turns to keep.
    pub retention_turns: usize,

    /// Estimated log items per turn (tool call + result + prose).
    pub items_per_turn: usize,
}

impl PruningPolicy {
    pub fn from_config(config: &PruningConfig) -> Self {
        Self {
            retention_turns: config.retention_turns,
            items_per_turn: config.items_per_turn,
        }
    }

    /// The retention threshold: how many non-seed items to keep.
    pub fn threshold(&self) -> usize {
        self.retention_turns * self.items_per_turn
    }
}

impl Default for PruningPolicy {
    fn default() -> Self {
        Self::from_config(&PruningConfig::default())
    }
}

/// What a prune removed and left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    /// Interior items discarded.
    pub pruned: usize,

    /// Items remaining, seed included.
    pub retained: usize,
}

/// Prune `log` down to seed + the policy's threshold of recent items.
///
/// Returns `None` when the log is within budget and nothing was removed.
pub fn prune(
    log: &mut ConversationLog,
    history: &MoveHistory,
    policy: &PruningPolicy,
) -> Option<PruneReport> {
    let threshold = policy.threshold();
    if log.len() <= threshold {
        return None;
    }

    let pruned = log.retain_seed_and_tail(threshold);
    if pruned == 0 {
        return None;
    }

    info!(
        pruned,
        retained = log.len(),
        recent_moves = ?history.recent(10),
        "Pruned conversation log"
    );

    Some(PruneReport {
        pruned,
        retained: log.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roverctl_core::item::ConversationItem;
    use roverctl_core::motion::MoveAction;

    fn seeded_log(extra_items: usize) -> ConversationLog {
        let mut log = ConversationLog::new();
        log.push(ConversationItem::UserMessage {
            text: "find the charger".into(),
            image: None,
        });
        for n in 0..extra_items {
            log.push(ConversationItem::AssistantMessage {
                text: format!("turn {n}"),
            });
        }
        log
    }

    #[test]
    fn default_policy_threshold_is_twenty() {
        assert_eq!(PruningPolicy::default().threshold(), 20);
    }

    #[test]
    fn log_over_threshold_is_pruned_to_seed_plus_tail() {
        // 1 seed + 24 items, threshold 20 → drop 4 interior items
        let mut log = seeded_log(24);
        let history = MoveHistory::new();

        let report = prune(&mut log, &history, &PruningPolicy::default()).unwrap();
        assert_eq!(report.pruned, 4);
        assert_eq!(report.retained, 21);
        assert_eq!(log.len(), 21);

        match &log.seed().unwrap().item {
            ConversationItem::UserMessage { text, .. } => {
                assert_eq!(text, "find the charger")
            }
            other => panic!("Seed replaced: {other:?}"),
        }
    }

    #[test]
    fn log_at_threshold_is_left_alone() {
        let mut log = seeded_log(20);
        assert_eq!(log.len(), 21);
        let history = MoveHistory::new();

        assert!(prune(&mut log, &history, &PruningPolicy::default()).is_none());
        assert_eq!(log.len(), 21);
    }

    #[test]
    fn log_just_over_threshold_is_left_alone() {
        // len 21 > threshold 20, but pruned count would be 0
        let mut log = seeded_log(19);
        log.push(ConversationItem::AssistantMessage {
            text: "one more".into(),
        });
        assert_eq!(log.len(), 21);

        let history = MoveHistory::new();
        assert!(prune(&mut log, &history, &PruningPolicy::default()).is_none());
    }

    #[test]
    fn seed_survives_repeated_prune_cycles() {
        let mut log = seeded_log(0);
        let history = {
            let mut h = MoveHistory::new();
            h.record(MoveAction::Forward);
            h
        };
        let policy = PruningPolicy {
            retention_turns: 1,
            items_per_turn: 2,
        };

        let seed_before = log.seed().unwrap().clone();
        for round in 0..5 {
            for n in 0..4 {
                log.push(ConversationItem::AssistantMessage {
                    text: format!("round {round} item {n}"),
                });
            }
            prune(&mut log, &history, &policy);
        }

        assert_eq!(log.seed().unwrap(), &seed_before);
        assert!(log.len() <= policy.threshold() + 1);
    }
}
