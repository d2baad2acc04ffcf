// Reaction pooling: folds one fetched batch into the displayed reaction list.

use std::sync::Arc;

use xcel_reaction_profiles::{ReactionKind, ReactionRegistry};

use super::fetcher::RawReactionEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionRow {
    pub kind: ReactionKind,
    /// Never decreases for the lifetime of the row.
    pub quantity: u32,
    /// Set once at insertion. Merges do not move it, so a row's pooling window
    /// is anchored at the time it was first shown.
    pub last_updated_at_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Kinds that got a fresh row, in insertion order. Only these buzz.
    pub inserted_kinds: Vec<ReactionKind>,
    pub merged_kinds: Vec<ReactionKind>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.inserted_kinds.is_empty() && self.merged_kinds.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ReactionAggregator {
    registry: Arc<ReactionRegistry>,
    window_ms: u64,
}

impl ReactionAggregator {
    pub fn new(registry: Arc<ReactionRegistry>, window_ms: u64) -> Self {
        Self {
            registry,
            window_ms,
        }
    }

    pub fn set_window_ms(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
    }

    /// Folds `events` into `rows` (newest first). The whole batch is observed at `now_ms`.
    pub fn merge(
        &self,
        rows: &mut Vec<ReactionRow>,
        events: &[RawReactionEvent],
        now_ms: i64,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (kind, count) in self.group_by_kind(events) {
            let open_row = rows.iter_mut().find(|row| {
                row.kind == kind && now_ms.abs_diff(row.last_updated_at_ms) <= self.window_ms
            });
            match open_row {
                Some(row) => {
                    row.quantity = row.quantity.saturating_add(count);
                    outcome.merged_kinds.push(kind);
                }
                None => {
                    rows.insert(
                        0,
                        ReactionRow {
                            kind,
                            quantity: count,
                            last_updated_at_ms: now_ms,
                        },
                    );
                    outcome.inserted_kinds.push(kind);
                }
            }
        }
        outcome
    }

    /// Counts per mapped kind, in order of first appearance within the batch.
    fn group_by_kind(&self, events: &[RawReactionEvent]) -> Vec<(ReactionKind, u32)> {
        let mut groups: Vec<(ReactionKind, u32)> = Vec::new();
        for event in events {
            let kind = event
                .synthetic_kind
                .unwrap_or_else(|| self.registry.kind_for_code(event.kind_code));
            match groups.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, count)) => *count = count.saturating_add(1),
                None => groups.push((kind, 1)),
            }
        }
        groups
    }
}
