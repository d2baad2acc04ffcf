// Session poll loop: Idle -> Polling -> Stopped, driven by external ticks.

use super::aggregator::{MergeOutcome, ReactionAggregator, ReactionRow};
use super::fetcher::RawReactionEvent;
use super::*;

/// Identifies the fetch started by one tick. Results are only merged while the
/// generation they were issued under is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub generation: u64,
    pub session_id: String,
    pub now_ms: i64,
}

/// Owns the reaction list for one session and serializes merges into it.
pub struct SessionPoller {
    phase: PollPhase,
    generation: u64,
    rows: Vec<ReactionRow>,
    aggregator: ReactionAggregator,
}

impl SessionPoller {
    pub fn new(aggregator: ReactionAggregator) -> Self {
        Self {
            phase: PollPhase::Idle,
            generation: 0,
            rows: Vec::new(),
            aggregator,
        }
    }

    pub fn phase(&self) -> &PollPhase {
        &self.phase
    }

    pub fn rows(&self) -> &[ReactionRow] {
        &self.rows
    }

    pub fn aggregator_mut(&mut self) -> &mut ReactionAggregator {
        &mut self.aggregator
    }

    /// Begins polling `session_id` with an empty list. Returns false if that
    /// session is already being polled (the list is kept).
    pub fn start(&mut self, session_id: String) -> bool {
        if matches!(&self.phase, PollPhase::Polling { session_id: current } if *current == session_id)
        {
            return false;
        }
        self.generation = self.generation.wrapping_add(1);
        self.rows.clear();
        self.phase = PollPhase::Polling { session_id };
        true
    }

    /// Issues a ticket for this tick, or `None` if not polling.
    pub fn begin_tick(&self, now_ms: i64) -> Option<PollTicket> {
        let PollPhase::Polling { session_id } = &self.phase else {
            return None;
        };
        Some(PollTicket {
            generation: self.generation,
            session_id: session_id.clone(),
            now_ms,
        })
    }

    /// Merges a fetched batch. `None` means the result was stale and dropped.
    pub fn complete(
        &mut self,
        ticket: &PollTicket,
        events: &[RawReactionEvent],
    ) -> Option<MergeOutcome> {
        if ticket.generation != self.generation || !matches!(self.phase, PollPhase::Polling { .. })
        {
            return None;
        }
        Some(self.aggregator.merge(&mut self.rows, events, ticket.now_ms))
    }

    /// Stops polling and discards the list. Outstanding tickets become stale.
    pub fn stop(&mut self) -> bool {
        if !matches!(self.phase, PollPhase::Polling { .. }) {
            return false;
        }
        self.generation = self.generation.wrapping_add(1);
        self.rows.clear();
        self.phase = PollPhase::Stopped;
        true
    }
}

impl AppCore {
    pub(super) fn start_polling(&mut self, session_id: String) {
        let session_id = session_id.trim().to_string();
        if session_id.is_empty() {
            tracing::warn!("poll: ignoring start with empty session id");
            return;
        }
        if !self.poller.start(session_id.clone()) {
            tracing::debug!(session_id = %session_id, "poll: already polling");
            return;
        }
        tracing::info!(session_id = %session_id, "poll: started");
        self.runtime_session.start();
        self.sync_poll_state();
        self.emit_state();
    }

    pub(super) fn stop_polling(&mut self) {
        if !self.poller.stop() {
            return;
        }
        tracing::info!("poll: stopped");
        self.runtime_session.stop();
        self.sync_poll_state();
        self.emit_state();
    }

    pub(super) fn handle_tick(&mut self, now_ms: i64) {
        let Some(ticket) = self.poller.begin_tick(now_ms) else {
            return;
        };
        if self.runtime_session.refresh(now_ms) {
            self.state.runtime_session_renewals = self.runtime_session.renewals();
            self.emit_state();
        }
        if !self.network_enabled() {
            // Nothing to fetch; settle the ticket with an empty batch.
            self.handle_reactions_fetched(ticket, vec![]);
            return;
        }
        let fetcher = self.reaction_fetcher();
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            let events = fetcher.fetch_batch(&ticket.session_id).await;
            let _ = tx.send(CoreMsg::Internal(Box::new(
                InternalEvent::ReactionsFetched { ticket, events },
            )));
        });
    }

    pub(super) fn handle_reactions_fetched(
        &mut self,
        ticket: PollTicket,
        events: Vec<RawReactionEvent>,
    ) {
        let Some(outcome) = self.poller.complete(&ticket, &events) else {
            tracing::debug!(
                generation = ticket.generation,
                session_id = %ticket.session_id,
                "poll: dropping stale result"
            );
            return;
        };
        if outcome.is_empty() {
            return;
        }
        if let Some(lag_ms) = max_submission_lag_ms(&events, ticket.now_ms) {
            tracing::debug!(
                session_id = %ticket.session_id,
                lag_ms,
                "poll: oldest submission in batch"
            );
        }
        tracing::info!(
            session_id = %ticket.session_id,
            events = events.len(),
            inserted = outcome.inserted_kinds.len(),
            merged = outcome.merged_kinds.len(),
            "poll: merged batch"
        );
        for kind in &outcome.inserted_kinds {
            self.haptics.play(*kind);
        }
        self.sync_poll_state();
        self.emit_state();
    }

    pub(super) fn sync_poll_state(&mut self) {
        let registry = self.registry.clone();
        self.state.poll = self.poller.phase().clone();
        self.state.reactions = self
            .poller
            .rows()
            .iter()
            .map(|row| ReactionRowView {
                kind: row.kind.label().to_string(),
                glyph: registry.glyph(row.kind).to_string(),
                quantity: row.quantity,
                quantity_label: quantity_label(row.quantity),
                last_updated_at_ms: row.last_updated_at_ms,
            })
            .collect();
    }
}

/// How long the oldest server-sent event in a batch waited before this tick saw it.
/// Synthetic events and unparseable timestamps are skipped.
fn max_submission_lag_ms(events: &[RawReactionEvent], now_ms: i64) -> Option<i64> {
    events
        .iter()
        .filter(|event| event.synthetic_kind.is_none())
        .filter_map(RawReactionEvent::submitted_at_ms)
        .map(|submitted_at| now_ms.saturating_sub(submitted_at))
        .max()
}
