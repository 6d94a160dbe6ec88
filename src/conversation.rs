// Conversation store: append-only transcript plus the in-flight request marker

use tracing::{info, warn};

use crate::models::Turn;

/// Handed out by [`Conversation::start_turn`]. A completion is applied only
/// when its ticket is still the latest one issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket(u64);

impl TurnTicket {
    pub const fn seq(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    loading: bool,
    last_issued: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a question and mark a request as outstanding.
    ///
    /// Returns `None` while another request is still awaiting its answer.
    pub fn start_turn(&mut self, text: impl Into<String>) -> Option<TurnTicket> {
        if self.loading {
            warn!("submit refused: a request is already in flight");
            return None;
        }

        self.last_issued += 1;
        self.turns.push(Turn::question(text));
        self.loading = true;
        info!(seq = self.last_issued, "question queued");
        Some(TurnTicket(self.last_issued))
    }

    /// Append the answer for `ticket`. Stale tickets are dropped.
    pub fn complete_turn(&mut self, ticket: TurnTicket, answer: impl Into<String>) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.turns.push(Turn::answer(answer));
        self.loading = false;
        true
    }

    /// Record that `ticket` produced no answer.
    pub fn fail_turn(&mut self, ticket: TurnTicket, error: &dyn std::fmt::Display) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        warn!(seq = ticket.seq(), %error, "request failed");
        self.turns.push(Turn::error(error.to_string()));
        self.loading = false;
        true
    }

    fn accepts(&self, ticket: TurnTicket) -> bool {
        if ticket.0 != self.last_issued || !self.loading {
            warn!(
                seq = ticket.seq(),
                latest = self.last_issued,
                "discarding stale completion"
            );
            return false;
        }
        true
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
