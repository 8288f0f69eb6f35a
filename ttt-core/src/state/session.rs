//! Per-role game state threaded through the session loops.
//!
//! Each loop iteration takes the current value and hands back the next
//! one; nothing here is shared or mutated behind the loop's back.

use crate::board::Board;
use crate::header::TttHeader;
use crate::state::initiator::InitiatorPhase;
use crate::status::{Outcome, SessionStatus};

// ── SessionState ─────────────────────────────────────────────────

/// What the initiator knows after its latest round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    board: Board,
    status: SessionStatus,
    phase: InitiatorPhase,
    /// Round number of the last request sent.
    round: u32,
    replies: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn outcome(&self) -> Outcome {
        self.status.outcome()
    }

    pub fn phase(&self) -> InitiatorPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Number of replies accepted so far.
    pub fn replies(&self) -> u64 {
        self.replies
    }

    /// Round number for the next request.
    pub fn next_round_number(&self) -> u32 {
        self.round.wrapping_add(1)
    }

    /// Same state, with a new phase.
    pub fn with_phase(self, phase: InitiatorPhase) -> Self {
        Self { phase, ..self }
    }

    /// Same state, with the round counter advanced to `round`.
    pub fn with_round(self, round: u32) -> Self {
        Self { round, ..self }
    }

    /// The state after accepting the peer's authoritative reply.
    pub fn with_reply(self, reply: &TttHeader) -> Self {
        Self {
            board: *reply.board(),
            status: reply.status(),
            replies: self.replies + 1,
            ..self
        }
    }
}

// ── ObserverState ────────────────────────────────────────────────

/// What the observer last rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserverState {
    board: Board,
    status: SessionStatus,
    /// Highest round seen so far, if frames are tagged.
    last_round: Option<u32>,
    polls: u64,
    empty_polls: u64,
}

impl ObserverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn outcome(&self) -> Outcome {
        self.status.outcome()
    }

    pub fn last_round(&self) -> Option<u32> {
        self.last_round
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn empty_polls(&self) -> u64 {
        self.empty_polls
    }

    /// The state after a poll that rendered `header`.
    pub fn with_observation(self, header: &TttHeader, round: Option<u32>) -> Self {
        Self {
            board: *header.board(),
            status: header.status(),
            last_round: round.or(self.last_round),
            polls: self.polls + 1,
            ..self
        }
    }

    /// The state after a poll that rendered nothing.
    pub fn with_empty_poll(self) -> Self {
        Self {
            polls: self.polls + 1,
            empty_polls: self.empty_polls + 1,
            ..self
        }
    }

    /// The state after a poll whose frames could not be decoded.
    pub fn with_failed_poll(self) -> Self {
        Self {
            polls: self.polls + 1,
            ..self
        }
    }
}
