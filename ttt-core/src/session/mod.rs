//! Session loops and the collaborators they talk to.
//!
//! - [`Initiator`]: one move in, one authoritative reply out.
//! - [`Observer`]: best-effort monitor of frames headed to the peer.
//!
//! Input comes from a [`MoveSource`]; everything worth showing the
//! operator goes to a [`Reporter`]. Neither loop prints anything itself.

pub mod initiator;
pub mod observer;

use async_trait::async_trait;

use crate::board::Board;
use crate::error::TttError;
use crate::header::TttHeader;
use crate::status::{Outcome, SessionStatus};

pub use initiator::{Initiator, InitiatorConfig, QUIT};
pub use observer::{Observation, Observer, ObserverConfig, select_newest};

// ── MoveSource ───────────────────────────────────────────────────

/// Supplies move tokens to the initiator.
#[async_trait]
pub trait MoveSource: Send {
    /// The next raw token, or `None` when input is exhausted.
    async fn next_move(&mut self) -> Result<Option<String>, TttError>;
}

/// Replays a fixed list of moves.
#[async_trait]
impl MoveSource for std::vec::IntoIter<String> {
    async fn next_move(&mut self) -> Result<Option<String>, TttError> {
        Ok(self.next())
    }
}

// ── Reporter ─────────────────────────────────────────────────────

/// Something the operator should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A move request went out on the wire.
    Sent {
        header: TttHeader,
        round: Option<u32>,
    },
    /// The peer answered a move.
    Reply {
        board: Board,
        status: SessionStatus,
        round: Option<u32>,
    },
    /// The observer picked a frame to render.
    Observed {
        board: Board,
        status: SessionStatus,
        round: Option<u32>,
    },
    /// The observer's capture window closed with nothing in it.
    NoResponse,
    /// Captured frames did not carry a readable ttt header.
    HeaderNotFound,
    /// The initiator received the quit sentinel or ran out of input.
    Terminated,
}

impl SessionEvent {
    /// Outcome carried by a board event.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            SessionEvent::Reply { status, .. } | SessionEvent::Observed { status, .. } => {
                Some(status.outcome())
            }
            _ => None,
        }
    }
}

/// Receives loop events and errors.
pub trait Reporter {
    fn event(&mut self, event: SessionEvent);

    fn error(&mut self, error: &TttError);
}

/// Keeps everything it is told. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<SessionEvent>,
    pub errors: Vec<String>,
}

impl Reporter for RecordingReporter {
    fn event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn error(&mut self, error: &TttError) {
        self.errors.push(error.to_string());
    }
}
