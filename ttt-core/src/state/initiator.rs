//! The initiator's round state machine.
//!
//! Provides an `InitiatorPhase` enum that models one move round, with
//! validated transitions that return `Result` instead of panicking.

use std::fmt;

use crate::error::TttError;

// ── InitiatorPhase ───────────────────────────────────────────────

/// Where the initiator is within the current round.
///
/// ```text
///  AwaitingInput ──► Encoding ──► Transmitting ──► AwaitingReply
///    ▲   │              │               │              │
///    │   ▼              ▼               ▼              ▼
///    │ Terminated    Aborted ◄──────────┘     ReplyReceived | TimedOut | Aborted
///    │                  │                              │
///    └──────────────────┴──────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitiatorPhase {
    /// Waiting for the next move from the operator. Initial state.
    #[default]
    AwaitingInput,

    /// Building the request frame.
    Encoding,

    /// Handing the frame to the link.
    Transmitting,

    /// Frame sent; waiting for the peer's reply.
    AwaitingReply,

    /// The peer answered with a decodable frame.
    ReplyReceived,

    /// No reply arrived before the deadline.
    TimedOut,

    /// Encoding, transmission or decoding failed.
    Aborted,

    /// The operator quit. Terminal.
    Terminated,
}

impl fmt::Display for InitiatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingInput => "AwaitingInput",
            Self::Encoding => "Encoding",
            Self::Transmitting => "Transmitting",
            Self::AwaitingReply => "AwaitingReply",
            Self::ReplyReceived => "ReplyReceived",
            Self::TimedOut => "TimedOut",
            Self::Aborted => "Aborted",
            Self::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

impl InitiatorPhase {
    /// Whether the current round has finished, one way or another.
    pub fn is_round_over(&self) -> bool {
        matches!(self, Self::ReplyReceived | Self::TimedOut | Self::Aborted)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Encoding` once a move token arrived.
    ///
    /// Valid from: `AwaitingInput`.
    pub fn begin_encoding(&mut self) -> Result<(), TttError> {
        match self {
            Self::AwaitingInput => {
                *self = Self::Encoding;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot encode: not awaiting input",
            )),
        }
    }

    /// Transition to `Transmitting`.
    ///
    /// Valid from: `Encoding`.
    pub fn begin_transmit(&mut self) -> Result<(), TttError> {
        match self {
            Self::Encoding => {
                *self = Self::Transmitting;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot transmit: not in Encoding state",
            )),
        }
    }

    /// Transition to `AwaitingReply`.
    ///
    /// Valid from: `Transmitting`.
    pub fn await_reply(&mut self) -> Result<(), TttError> {
        match self {
            Self::Transmitting => {
                *self = Self::AwaitingReply;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot await reply: nothing transmitted",
            )),
        }
    }

    /// Transition to `ReplyReceived`.
    ///
    /// Valid from: `AwaitingReply`.
    pub fn reply_received(&mut self) -> Result<(), TttError> {
        match self {
            Self::AwaitingReply => {
                *self = Self::ReplyReceived;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot accept reply: not awaiting one",
            )),
        }
    }

    /// Close the round after a failure.
    ///
    /// `Timeout` while awaiting a reply leads to `TimedOut`; anything
    /// else during `Encoding`, `Transmitting` or `AwaitingReply` leads
    /// to `Aborted`.
    pub fn fail(&mut self, error: &TttError) -> Result<(), TttError> {
        match (*self, error) {
            (Self::AwaitingReply, TttError::Timeout(_)) => {
                *self = Self::TimedOut;
                Ok(())
            }
            (Self::Encoding | Self::Transmitting | Self::AwaitingReply, _) => {
                *self = Self::Aborted;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot fail: no round in flight",
            )),
        }
    }

    /// Return to `AwaitingInput` for the next move.
    ///
    /// Valid from: `ReplyReceived`, `TimedOut`, `Aborted`.
    pub fn next_round(&mut self) -> Result<(), TttError> {
        if self.is_round_over() {
            *self = Self::AwaitingInput;
            Ok(())
        } else {
            Err(TttError::ProtocolViolation(
                "cannot start next round: current round still running",
            ))
        }
    }

    /// Transition to `Terminated` on the quit sentinel.
    ///
    /// Valid from: `AwaitingInput`.
    pub fn terminate(&mut self) -> Result<(), TttError> {
        match self {
            Self::AwaitingInput => {
                *self = Self::Terminated;
                Ok(())
            }
            _ => Err(TttError::ProtocolViolation(
                "cannot terminate: a round is in flight",
            )),
        }
    }
}
