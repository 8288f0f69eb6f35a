//! Domain-specific error types for the ttt protocol.
//!
//! All fallible operations return `Result<T, TttError>`.
//! No panics on invalid input. Every error is typed and the session
//! loops decide with [`TttError::is_fatal`] whether to keep going.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the ttt protocol.
#[derive(Debug, Error)]
pub enum TttError {
    // ── Codec Errors ─────────────────────────────────────────────
    /// A field handed to the encoder does not fit its fixed slot.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Received bytes could not be parsed into a frame.
    #[error(transparent)]
    Parse(#[from] ParseError),

    // ── Transport Errors ─────────────────────────────────────────
    /// No reply arrived before the deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The raw socket layer reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The named network interface does not exist.
    #[error("network interface not found: {0}")]
    InterfaceNotFound(String),

    /// The other end of an in-process link was dropped.
    #[error("link closed")]
    LinkClosed,

    // ── Configuration Errors ─────────────────────────────────────
    /// A capture filter expression could not be parsed.
    #[error("invalid capture filter: {0}")]
    InvalidFilter(String),

    /// A MAC address string could not be parsed.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    // ── Session Errors ───────────────────────────────────────────
    /// A state machine transition was attempted from the wrong phase.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),
}

// ── ParseError ───────────────────────────────────────────────────

/// Why a captured buffer was rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Fewer bytes than the fixed layout requires.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// The link-layer frame does not carry the ttt protocol type.
    #[error("ttt header not found (ether type {ether_type:#06x})")]
    HeaderAbsent { ether_type: u16 },
}

impl TttError {
    /// Whether a session loop must stop after this error.
    ///
    /// Missing interfaces, privilege failures and a vanished link can
    /// not be fixed by trying again; everything else only costs the
    /// current round.
    pub fn is_fatal(&self) -> bool {
        match self {
            TttError::InterfaceNotFound(_)
            | TttError::LinkClosed
            | TttError::ProtocolViolation(_) => true,
            TttError::Transport(e) => matches!(
                e.kind(),
                io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
            ) || e.raw_os_error() == Some(ENODEV),
            _ => false,
        }
    }

    /// Whether this error means the protocol header could not be found
    /// in a captured frame.
    pub fn is_parse(&self) -> bool {
        matches!(self, TttError::Parse(_))
    }
}

/// `ENODEV`: the interface disappeared underneath an open socket.
const ENODEV: i32 = 19;
