//! # ttt-core
//!
//! Core protocol library for tic-tac-toe over raw Ethernet frames.
//!
//! This crate contains:
//! - **Protocol types**: `Board`, `Token`, `SessionStatus`, `Outcome`
//! - **Codec**: the fixed 14-byte `TttHeader`, `TttPacket` with its trailer,
//!   and `FrameCodec` for Ethernet II framing via `tokio_util`
//! - **Network**: the `Link` trait, `RawLink` (AF_PACKET), `MemoryLink`,
//!   `CaptureFilter` and the request/response `Transport`
//! - **Session**: the `Initiator` and `Observer` loops
//! - **State**: `SessionState`, `ObserverState` and `InitiatorPhase`
//! - **Config**: `TttConfig`, loaded from TOML
//! - **Error**: `TttError`, a typed, `thiserror`-based error hierarchy

pub mod board;
pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod mac;
pub mod network;
pub mod packet;
pub mod session;
pub mod state;
pub mod status;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use board::{Board, EMPTY_CELL, Position};
pub use codec::FrameCodec;
pub use config::TttConfig;
pub use error::{ParseError, TttError};
pub use header::{HEADER_LENGTH, PROTOCOL_VERSION, TttHeader};
pub use mac::MacAddr;
pub use network::{CaptureFilter, Captured, Direction, Link, MemoryLink, Transport};
#[cfg(target_os = "linux")]
pub use network::RawLink;
pub use packet::{DEFAULT_ETHER_TYPE, EthernetHeader, Frame, TttPacket};
pub use session::{
    Initiator, InitiatorConfig, MoveSource, Observation, Observer, ObserverConfig,
    RecordingReporter, Reporter, SessionEvent,
};
pub use state::{InitiatorPhase, ObserverState, SessionState};
pub use status::{Outcome, SessionStatus, Token};
