//! The fixed 14-byte ttt header.
//!
//! ```text
//! offset  size  field
//!      0     1  version       (0x01)
//!      1     2  state / move  ("pl")
//!      3     9  cells tl..br  ("-")
//!     12     2  status        ("pg")
//! ```
//!
//! All fields are single bytes or fixed-width byte strings, so there is
//! no byte order to worry about.

use std::fmt;

use crate::board::Board;
use crate::error::{ParseError, TttError};
use crate::status::{SessionStatus, Token};

pub const HEADER_LENGTH: usize = 14;
pub type TttHeaderBytes = [u8; HEADER_LENGTH];

/// Protocol version sent by default.
pub const PROTOCOL_VERSION: u8 = 0x01;

const STATE: std::ops::Range<usize> = 1..3;
const CELLS: std::ops::Range<usize> = 3..12;
const STATUS: std::ops::Range<usize> = 12..14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TttHeader {
    version: u8,
    state: Token,
    board: Board,
    status: Token,
}

impl TttHeader {
    pub fn new(version: u8, state: Token, board: Board, status: Token) -> Self {
        Self {
            version,
            state,
            board,
            status,
        }
    }

    /// Header for a move request: the move token in the state field and
    /// default cells and status. The peer answers with the real board.
    pub fn for_move(version: u8, token: Token) -> Self {
        Self::new(
            version,
            token,
            Board::empty(),
            SessionStatus::InProgress.token(),
        )
    }

    /// Validate caller text and build the wire bytes in one step.
    ///
    /// Fails with [`TttError::Encoding`] when a token is not exactly two
    /// bytes or a cell is wider than one byte. Empty cells become `-`.
    pub fn encode(
        version: u8,
        state: &str,
        cells: &[&str],
        status: &str,
    ) -> Result<TttHeaderBytes, TttError> {
        let header = Self::new(
            version,
            Token::new(state)?,
            Board::parse(cells)?,
            Token::new(status)?,
        );
        Ok(header.to_bytes())
    }

    pub fn to_bytes(&self) -> TttHeaderBytes {
        let mut bytes: TttHeaderBytes = [0; HEADER_LENGTH];
        bytes[0] = self.version;
        bytes[STATE].copy_from_slice(self.state.as_bytes());
        bytes[CELLS].copy_from_slice(self.board.cells());
        bytes[STATUS].copy_from_slice(self.status.as_bytes());
        bytes
    }

    /// Parse the first [`HEADER_LENGTH`] bytes of `bytes`.
    ///
    /// Cells and status are taken as-is; only the length is checked.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let header: &TttHeaderBytes = bytes
            .get(..HEADER_LENGTH)
            .and_then(|b| b.try_into().ok())
            .ok_or(ParseError::TooShort {
                expected: HEADER_LENGTH,
                actual: bytes.len(),
            })?;

        let mut cells = [0u8; Board::CELLS];
        cells.copy_from_slice(&header[CELLS]);

        Ok(Self {
            version: header[0],
            state: Token::from_raw([header[1], header[2]]),
            board: Board::from_raw(cells),
            status: Token::from_raw([header[12], header[13]]),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn state(&self) -> Token {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status_token(&self) -> Token {
        self.status
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(self.status)
    }
}

impl Default for TttHeader {
    fn default() -> Self {
        Self::new(
            PROTOCOL_VERSION,
            SessionStatus::PlayerTurn.token(),
            Board::empty(),
            SessionStatus::InProgress.token(),
        )
    }
}

/// One-line summary: version, state token, cells and status, e.g.
/// `v1 t5 --------- pg`.
impl fmt::Display for TttHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} {} {} {}",
            self.version,
            self.state,
            String::from_utf8_lossy(self.board.cells()),
            self.status
        )
    }
}
