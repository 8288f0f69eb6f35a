//! The 3×3 board carried in every ttt header.

use std::fmt;

use crate::error::TttError;

/// Marker for a cell nobody has played yet.
pub const EMPTY_CELL: u8 = b'-';

// ── Position ─────────────────────────────────────────────────────

/// Board cells in wire (row-major) order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    TopLeft = 0,
    TopMid = 1,
    TopRight = 2,
    MidLeft = 3,
    MidMid = 4,
    MidRight = 5,
    BottomLeft = 6,
    BottomMid = 7,
    BottomRight = 8,
}

impl Position {
    /// All positions, top-left to bottom-right.
    pub const ALL: [Position; 9] = [
        Position::TopLeft,
        Position::TopMid,
        Position::TopRight,
        Position::MidLeft,
        Position::MidMid,
        Position::MidRight,
        Position::BottomLeft,
        Position::BottomMid,
        Position::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short field name (`tl`, `tm`, ... `br`).
    pub fn name(self) -> &'static str {
        match self {
            Position::TopLeft => "tl",
            Position::TopMid => "tm",
            Position::TopRight => "tr",
            Position::MidLeft => "ml",
            Position::MidMid => "mm",
            Position::MidRight => "mr",
            Position::BottomLeft => "bl",
            Position::BottomMid => "bm",
            Position::BottomRight => "br",
        }
    }
}

// ── Board ────────────────────────────────────────────────────────

/// Nine one-byte cells.
///
/// Boards built through [`Board::parse`] or [`Board::with`] hold only
/// printable ASCII, space (0x20) through `~` (0x7e). A space is a valid
/// mark; only an empty string leaves a cell unset. Boards decoded off the wire keep whatever bytes
/// arrived; judging them is left to the peer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [u8; 9],
}

impl Board {
    /// Number of cells on the wire.
    pub const CELLS: usize = 9;

    /// A board with every cell set to [`EMPTY_CELL`].
    pub const fn empty() -> Self {
        Self {
            cells: [EMPTY_CELL; 9],
        }
    }

    /// Wrap raw cell bytes without validation.
    pub const fn from_raw(cells: [u8; 9]) -> Self {
        Self { cells }
    }

    /// Build a board from nine textual cells.
    ///
    /// An empty string leaves the cell unset (`-`). Anything wider than
    /// one byte, or not printable ASCII, is an encoding error.
    pub fn parse(cells: &[&str]) -> Result<Self, TttError> {
        if cells.len() != Self::CELLS {
            return Err(TttError::Encoding(format!(
                "board needs {} cells, got {}",
                Self::CELLS,
                cells.len()
            )));
        }
        let mut board = Self::empty();
        for (pos, cell) in Position::ALL.into_iter().zip(cells) {
            match cell.as_bytes() {
                [] => {}
                &[b] => board = board.with(pos, b)?,
                _ => {
                    return Err(TttError::Encoding(format!(
                        "cell {} must be one byte, got {:?}",
                        pos.name(),
                        cell
                    )));
                }
            }
        }
        Ok(board)
    }

    /// Return a copy with `pos` set to `mark`.
    pub fn with(mut self, pos: Position, mark: u8) -> Result<Self, TttError> {
        if !matches!(mark, b' '..=b'~') {
            return Err(TttError::Encoding(format!(
                "cell {} must be printable ascii, got {mark:#04x}",
                pos.name()
            )));
        }
        self.cells[pos.index()] = mark;
        Ok(self)
    }

    pub fn get(&self, pos: Position) -> u8 {
        self.cells[pos.index()]
    }

    pub fn cells(&self) -> &[u8; 9] {
        &self.cells
    }

    /// Whether every cell is still [`EMPTY_CELL`].
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == EMPTY_CELL)
    }

    /// Iterate over the three rows, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(3)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

/// Renders the board as three rows separated by blank lines:
///
/// ```text
/// X - -
///
/// - O -
///
/// - - -
/// ```
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            let [a, b, c] = [row[0], row[1], row[2]].map(char::from);
            write!(f, "{a} {b} {c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Board")
            .field(&String::from_utf8_lossy(&self.cells))
            .finish()
    }
}
