//! Two-byte tokens, session status codes and game outcomes.
//!
//! Decoding is permissive: any two bytes form a [`Token`] and any token
//! maps to a [`SessionStatus`]. Unrecognized codes become
//! [`SessionStatus::Unknown`], which reads as "still in progress".

use std::fmt;
use std::str::FromStr;

use crate::error::TttError;

// ── Token ────────────────────────────────────────────────────────

/// A fixed two-byte field (state/move token or status code).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token([u8; 2]);

impl Token {
    /// Width of a token on the wire.
    pub const LEN: usize = 2;

    /// Wrap raw bytes without validation.
    pub const fn from_raw(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Build a token from caller text. The text must be exactly two
    /// printable ASCII bytes (space included); nothing is padded or
    /// truncated.
    pub fn new(text: &str) -> Result<Self, TttError> {
        let bytes = text.as_bytes();
        if bytes.len() != Self::LEN {
            return Err(TttError::Encoding(format!(
                "token must be exactly {} bytes, got {} ({text:?})",
                Self::LEN,
                bytes.len()
            )));
        }
        if !bytes.iter().all(|&b| matches!(b, b' '..=b'~')) {
            return Err(TttError::Encoding(format!(
                "token must be printable ascii, got {text:?}"
            )));
        }
        Ok(Self([bytes[0], bytes[1]]))
    }

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }

    /// The token as text, replacing invalid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl FromStr for Token {
    type Err = TttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.to_text())
    }
}

// ── SessionStatus ────────────────────────────────────────────────

/// Protocol phase code carried in the state and status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// `pl`: player to move / move submitted.
    PlayerTurn,
    /// `pg`: game in progress.
    #[default]
    InProgress,
    /// `sv`: the switch won.
    SwitchWins,
    /// `pv`: the player won.
    PlayerWins,
    /// `dr`: draw.
    Draw,
    /// Any other code. Treated as in progress.
    Unknown([u8; 2]),
}

impl SessionStatus {
    pub fn token(&self) -> Token {
        Token::from_raw(match self {
            SessionStatus::PlayerTurn => *b"pl",
            SessionStatus::InProgress => *b"pg",
            SessionStatus::SwitchWins => *b"sv",
            SessionStatus::PlayerWins => *b"pv",
            SessionStatus::Draw => *b"dr",
            SessionStatus::Unknown(raw) => *raw,
        })
    }

    /// The game decision this status encodes.
    pub fn outcome(&self) -> Outcome {
        match self {
            SessionStatus::SwitchWins => Outcome::SwitchWins,
            SessionStatus::PlayerWins => Outcome::PlayerWins,
            SessionStatus::Draw => Outcome::Draw,
            _ => Outcome::InProgress,
        }
    }
}

impl From<Token> for SessionStatus {
    fn from(token: Token) -> Self {
        match token.as_bytes() {
            b"pl" => SessionStatus::PlayerTurn,
            b"pg" => SessionStatus::InProgress,
            b"sv" => SessionStatus::SwitchWins,
            b"pv" => SessionStatus::PlayerWins,
            b"dr" => SessionStatus::Draw,
            raw => SessionStatus::Unknown(*raw),
        }
    }
}

impl From<SessionStatus> for Token {
    fn from(status: SessionStatus) -> Self {
        status.token()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

// ── Outcome ──────────────────────────────────────────────────────

/// How the game stands after a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    SwitchWins,
    PlayerWins,
    Draw,
    InProgress,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    /// Operator-facing line, `None` while the game continues.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::SwitchWins => Some("Switch wins"),
            Outcome::PlayerWins => Some("You win"),
            Outcome::Draw => Some("Draw"),
            Outcome::InProgress => None,
        }
    }
}
