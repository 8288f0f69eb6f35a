//! Terminal output for the player.

use std::io::{self, Write};

use tracing::warn;
use ttt_core::{Board, Reporter, SessionEvent, SessionStatus, TttError, TttHeader};

/// Prints the board the peer sent back and, when the game is decided,
/// who won.
pub struct ConsoleReporter<W> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_sent(&mut self, header: &TttHeader, round: Option<u32>) -> io::Result<()> {
        match round {
            Some(round) => writeln!(self.out, "sent #{round}: {header}")?,
            None => writeln!(self.out, "sent: {header}")?,
        }
        self.out.flush()
    }

    fn print_reply(&mut self, board: &Board, status: SessionStatus) -> io::Result<()> {
        writeln!(self.out, "{board}\n")?;
        if let Some(message) = status.outcome().message() {
            writeln!(self.out, "{message}")?;
        }
        self.out.flush()
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn event(&mut self, event: SessionEvent) {
        let result = match event {
            SessionEvent::Sent { header, round } => self.print_sent(&header, round),
            SessionEvent::Reply { board, status, .. } => self.print_reply(&board, status),
            _ => Ok(()),
        };
        if let Err(e) = result {
            warn!("console write failed: {e}");
        }
    }

    fn error(&mut self, error: &TttError) {
        if let Err(e) = writeln!(self.out, "{error}") {
            warn!("console write failed: {e}");
        }
    }
}
