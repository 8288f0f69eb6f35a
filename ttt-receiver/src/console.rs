//! Terminal output for the observer.

use std::io::{self, Write};

use tracing::warn;
use ttt_core::{Reporter, SessionEvent, TttError};

pub const NO_RESPONSE: &str = "Didn't receive response";
pub const HEADER_NOT_FOUND: &str = "cannot find ttt header in the packet";

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

    fn print(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::Observed { board, status, .. } => {
                writeln!(self.out, "{board}\n")?;
                if let Some(message) = status.outcome().message() {
                    writeln!(self.out, "{message}")?;
                }
            }
            SessionEvent::NoResponse => writeln!(self.out, "{NO_RESPONSE}")?,
            SessionEvent::HeaderNotFound => writeln!(self.out, "{HEADER_NOT_FOUND}")?,
            SessionEvent::Sent { .. } | SessionEvent::Reply { .. } | SessionEvent::Terminated => {}
        }
        self.out.flush()
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn event(&mut self, event: SessionEvent) {
        if let Err(e) = self.print(&event) {
            warn!("console write failed: {e}");
        }
    }

    fn error(&mut self, error: &TttError) {
        if let Err(e) = writeln!(self.out, "{error}").and_then(|()| self.out.flush()) {
            warn!("console write failed: {e}");
        }
    }
}
