//! Line-oriented move input.
//!
//! Each move is one line of text. Before every read a `> ` prompt is
//! written, and the line is echoed back once it arrives. Only the line
//! terminator (`\n` or `\r\n`) is removed; other whitespace is kept, so
//! `" quit"` is a move and not the quit sentinel.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use ttt_core::{MoveSource, TttError};

pub const PROMPT: &str = "> ";

/// Longest accepted input line.
const MAX_LINE: usize = 256;

/// Reads moves from `R`, prompting and echoing on `W`.
pub struct LineMoves<R, W> {
    lines: FramedRead<R, LinesCodec>,
    out: W,
}

impl<R: AsyncRead, W> LineMoves<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: FramedRead::new(input, LinesCodec::new_with_max_length(MAX_LINE)),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[async_trait]
impl<R, W> MoveSource for LineMoves<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_move(&mut self) -> Result<Option<String>, TttError> {
        self.out.write_all(PROMPT.as_bytes()).await?;
        self.out.flush().await?;

        let line = match self.lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                return Err(TttError::Encoding(format!(
                    "input line longer than {MAX_LINE} bytes"
                )));
            }
            Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
            None => return Ok(None),
        };

        self.out.write_all(format!("{line}\n").as_bytes()).await?;
        self.out.flush().await?;
        Ok(Some(line))
    }
}
