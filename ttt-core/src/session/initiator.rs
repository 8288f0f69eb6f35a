//! Initiator loop: read a move, send it, wait for the peer's verdict.
//!
//! Every round is one complete attempt. Failures are reported and the
//! loop goes back to waiting for input; only fatal errors end it.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::TttError;
use crate::header::{PROTOCOL_VERSION, TttHeader};
use crate::network::link::Link;
use crate::network::transport::Transport;
use crate::packet::{Frame, TttPacket};
use crate::session::{MoveSource, Reporter, SessionEvent};
use crate::state::{InitiatorPhase, SessionState};
use crate::status::Token;

/// Input that ends the session. Matched exactly, case-sensitive.
pub const QUIT: &str = "quit";

// ── InitiatorConfig ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InitiatorConfig {
    /// Version byte written into every request.
    pub version: u8,
    /// How long to wait for the peer's reply.
    pub reply_timeout: Duration,
    /// Carry the round counter in the packet trailer.
    pub tag_rounds: bool,
}

impl Default for InitiatorConfig {
    fn default() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            reply_timeout: Duration::from_secs(1),
            tag_rounds: true,
        }
    }
}

// ── Initiator ────────────────────────────────────────────────────

pub struct Initiator<L> {
    transport: Transport<L>,
    config: InitiatorConfig,
}

impl<L: Link> Initiator<L> {
    pub fn new(transport: Transport<L>, config: InitiatorConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &Transport<L> {
        &self.transport
    }

    pub fn config(&self) -> &InitiatorConfig {
        &self.config
    }

    /// Play one round with `token`.
    ///
    /// Always hands back the next state: on success it carries the
    /// peer's board and status, on failure the phase records how the
    /// round ended and the board is left untouched. The request is
    /// reported as [`SessionEvent::Sent`] once it is on the wire.
    pub async fn play_round<R: Reporter + ?Sized>(
        &mut self,
        state: SessionState,
        token: &str,
        reporter: &mut R,
    ) -> (SessionState, Result<Frame, TttError>) {
        let mut phase = state.phase();
        let round = state.next_round_number();
        let state = state.with_round(round);

        match self.exchange(&mut phase, token, round, reporter).await {
            Ok(reply) => (state.with_reply(reply.header()).with_phase(phase), Ok(reply)),
            Err(error) => match phase.fail(&error) {
                Ok(()) => (state.with_phase(phase), Err(error)),
                Err(violation) => (state.with_phase(phase), Err(violation)),
            },
        }
    }

    async fn exchange<R: Reporter + ?Sized>(
        &mut self,
        phase: &mut InitiatorPhase,
        token: &str,
        round: u32,
        reporter: &mut R,
    ) -> Result<Frame, TttError> {
        phase.begin_encoding()?;
        let header = TttHeader::for_move(self.config.version, Token::new(token)?);
        let packet = if self.config.tag_rounds {
            TttPacket::tagged(header, round)
        } else {
            TttPacket::new(header)
        };

        phase.begin_transmit()?;
        // Late answers to earlier rounds must not pass for this one.
        self.transport.discard_pending().await?;
        let sent = self.transport.send(packet).await?;
        reporter.event(SessionEvent::Sent {
            header: *sent.header(),
            round: sent.packet.round(),
        });

        phase.await_reply()?;
        let reply = self
            .transport
            .await_reply(sent.packet.round(), self.config.reply_timeout)
            .await?;

        phase.reply_received()?;
        Ok(reply)
    }

    /// Drive rounds until the quit sentinel, end of input or a fatal
    /// error. Returns the final state.
    pub async fn run<S, R>(
        &mut self,
        source: &mut S,
        reporter: &mut R,
        mut state: SessionState,
    ) -> Result<SessionState, TttError>
    where
        S: MoveSource + ?Sized,
        R: Reporter + ?Sized,
    {
        info!(peer = %self.transport.peer(), "initiator started");
        loop {
            let mut phase = state.phase();
            if phase.is_round_over() {
                phase.next_round()?;
                state = state.with_phase(phase);
            }

            let token = match source.next_move().await? {
                Some(token) if token != QUIT => token,
                _ => {
                    phase.terminate()?;
                    reporter.event(SessionEvent::Terminated);
                    info!(rounds = state.round(), "initiator terminated");
                    return Ok(state.with_phase(phase));
                }
            };

            debug!(%token, round = state.next_round_number(), "move");
            let (next, result) = self.play_round(state, &token, &mut *reporter).await;
            state = next;

            match result {
                Ok(reply) => reporter.event(SessionEvent::Reply {
                    board: *reply.header().board(),
                    status: reply.header().status(),
                    round: reply.packet.round(),
                }),
                Err(e) if e.is_fatal() => {
                    error!("initiator stopping: {e}");
                    reporter.error(&e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(phase = %state.phase(), "round failed: {e}");
                    reporter.error(&e);
                }
            }
        }
    }
}
