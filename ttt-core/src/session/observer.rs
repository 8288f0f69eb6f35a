//! Observer loop: watch frames headed to the peer and render the newest.
//!
//! A best-effort monitor. Empty captures and undecodable frames are
//! reported and the loop carries on; only fatal errors stop it early.
//! Stopping from outside goes through [`Observer::stop_handle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::codec::FrameCodec;
use crate::error::TttError;
use crate::mac::MacAddr;
use crate::network::filter::CaptureFilter;
use crate::network::link::{Captured, Direction, Link};
use crate::network::transport::capture_filtered;
use crate::packet::{DEFAULT_ETHER_TYPE, Frame};
use crate::session::{Reporter, SessionEvent};
use crate::state::ObserverState;

// ── ObserverConfig ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Which frames to capture.
    pub filter: CaptureFilter,
    /// Frames to collect per poll.
    pub capture_count: usize,
    /// How long one poll may wait for frames.
    pub capture_window: Duration,
    /// Pause before every poll.
    pub poll_interval: Duration,
    /// EtherType expected on captured frames.
    pub ether_type: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            filter: CaptureFilter::ether_dst(MacAddr::PEER),
            capture_count: 2,
            capture_window: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            ether_type: DEFAULT_ETHER_TYPE,
        }
    }
}

// ── Observation ──────────────────────────────────────────────────

/// What a single poll produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The capture window closed without a matching frame.
    NoResponse,
    /// The newest decodable frame of the capture.
    Frame(Frame),
}

/// Pick the frame to render out of a capture.
///
/// A capture aimed at the peer holds the player's requests as well as
/// the peer's replies. Replies win over requests: frames this host
/// sent itself rank lowest, then frames with an untouched board (a
/// move request always carries one). Within the same role frames are
/// ranked by round tag, then by arrival; untagged frames rank below
/// tagged ones. Frames that fail to decode are skipped. If none
/// decodes, the last decode error is returned.
pub fn select_newest(
    codec: &FrameCodec,
    captured: &[Captured],
) -> Result<Option<Frame>, TttError> {
    let mut best: Option<(Rank, Frame)> = None;
    let mut last_error = None;

    for (index, capture) in captured.iter().enumerate() {
        match codec.decode_frame(&capture.data) {
            Ok(frame) => {
                let rank = Rank {
                    incoming: capture.direction == Direction::Incoming,
                    played: !frame.header().board().is_empty(),
                    round: frame.packet.round(),
                    index,
                };
                if best.as_ref().is_none_or(|(top, _)| rank >= *top) {
                    best = Some((rank, frame));
                }
            }
            Err(e) => {
                debug!(index, len = capture.data.len(), "undecodable capture: {e}");
                last_error = Some(e);
            }
        }
    }

    match (best, last_error) {
        (Some((rank, frame)), _) => {
            debug!(?rank, "selected frame");
            Ok(Some(frame))
        }
        (None, Some(e)) => Err(e.into()),
        (None, None) => Ok(None),
    }
}

/// Ordering key for [`select_newest`]; fields compare in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    incoming: bool,
    played: bool,
    round: Option<u32>,
    index: usize,
}

// ── Observer ─────────────────────────────────────────────────────

pub struct Observer<L> {
    link: L,
    codec: FrameCodec,
    config: ObserverConfig,
    running: Arc<AtomicBool>,
}

impl<L: Link> Observer<L> {
    pub fn new(link: L, config: ObserverConfig) -> Self {
        Self {
            link,
            codec: FrameCodec::new(config.ether_type),
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Obtain a handle that stops [`run`](Self::run) when set to `false`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Capture once and decide what to show.
    pub async fn poll(
        &mut self,
        state: ObserverState,
    ) -> (ObserverState, Result<Observation, TttError>) {
        let captured = match capture_filtered(
            &mut self.link,
            &self.config.filter,
            self.config.capture_count,
            self.config.capture_window,
        )
        .await
        {
            Ok(captured) => captured,
            Err(e) => return (state.with_failed_poll(), Err(e)),
        };

        match select_newest(&self.codec, &captured) {
            Ok(Some(frame)) => (
                state.with_observation(frame.header(), frame.packet.round()),
                Ok(Observation::Frame(frame)),
            ),
            Ok(None) => (state.with_empty_poll(), Ok(Observation::NoResponse)),
            Err(e) => (state.with_failed_poll(), Err(e)),
        }
    }

    /// Poll until stopped or a fatal error occurs. Returns the final state.
    pub async fn run<R: Reporter + ?Sized>(
        &mut self,
        reporter: &mut R,
        mut state: ObserverState,
    ) -> Result<ObserverState, TttError> {
        info!(filter = %self.config.filter, "observer started");

        while self.running.load(Ordering::SeqCst) {
            tokio::time::sleep(self.config.poll_interval).await;

            let (next, result) = self.poll(state).await;
            state = next;

            match result {
                Ok(Observation::NoResponse) => reporter.event(SessionEvent::NoResponse),
                Ok(Observation::Frame(frame)) => reporter.event(SessionEvent::Observed {
                    board: *frame.header().board(),
                    status: frame.header().status(),
                    round: frame.packet.round(),
                }),
                Err(e) if e.is_parse() => {
                    debug!("header not found: {e}");
                    reporter.event(SessionEvent::HeaderNotFound);
                }
                Err(e) if e.is_fatal() => {
                    error!("observer stopping: {e}");
                    reporter.error(&e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("poll failed: {e}");
                    reporter.error(&e);
                }
            }
        }

        info!(polls = state.polls(), "observer stopped");
        Ok(state)
    }
}
