//! Request/response and capture on top of a [`Link`].
//!
//! Every wait is bounded by a deadline fixed when the wait starts:
//! skipping unrelated frames never extends it.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::codec::Encoder;
use tracing::{debug, trace};

use crate::codec::FrameCodec;
use crate::error::TttError;
use crate::mac::MacAddr;
use crate::network::filter::CaptureFilter;
use crate::network::link::{Captured, Direction, Link};
use crate::packet::{EthernetHeader, Frame, TttPacket};

/// Sends ttt packets to one fixed peer over a [`Link`].
#[derive(Debug)]
pub struct Transport<L> {
    link: L,
    peer: MacAddr,
    codec: FrameCodec,
}

impl<L: Link> Transport<L> {
    pub fn new(link: L, peer: MacAddr, ether_type: u16) -> Self {
        Self {
            link,
            peer,
            codec: FrameCodec::new(ether_type),
        }
    }

    pub fn peer(&self) -> MacAddr {
        self.peer
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Address `packet` to the peer and transmit it once.
    pub async fn send(&mut self, packet: TttPacket) -> Result<Frame, TttError> {
        let frame = Frame::new(self.peer, self.link.local_mac(), packet);
        let mut buf = BytesMut::new();
        self.codec.encode(frame, &mut buf)?;
        self.link.send(&buf).await?;
        debug!(?frame, "sent");
        Ok(frame)
    }

    /// Drop every frame already queued on the link without waiting.
    ///
    /// A reply that arrives after its round timed out stays queued on a
    /// long-lived socket; clearing the queue before the next request
    /// keeps it from being taken as that request's answer.
    pub async fn discard_pending(&mut self) -> Result<usize, TttError> {
        let mut discarded = 0;
        while let Ok(captured) = timeout(Duration::ZERO, self.link.recv()).await {
            let captured = captured?;
            trace!(len = captured.data.len(), "discarding queued frame");
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "dropped stale frames before sending");
        }
        Ok(discarded)
    }

    /// Wait up to `timeout` for the first incoming frame of our EtherType
    /// that answers `round`.
    ///
    /// Echoes of our own transmissions and foreign traffic are skipped.
    /// When both the request and a reply carry a round tag and the tags
    /// differ, the reply belongs to another round and is skipped too.
    /// Untagged replies are accepted for any round.
    pub async fn await_reply(
        &mut self,
        round: Option<u32>,
        timeout: Duration,
    ) -> Result<Frame, TttError> {
        let deadline = Instant::now() + timeout;

        loop {
            let captured = timeout_at(deadline, self.link.recv())
                .await
                .map_err(|_| TttError::Timeout(timeout))??;

            if captured.direction == Direction::Outgoing {
                trace!(len = captured.data.len(), "skipping own echo");
                continue;
            }
            match EthernetHeader::decode(&captured.data) {
                Ok(eth) if eth.ether_type == self.codec.ether_type() => {}
                _ => {
                    trace!(len = captured.data.len(), "skipping foreign frame");
                    continue;
                }
            }

            let reply = self.codec.decode_frame(&captured.data)?;
            match (round, reply.packet.round()) {
                (Some(want), Some(got)) if want != got => {
                    debug!(want, got, "skipping reply for another round");
                    continue;
                }
                _ => {}
            }
            debug!(frame = ?reply, "reply");
            return Ok(reply);
        }
    }

    /// Send `packet` once and wait up to `timeout` for its reply.
    ///
    /// Frames queued before the send are discarded first. There is no
    /// retry: on [`TttError::Timeout`] the caller decides.
    pub async fn send_and_await_reply(
        &mut self,
        packet: TttPacket,
        timeout: Duration,
    ) -> Result<Frame, TttError> {
        self.discard_pending().await?;
        let sent = self.send(packet).await?;
        self.await_reply(sent.packet.round(), timeout).await
    }

    /// Collect up to `count` raw frames matching `filter` within `window`.
    ///
    /// Returning fewer frames, or none, when the window closes is a
    /// normal result rather than an error.
    pub async fn capture_filtered(
        &mut self,
        filter: &CaptureFilter,
        count: usize,
        window: Duration,
    ) -> Result<Vec<Captured>, TttError> {
        capture_filtered(&mut self.link, filter, count, window).await
    }
}

/// Free-standing capture used by links that are not tied to a peer.
pub async fn capture_filtered<L: Link + ?Sized>(
    link: &mut L,
    filter: &CaptureFilter,
    count: usize,
    window: Duration,
) -> Result<Vec<Captured>, TttError> {
    let deadline = Instant::now() + window;
    let mut frames = Vec::with_capacity(count);

    while frames.len() < count {
        let captured = match timeout_at(deadline, link.recv()).await {
            Ok(result) => result?,
            Err(_elapsed) => break,
        };
        if filter.matches(&captured) {
            frames.push(captured);
        }
    }

    debug!(captured = frames.len(), wanted = count, %filter, "capture done");
    Ok(frames)
}
