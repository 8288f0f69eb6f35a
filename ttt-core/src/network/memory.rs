//! In-process link pair.
//!
//! Two [`MemoryLink`]s created by [`MemoryLink::pair`] behave like two
//! hosts on one cable: whatever one sends, the other receives. With
//! [`MemoryLink::with_echo`] a host also sees its own transmissions as
//! [`Direction::Outgoing`] captures, like a packet socket does.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::TttError;
use crate::mac::MacAddr;
use crate::network::link::{Captured, Direction, Link};

#[derive(Debug)]
pub struct MemoryLink {
    mac: MacAddr,
    peer_tx: mpsc::UnboundedSender<Captured>,
    echo_tx: Option<mpsc::UnboundedSender<Captured>>,
    echo_rx: Option<mpsc::UnboundedReceiver<Captured>>,
    rx: mpsc::UnboundedReceiver<Captured>,
}

impl MemoryLink {
    /// Two connected ends with the given hardware addresses.
    pub fn pair(a: MacAddr, b: MacAddr) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            Self {
                mac: a,
                peer_tx: b_tx,
                echo_tx: None,
                echo_rx: None,
                rx: a_rx,
            },
            Self {
                mac: b,
                peer_tx: a_tx,
                echo_tx: None,
                echo_rx: None,
                rx: b_rx,
            },
        )
    }

    /// Also deliver every sent frame back to this end as outgoing.
    pub fn with_echo(mut self) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        self.echo_tx = Some(tx);
        self.echo_rx = Some(rx);
        self
    }

    /// Hand a raw capture to this end as if it came off the wire.
    pub fn inject(&self, captured: Captured) -> Result<(), TttError> {
        match &self.echo_tx {
            Some(tx) => tx.send(captured).map_err(|_| TttError::LinkClosed),
            None => Err(TttError::ProtocolViolation(
                "inject needs a link created with_echo",
            )),
        }
    }
}

#[async_trait]
impl Link for MemoryLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), TttError> {
        let data = Bytes::copy_from_slice(frame);
        if let Some(echo) = &self.echo_tx {
            let _ = echo.send(Captured {
                data: data.clone(),
                direction: Direction::Outgoing,
            });
        }
        self.peer_tx
            .send(Captured::incoming(data))
            .map_err(|_| TttError::LinkClosed)
    }

    async fn recv(&mut self) -> Result<Captured, TttError> {
        let Some(echo_rx) = self.echo_rx.as_mut() else {
            return self.rx.recv().await.ok_or(TttError::LinkClosed);
        };
        tokio::select! {
            biased;
            Some(captured) = echo_rx.recv() => Ok(captured),
            captured = self.rx.recv() => captured.ok_or(TttError::LinkClosed),
        }
    }

    fn local_mac(&self) -> MacAddr {
        self.mac
    }
}
