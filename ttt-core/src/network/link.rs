use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TttError;
use crate::mac::MacAddr;

/// Which way a captured frame was travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from the wire.
    Incoming,
    /// A copy of a frame this host transmitted.
    Outgoing,
}

/// One raw link-layer frame as seen by a [`Link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub data: Bytes,
    pub direction: Direction,
}

impl Captured {
    pub fn incoming(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            direction: Direction::Incoming,
        }
    }

    pub fn outgoing(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            direction: Direction::Outgoing,
        }
    }
}

/// A link that moves whole Ethernet frames.
///
/// `recv` waits without a deadline; callers bound it with
/// `tokio::time::timeout`.
#[async_trait]
pub trait Link: Send {
    /// Transmit one complete frame, Ethernet header included.
    async fn send(&mut self, frame: &[u8]) -> Result<(), TttError>;

    /// Wait for the next frame seen on the link.
    async fn recv(&mut self) -> Result<Captured, TttError>;

    /// Hardware address of the local end.
    fn local_mac(&self) -> MacAddr;
}

#[async_trait]
impl<L: Link + ?Sized> Link for Box<L> {
    async fn send(&mut self, frame: &[u8]) -> Result<(), TttError> {
        (**self).send(frame).await
    }

    async fn recv(&mut self) -> Result<Captured, TttError> {
        (**self).recv().await
    }

    fn local_mac(&self) -> MacAddr {
        (**self).local_mac()
    }
}
