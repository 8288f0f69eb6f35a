//! `tokio_util` codec for whole link-layer frames.
//!
//! Raw sockets deliver one frame per read, so the decoder always
//! consumes the entire buffer it is handed.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ParseError, TttError};
use crate::packet::{DEFAULT_ETHER_TYPE, EthernetHeader, Frame, TttPacket};

/// Encodes [`Frame`]s as Ethernet II frames of one EtherType and
/// decodes captures back, rejecting other protocol types.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    ether_type: u16,
}

impl FrameCodec {
    pub fn new(ether_type: u16) -> Self {
        Self { ether_type }
    }

    pub fn ether_type(&self) -> u16 {
        self.ether_type
    }

    /// Decode one captured datagram.
    pub fn decode_frame(&self, data: &[u8]) -> Result<Frame, ParseError> {
        let eth = EthernetHeader::decode(data)?;
        if eth.ether_type != self.ether_type {
            return Err(ParseError::HeaderAbsent {
                ether_type: eth.ether_type,
            });
        }
        let packet = TttPacket::from_bytes(&data[EthernetHeader::SIZE..])?;
        Ok(Frame::new(eth.dst, eth.src, packet))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ETHER_TYPE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TttError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let datagram = src.split();
        Ok(Some(self.decode_frame(&datagram)?))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = TttError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let eth = EthernetHeader {
            dst: item.dst,
            src: item.src,
            ether_type: self.ether_type,
        };
        dst.reserve(EthernetHeader::SIZE + item.packet.encoded_len());
        dst.put_slice(&eth.encode());
        item.packet.write_to(dst);
        Ok(())
    }
}
