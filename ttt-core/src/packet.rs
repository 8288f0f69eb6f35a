//! Packets (header + trailer) and the Ethernet frames that carry them.
//!
//! ## Trailer
//!
//! The header is always followed by at least one trailer byte:
//!
//! ```text
//! untagged:  0x20                     (single pad byte)
//! tagged:    '#' round:u32 (BE)       (5 bytes)
//! ```
//!
//! Anything after the trailer (driver padding up to the Ethernet
//! minimum) is ignored. Peers that only read the 14-byte header see the
//! trailer as padding and usually echo it back untouched, which lets the
//! observer rank replies by round.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ParseError;
use crate::header::{HEADER_LENGTH, TttHeader};
use crate::mac::MacAddr;

/// Legacy single-byte pad.
pub const PAD_BYTE: u8 = b' ';

/// Marks a round-tagged trailer.
pub const ROUND_MARKER: u8 = b'#';

const ROUND_TRAILER_LENGTH: usize = 5;

/// Private EtherType used by the game.
pub const DEFAULT_ETHER_TYPE: u16 = 0x1234;

// ── TttPacket ────────────────────────────────────────────────────

/// One protocol message: header plus trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TttPacket {
    header: TttHeader,
    round: Option<u32>,
}

impl TttPacket {
    /// An untagged packet (single pad byte trailer).
    pub fn new(header: TttHeader) -> Self {
        Self {
            header,
            round: None,
        }
    }

    /// A packet whose trailer carries `round`.
    pub fn tagged(header: TttHeader, round: u32) -> Self {
        Self {
            header,
            round: Some(round),
        }
    }

    pub fn header(&self) -> &TttHeader {
        &self.header
    }

    pub fn round(&self) -> Option<u32> {
        self.round
    }

    /// Encoded length, trailer included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LENGTH
            + match self.round {
                Some(_) => ROUND_TRAILER_LENGTH,
                None => 1,
            }
    }

    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_slice(&self.header.to_bytes());
        match self.round {
            Some(round) => {
                dst.put_u8(ROUND_MARKER);
                dst.put_u32(round);
            }
            None => dst.put_u8(PAD_BYTE),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let header = TttHeader::from_bytes(bytes)?;
        let trailer = &bytes[HEADER_LENGTH..];
        let round = match trailer {
            [ROUND_MARKER, a, b, c, d, ..] => Some(u32::from_be_bytes([*a, *b, *c, *d])),
            _ => None,
        };
        Ok(Self { header, round })
    }
}

// ── EthernetHeader ───────────────────────────────────────────────

/// Ethernet II header: destination, source, EtherType.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ether_type: u16,
}

impl EthernetHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 14;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..6].copy_from_slice(&self.dst.octets());
        buf[6..12].copy_from_slice(&self.src.octets());
        buf[12..14].copy_from_slice(&self.ether_type.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, ParseError> {
        let too_short = ParseError::TooShort {
            expected: Self::SIZE,
            actual: data.len(),
        };
        if data.len() < Self::SIZE {
            return Err(too_short);
        }
        let dst = MacAddr::from_slice(&data[0..6]).ok_or(too_short.clone())?;
        let src = MacAddr::from_slice(&data[6..12]).ok_or(too_short)?;
        Ok(Self {
            dst,
            src,
            ether_type: u16::from_be_bytes([data[12], data[13]]),
        })
    }
}

// ── Frame ────────────────────────────────────────────────────────

/// A ttt packet addressed on the link.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub packet: TttPacket,
}

impl Frame {
    pub fn new(dst: MacAddr, src: MacAddr, packet: TttPacket) -> Self {
        Self { dst, src, packet }
    }

    pub fn header(&self) -> &TttHeader {
        self.packet.header()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.packet.header();
        f.debug_struct("Frame")
            .field("dst", &format_args!("{}", self.dst))
            .field("src", &format_args!("{}", self.src))
            .field("version", &header.version())
            .field("state", &header.state())
            .field("board", header.board())
            .field("status", &header.status_token())
            .field("round", &self.packet.round())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Token;

    fn move_header(token: &str) -> TttHeader {
        TttHeader::for_move(1, Token::new(token).unwrap())
    }

    #[test]
    fn untagged_packet_has_single_pad() {
        let bytes = TttPacket::new(TttHeader::default()).to_bytes();
        assert_eq!(bytes.len(), HEADER_LENGTH + 1);
        assert_eq!(bytes[HEADER_LENGTH], PAD_BYTE);

        let decoded = TttPacket::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.round(), None);
    }

    #[test]
    fn tagged_packet_carries_round() {
        let packet = TttPacket::tagged(move_header("t5"), 0x0102_0304);
        let bytes = packet.to_bytes();
        assert_eq!(&bytes[HEADER_LENGTH..], &[b'#', 1, 2, 3, 4]);
        assert_eq!(TttPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn driver_padding_is_ignored() {
        let mut bytes = TttPacket::tagged(move_header("t1"), 7).to_bytes().to_vec();
        bytes.resize(46, 0);
        assert_eq!(TttPacket::from_bytes(&bytes).unwrap().round(), Some(7));

        let mut bytes = TttPacket::new(move_header("t1")).to_bytes().to_vec();
        bytes.resize(46, 0);
        assert_eq!(TttPacket::from_bytes(&bytes).unwrap().round(), None);
    }

    #[test]
    fn header_only_has_no_round() {
        let bytes = TttHeader::default().to_bytes();
        assert_eq!(TttPacket::from_bytes(&bytes).unwrap().round(), None);
    }

    #[test]
    fn ethernet_header_layout() {
        let eth = EthernetHeader {
            dst: MacAddr::PEER,
            src: MacAddr::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            ether_type: DEFAULT_ETHER_TYPE,
        };
        let bytes = eth.encode();
        assert_eq!(&bytes[0..6], &[0, 4, 0, 0, 0, 0]);
        assert_eq!(&bytes[12..14], &[0x12, 0x34]);
        assert_eq!(EthernetHeader::decode(&bytes).unwrap(), eth);
        assert!(matches!(
            EthernetHeader::decode(&bytes[..8]),
            Err(ParseError::TooShort { expected: 14, actual: 8 })
        ));
    }
}
