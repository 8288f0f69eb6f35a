//! Capture filters in a small pcap-like syntax.
//!
//! ```text
//! ether dst 00:04:00:00:00:00
//! ether src 02:00:00:00:00:01 and ether proto 0x1234
//! inbound
//! ```
//!
//! An empty expression matches every frame.

use std::fmt;
use std::str::FromStr;

use crate::error::TttError;
use crate::mac::MacAddr;
use crate::network::link::{Captured, Direction};
use crate::packet::EthernetHeader;

/// A single filter primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    EtherDst(MacAddr),
    EtherSrc(MacAddr),
    EtherProto(u16),
    Direction(Direction),
}

impl Predicate {
    fn matches(&self, eth: &EthernetHeader, direction: Direction) -> bool {
        match *self {
            Predicate::EtherDst(mac) => eth.dst == mac,
            Predicate::EtherSrc(mac) => eth.src == mac,
            Predicate::EtherProto(proto) => eth.ether_type == proto,
            Predicate::Direction(d) => direction == d,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::EtherDst(mac) => write!(f, "ether dst {mac}"),
            Predicate::EtherSrc(mac) => write!(f, "ether src {mac}"),
            Predicate::EtherProto(proto) => write!(f, "ether proto {proto:#06x}"),
            Predicate::Direction(Direction::Incoming) => f.write_str("inbound"),
            Predicate::Direction(Direction::Outgoing) => f.write_str("outbound"),
        }
    }
}

/// A conjunction of [`Predicate`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureFilter {
    predicates: Vec<Predicate>,
}

impl CaptureFilter {
    /// Matches everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Frames addressed to `mac`.
    pub fn ether_dst(mac: MacAddr) -> Self {
        Self::any().and(Predicate::EtherDst(mac))
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether a raw capture passes the filter.
    ///
    /// Address and protocol predicates can not be judged on a frame too
    /// short to carry an Ethernet header, so such runts pass on to the
    /// decoder, which reports them as malformed.
    pub fn matches(&self, captured: &Captured) -> bool {
        match EthernetHeader::decode(&captured.data) {
            Ok(eth) => self
                .predicates
                .iter()
                .all(|p| p.matches(&eth, captured.direction)),
            Err(_) => self.predicates.iter().all(|p| match p {
                Predicate::Direction(d) => *d == captured.direction,
                _ => true,
            }),
        }
    }
}

impl FromStr for CaptureFilter {
    type Err = TttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| TttError::InvalidFilter(format!("{why} in {s:?}"));
        let mut filter = CaptureFilter::any();
        let mut words = s.split_whitespace().peekable();

        while words.peek().is_some() {
            let predicate = match words.next() {
                Some("inbound") => Predicate::Direction(Direction::Incoming),
                Some("outbound") => Predicate::Direction(Direction::Outgoing),
                Some("ether") => {
                    let field = words.next().ok_or_else(|| invalid("missing ether field"))?;
                    let value = words.next().ok_or_else(|| invalid("missing value"))?;
                    match field {
                        "dst" => Predicate::EtherDst(value.parse()?),
                        "src" => Predicate::EtherSrc(value.parse()?),
                        "proto" => Predicate::EtherProto(parse_u16(value).ok_or_else(|| {
                            invalid(&format!("bad ether proto {value:?}"))
                        })?),
                        other => return Err(invalid(&format!("unknown ether field {other:?}"))),
                    }
                }
                Some(other) => return Err(invalid(&format!("unexpected {other:?}"))),
                None => break,
            };
            filter = filter.and(predicate);

            match words.next() {
                None => break,
                Some("and") if words.peek().is_some() => {}
                Some(other) => return Err(invalid(&format!("expected `and`, got {other:?}"))),
            }
        }
        Ok(filter)
    }
}

impl fmt::Display for CaptureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

fn parse_u16(value: &str) -> Option<u16> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(dst: MacAddr, src: MacAddr, ether_type: u16) -> Vec<u8> {
        let mut data = EthernetHeader {
            dst,
            src,
            ether_type,
        }
        .encode()
        .to_vec();
        data.extend_from_slice(b"\x01pl---------pg ");
        data
    }

    const HOST: MacAddr = MacAddr::new([2, 0, 0, 0, 0, 1]);

    #[test]
    fn parse_dst_filter() {
        let filter: CaptureFilter = "ether dst 00:04:00:00:00:00".parse().unwrap();
        assert_eq!(filter, CaptureFilter::ether_dst(MacAddr::PEER));
        assert_eq!(filter.to_string(), "ether dst 00:04:00:00:00:00");
    }

    #[test]
    fn parse_conjunction() {
        let filter: CaptureFilter = "ether src 02:00:00:00:00:01 and ether proto 0x1234 and inbound"
            .parse()
            .unwrap();
        assert_eq!(
            filter.predicates(),
            &[
                Predicate::EtherSrc(HOST),
                Predicate::EtherProto(0x1234),
                Predicate::Direction(Direction::Incoming),
            ]
        );
        let decimal: CaptureFilter = "ether proto 4660".parse().unwrap();
        assert_eq!(decimal.predicates(), &[Predicate::EtherProto(0x1234)]);
    }

    #[test]
    fn parse_errors() {
        for bad in [
            "ether",
            "ether dst",
            "ether dst nope",
            "ether ttl 3",
            "inbound or outbound",
            "inbound and",
            "ip host 10.0.0.1",
            "ether proto 0xzz",
        ] {
            assert!(
                bad.parse::<CaptureFilter>().is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_matches_everything() {
        let filter: CaptureFilter = "".parse().unwrap();
        assert!(filter.matches(&Captured::incoming(vec![1, 2, 3])));
        assert!(filter.matches(&Captured::outgoing(frame(HOST, HOST, 1))));
    }

    #[test]
    fn matching_by_address_proto_and_direction() {
        let to_peer = frame(MacAddr::PEER, HOST, 0x1234);
        let to_host = frame(HOST, MacAddr::PEER, 0x1234);

        let dst = CaptureFilter::ether_dst(MacAddr::PEER);
        assert!(dst.matches(&Captured::incoming(to_peer.clone())));
        assert!(!dst.matches(&Captured::incoming(to_host.clone())));

        let inbound_proto: CaptureFilter = "ether proto 0x1234 and inbound".parse().unwrap();
        assert!(inbound_proto.matches(&Captured::incoming(to_host.clone())));
        assert!(!inbound_proto.matches(&Captured::outgoing(to_host)));
        assert!(!inbound_proto.matches(&Captured::incoming(frame(HOST, HOST, 0x0800))));
    }

    #[test]
    fn runt_frames_reach_the_decoder() {
        let runt = Captured::incoming(vec![0u8; 8]);
        assert!(CaptureFilter::ether_dst(MacAddr::PEER).matches(&runt));
        assert!("inbound".parse::<CaptureFilter>().unwrap().matches(&runt));
        assert!(!"outbound".parse::<CaptureFilter>().unwrap().matches(&runt));
    }
}
