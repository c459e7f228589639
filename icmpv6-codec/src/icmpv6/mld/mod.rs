//! Multicast Listener Discovery, versions 1 (RFC 2710) and 2 (RFC 3810), and
//! Multicast Router Discovery (RFC 4286).
use std::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;

use super::{read_ipv6, Icmpv6Type};
use crate::error::{ensure_len, ensure_room, Error, Result};

mod code;
pub use code::{
    decode_max_resp_code, decode_qqic, encode_max_resp_code, encode_qqic,
    MAX_RESP_CODE_LINEAR_MAX, MAX_RESP_CODE_MAX, QQIC_LINEAR_MAX, QQIC_MAX,
};

mod record;
pub use record::{MldRecordType, MulticastGroupRecord, GROUP_RECORD_HEADER_LEN};

/// Length of the Maximum Response Code, reserved and multicast address fields.
pub const MLD_QUERY_V1_LEN: usize = 20;
/// Length of the MLDv2 query fields preceding the source list.
pub const MLD_QUERY_V2_HEADER_LEN: usize = 24;
/// Length of the reserved and record count fields of an MLDv2 report.
pub const MLD_REPORT_HEADER_LEN: usize = 4;

/// The MLDv2 extension of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MldQueryV2 {
    /// The S flag.
    pub suppress_router_processing: bool,
    /// Querier's Robustness Variable, 3 bits.
    pub robustness: u8,
    /// Querier's Query Interval in seconds.
    pub query_interval: u32,
    /// Empty unless this is a multicast-address-and-source specific query.
    pub sources: Vec<Ipv6Addr>,
}

/// Body of MLD Query, MLDv1 Report and MLDv1 Done messages.
///
/// MLDv1 reports and done messages share the query layout and never carry
/// the v2 extension.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MldQuery {
    /// Maximum response delay in milliseconds.
    pub max_response_delay: u32,
    /// Unspecified for a general query.
    pub multicast_address: Ipv6Addr,
    /// Present for an MLDv2 query.
    pub v2: Option<MldQueryV2>,
}

impl MldQuery {
    /// An MLDv1 message body.
    pub fn v1(max_response_delay: u32, multicast_address: Ipv6Addr) -> Self {
        Self {
            max_response_delay,
            multicast_address,
            v2: None,
        }
    }

    /// An MLDv2 query body.
    pub fn v2(
        max_response_delay: u32,
        multicast_address: Ipv6Addr,
        suppress_router_processing: bool,
        robustness: u8,
        query_interval: u32,
        sources: Vec<Ipv6Addr>,
    ) -> Self {
        Self {
            max_response_delay,
            multicast_address,
            v2: Some(MldQueryV2 {
                suppress_router_processing,
                robustness,
                query_interval,
                sources,
            }),
        }
    }

    /// Whether this queries every group.
    pub fn is_general(&self) -> bool {
        self.multicast_address.is_unspecified()
            && self.v2.as_ref().map_or(true, |v2| v2.sources.is_empty())
    }

    /// Decode a query-shaped body.
    ///
    /// A source list shorter than its declared count yields the sources that
    /// fit together with the truncation fault.
    pub(crate) fn decode(body: &Bytes, msg_type: Icmpv6Type) -> Result<(Self, Option<Error>)> {
        ensure_len(body, MLD_QUERY_V1_LEN)?;

        let raw_resp = NetworkEndian::read_u16(&body[0..2]);
        let multicast_address = read_ipv6(&body[4..20]);

        if msg_type != Icmpv6Type::MLD_QUERY || body.len() < MLD_QUERY_V2_HEADER_LEN {
            return Ok((Self::v1(u32::from(raw_resp), multicast_address), None));
        }

        let num_sources = usize::from(NetworkEndian::read_u16(&body[22..24]));
        let needed = MLD_QUERY_V2_HEADER_LEN + num_sources * 16;
        let fault = ensure_len(body, needed).err();
        let sources = body[MLD_QUERY_V2_HEADER_LEN..needed.min(body.len())]
            .chunks_exact(16)
            .map(read_ipv6)
            .collect();

        let query = Self {
            max_response_delay: decode_max_resp_code(raw_resp),
            multicast_address,
            v2: Some(MldQueryV2 {
                suppress_router_processing: body[20] & 0x08 != 0,
                robustness: body[20] & 0x07,
                query_interval: decode_qqic(body[21]),
                sources,
            }),
        };
        Ok((query, fault))
    }

    /// Number of bytes [`MldQuery::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        match &self.v2 {
            None => MLD_QUERY_V1_LEN,
            Some(v2) => MLD_QUERY_V2_HEADER_LEN + v2.sources.len() * 16,
        }
    }

    /// Write the body to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if let Some(v2) = &self.v2 {
            if v2.robustness > 7 {
                return Err(Error::InvalidField("robustness"));
            }
            if v2.sources.len() > usize::from(u16::MAX) {
                return Err(Error::InvalidField("sources"));
            }
        }
        let len = self.encoded_len();
        ensure_room(buf, len)?;

        let raw_resp = match self.v2 {
            None => self.max_response_delay.min(u32::from(u16::MAX)) as u16,
            Some(_) => encode_max_resp_code(self.max_response_delay),
        };
        NetworkEndian::write_u16(&mut buf[0..2], raw_resp);
        buf[2..4].fill(0);
        buf[4..20].copy_from_slice(&self.multicast_address.octets());

        if let Some(v2) = &self.v2 {
            buf[20] = v2.robustness | if v2.suppress_router_processing { 0x08 } else { 0 };
            buf[21] = encode_qqic(v2.query_interval);
            NetworkEndian::write_u16(&mut buf[22..24], v2.sources.len() as u16);
            for (chunk, source) in buf[MLD_QUERY_V2_HEADER_LEN..len]
                .chunks_exact_mut(16)
                .zip(&v2.sources)
            {
                chunk.copy_from_slice(&source.octets());
            }
        }
        Ok(len)
    }
}

impl fmt::Display for MldQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "group {} max delay {}ms",
            self.multicast_address, self.max_response_delay
        )?;
        if let Some(v2) = &self.v2 {
            write!(
                f,
                ", qrv {}, qqi {}s, {} sources",
                v2.robustness,
                v2.query_interval,
                v2.sources.len()
            )?;
            if v2.suppress_router_processing {
                f.write_str(" [S]")?;
            }
        }
        Ok(())
    }
}

/// Body of an MLDv2 Listener Report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MldReport {
    /// In wire order.
    pub groups: Vec<MulticastGroupRecord>,
}

impl MldReport {
    /// Create a report from its records.
    #[inline]
    pub fn new(groups: Vec<MulticastGroupRecord>) -> Self {
        Self { groups }
    }

    /// Decode the record count and the records that follow it.
    ///
    /// A truncated record stops the walk: the records before it are returned
    /// along with the fault.
    pub(crate) fn decode(body: &Bytes) -> Result<(Self, Option<Error>)> {
        ensure_len(body, MLD_REPORT_HEADER_LEN)?;

        let count = NetworkEndian::read_u16(&body[2..4]);
        let mut groups = Vec::new();
        let mut cursor = MLD_REPORT_HEADER_LEN;
        for _ in 0..count {
            match MulticastGroupRecord::decode(&body.slice(cursor..)) {
                Ok((record, len)) => {
                    groups.push(record);
                    cursor += len;
                }
                Err(err) => return Ok((Self { groups }, Some(err))),
            }
        }
        Ok((Self { groups }, None))
    }

    /// Number of bytes [`MldReport::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        MLD_REPORT_HEADER_LEN
            + self
                .groups
                .iter()
                .map(MulticastGroupRecord::encoded_len)
                .sum::<usize>()
    }

    /// Write the report to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let count = u16::try_from(self.groups.len()).map_err(|_| Error::InvalidField("groups"))?;
        ensure_room(buf, self.encoded_len())?;

        buf[0..2].fill(0);
        NetworkEndian::write_u16(&mut buf[2..4], count);
        let mut cursor = MLD_REPORT_HEADER_LEN;
        for record in &self.groups {
            cursor += record.encode(&mut buf[cursor..])?;
        }
        Ok(cursor)
    }
}

impl fmt::Display for MldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records", self.groups.len())?;
        for (i, record) in self.groups.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { ", " })?;
            write!(f, "[{}]", record)?;
        }
        Ok(())
    }
}

/// Length of the Multicast Router Advertisement body.
pub const MRA_LEN: usize = 4;

/// Body of a Multicast Router Advertisement. The advertisement interval
/// travels in the code field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MulticastRouterAdvertisement {
    /// In seconds.
    pub advertisement_interval: u8,
    /// In seconds.
    pub query_interval: u16,
    /// The querier's Robustness Variable.
    pub robustness: u16,
}

impl MulticastRouterAdvertisement {
    pub(crate) fn decode(body: &[u8], code: u8) -> Result<Self> {
        ensure_len(body, MRA_LEN)?;
        Ok(Self {
            advertisement_interval: code,
            query_interval: NetworkEndian::read_u16(&body[0..2]),
            robustness: NetworkEndian::read_u16(&body[2..4]),
        })
    }

    /// Always [`MRA_LEN`].
    #[inline]
    pub fn encoded_len(&self) -> usize {
        MRA_LEN
    }

    /// Write the body to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        ensure_room(buf, MRA_LEN)?;
        NetworkEndian::write_u16(&mut buf[0..2], self.query_interval);
        NetworkEndian::write_u16(&mut buf[2..4], self.robustness);
        Ok(MRA_LEN)
    }
}

impl fmt::Display for MulticastRouterAdvertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interval {}s, query interval {}s, robustness {}",
            self.advertisement_interval, self.query_interval, self.robustness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Ipv6Addr {
        "ff02::1:ff00:1".parse().unwrap()
    }

    #[test]
    fn v1_query() {
        let mut raw = vec![0x27, 0x10, 0, 0];
        raw.extend_from_slice(&group().octets());
        let (query, fault) = MldQuery::decode(&Bytes::from(raw.clone()), Icmpv6Type::MLD_QUERY).unwrap();
        assert_eq!(fault, None);
        assert_eq!(query, MldQuery::v1(10000, group()));
        assert!(!query.is_general());

        let mut buf = [0u8; 20];
        assert_eq!(query.encode(&mut buf), Ok(20));
        assert_eq!(&buf[..], &raw[..]);
    }

    #[test]
    fn v1_report_ignores_trailing_bytes() {
        let mut raw = vec![0x80, 0x00, 0, 0];
        raw.extend_from_slice(&group().octets());
        raw.extend_from_slice(&[0x0a, 0x7d, 0x00, 0x00]);
        let (query, _) = MldQuery::decode(&Bytes::from(raw), Icmpv6Type::MLD_REPORT).unwrap();
        // linear on v1 even with the top bit set
        assert_eq!(query.max_response_delay, 0x8000);
        assert_eq!(query.v2, None);
    }

    #[test]
    fn v2_query_with_sources() {
        let src: Ipv6Addr = "2001:db8::7".parse().unwrap();
        let mut raw = vec![0x80, 0x02, 0, 0];
        raw.extend_from_slice(&group().octets());
        raw.extend_from_slice(&[0x0a, 0x82, 0x00, 0x01]);
        raw.extend_from_slice(&src.octets());

        let (query, fault) = MldQuery::decode(&Bytes::from(raw.clone()), Icmpv6Type::MLD_QUERY).unwrap();
        assert_eq!(fault, None);
        assert_eq!(query, MldQuery::v2(32784, group(), true, 2, 144, vec![src]));

        let mut buf = vec![0u8; query.encoded_len()];
        assert_eq!(query.encode(&mut buf), Ok(40));
        assert_eq!(buf, raw);
    }

    #[test]
    fn v2_query_truncated_sources() {
        let src: Ipv6Addr = "2001:db8::7".parse().unwrap();
        let mut raw = vec![0x00, 0x64, 0, 0];
        raw.extend_from_slice(&[0; 16]);
        raw.extend_from_slice(&[0x02, 0x7d, 0x00, 0x03]);
        raw.extend_from_slice(&src.octets());
        raw.extend_from_slice(&[0xff; 8]);

        let (query, fault) = MldQuery::decode(&Bytes::from(raw), Icmpv6Type::MLD_QUERY).unwrap();
        assert_eq!(
            fault,
            Some(Error::Truncated {
                needed: 72,
                available: 48
            })
        );
        assert_eq!(query.max_response_delay, 100);
        let v2 = query.v2.unwrap();
        assert_eq!(v2.robustness, 2);
        assert_eq!(v2.query_interval, 125);
        assert_eq!(v2.sources, vec![src]);
    }

    #[test]
    fn query_too_short() {
        assert_eq!(
            MldQuery::decode(&Bytes::from_static(&[0u8; 19]), Icmpv6Type::MLD_QUERY),
            Err(Error::Truncated {
                needed: 20,
                available: 19
            })
        );
    }

    #[test]
    fn v2_query_encode_checks_robustness() {
        let query = MldQuery::v2(1000, Ipv6Addr::UNSPECIFIED, false, 8, 125, vec![]);
        assert!(query.is_general());
        let mut buf = [0u8; 24];
        assert_eq!(query.encode(&mut buf), Err(Error::InvalidField("robustness")));
    }

    #[test]
    fn v1_encode_clamps_delay() {
        let query = MldQuery::v1(100_000, group());
        let mut buf = [0u8; 20];
        query.encode(&mut buf).unwrap();
        assert_eq!(&buf[0..2], &[0xff, 0xff]);
    }

    #[test]
    fn report_keeps_records_before_truncation() {
        let report = MldReport::new(vec![
            MulticastGroupRecord::new(MldRecordType::MODE_IS_EXCLUDE, group(), vec![]),
            MulticastGroupRecord::new(
                MldRecordType::ALLOW_NEW_SOURCES,
                group(),
                vec!["2001:db8::1".parse().unwrap()],
            ),
        ]);
        let mut buf = vec![0u8; report.encoded_len()];
        assert_eq!(report.encode(&mut buf), Ok(4 + 20 + 36));

        let (decoded, fault) = MldReport::decode(&Bytes::from(buf.clone())).unwrap();
        assert_eq!(fault, None);
        assert_eq!(decoded, report);

        buf.truncate(50);
        let (partial, fault) = MldReport::decode(&Bytes::from(buf)).unwrap();
        assert_eq!(partial.groups, report.groups[..1].to_vec());
        assert!(matches!(fault, Some(Error::Truncated { .. })));
    }

    #[test]
    fn report_header_required() {
        assert!(MldReport::decode(&Bytes::from_static(&[0, 0, 0])).is_err());
        let (report, fault) = MldReport::decode(&Bytes::from_static(&[0, 0, 0, 0])).unwrap();
        assert!(report.groups.is_empty());
        assert_eq!(fault, None);
    }

    #[test]
    fn multicast_router_advertisement() {
        let mra = MulticastRouterAdvertisement::decode(&[0x00, 0x7d, 0x00, 0x02], 20).unwrap();
        assert_eq!(mra.advertisement_interval, 20);
        assert_eq!(mra.query_interval, 125);
        assert_eq!(mra.robustness, 2);
        assert!(MulticastRouterAdvertisement::decode(&[0x00, 0x7d, 0x00], 20).is_err());

        let mut buf = [0u8; 4];
        assert_eq!(mra.encode(&mut buf), Ok(4));
        assert_eq!(buf, [0x00, 0x7d, 0x00, 0x02]);
    }
}
