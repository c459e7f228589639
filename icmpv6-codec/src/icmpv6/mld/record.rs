use std::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;

use crate::error::{ensure_len, ensure_room, Error, Result};
use crate::icmpv6::read_ipv6;

enum_sim! {
    /// See RFC 3810 §5.2.12
    pub struct MldRecordType (u8) {
        MODE_IS_INCLUDE = 1,
        MODE_IS_EXCLUDE = 2,
        CHANGE_TO_INCLUDE_MODE = 3,
        CHANGE_TO_EXCLUDE_MODE = 4,
        ALLOW_NEW_SOURCES = 5,
        BLOCK_OLD_SOURCES = 6,
    }
}

/// Length of the record type, aux length, source count and multicast address.
pub const GROUP_RECORD_HEADER_LEN: usize = 20;

const AUX_UNIT: usize = 4;

/// One multicast address record of an MLDv2 report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MulticastGroupRecord {
    /// What the record reports.
    pub record_type: MldRecordType,
    /// The group this record is about.
    pub multicast_address: Ipv6Addr,
    /// Source addresses, as many as the count field says.
    pub sources: Vec<Ipv6Addr>,
    /// Auxiliary data, kept opaque. Its length is a multiple of 4.
    pub aux_data: Bytes,
}

impl MulticastGroupRecord {
    /// A record without auxiliary data.
    pub fn new(record_type: MldRecordType, multicast_address: Ipv6Addr, sources: Vec<Ipv6Addr>) -> Self {
        Self {
            record_type,
            multicast_address,
            sources,
            aux_data: Bytes::new(),
        }
    }

    /// Decode the record at the start of `buf`, returning it together with
    /// the number of bytes it occupies.
    pub(crate) fn decode(buf: &Bytes) -> Result<(Self, usize)> {
        ensure_len(buf, GROUP_RECORD_HEADER_LEN)?;

        let record_type = MldRecordType::from(buf[0]);
        let aux_len = usize::from(buf[1]) * AUX_UNIT;
        let num_sources = usize::from(NetworkEndian::read_u16(&buf[2..4]));
        let multicast_address = read_ipv6(&buf[4..20]);

        let sources_end = GROUP_RECORD_HEADER_LEN + num_sources * 16;
        ensure_len(buf, sources_end)?;
        let sources = buf[GROUP_RECORD_HEADER_LEN..sources_end]
            .chunks_exact(16)
            .map(read_ipv6)
            .collect();

        let record_end = sources_end + aux_len;
        ensure_len(buf, record_end)?;

        Ok((
            Self {
                record_type,
                multicast_address,
                sources,
                aux_data: buf.slice(sources_end..record_end),
            },
            record_end,
        ))
    }

    /// Number of bytes [`MulticastGroupRecord::encode`] writes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        GROUP_RECORD_HEADER_LEN + self.sources.len() * 16 + self.aux_data.len()
    }

    /// Write the record to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let num_sources =
            u16::try_from(self.sources.len()).map_err(|_| Error::InvalidField("sources"))?;
        if self.aux_data.len() % AUX_UNIT != 0 || self.aux_data.len() / AUX_UNIT > 255 {
            return Err(Error::InvalidField("aux_data"));
        }
        let len = self.encoded_len();
        ensure_room(buf, len)?;

        buf[0] = self.record_type.raw();
        buf[1] = (self.aux_data.len() / AUX_UNIT) as u8;
        NetworkEndian::write_u16(&mut buf[2..4], num_sources);
        buf[4..20].copy_from_slice(&self.multicast_address.octets());
        let mut cursor = GROUP_RECORD_HEADER_LEN;
        for source in &self.sources {
            buf[cursor..cursor + 16].copy_from_slice(&source.octets());
            cursor += 16;
        }
        buf[cursor..len].copy_from_slice(&self.aux_data);
        Ok(len)
    }
}

impl fmt::Display for MulticastGroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record_type, self.multicast_address)?;
        if !self.sources.is_empty() {
            f.write_str(" sources [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", source)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(record_type: u8, aux_words: u8, sources: &[Ipv6Addr], aux: &[u8]) -> Vec<u8> {
        let mut raw = vec![record_type, aux_words];
        raw.extend_from_slice(&(sources.len() as u16).to_be_bytes());
        raw.extend_from_slice(&"ff02::fb".parse::<Ipv6Addr>().unwrap().octets());
        for source in sources {
            raw.extend_from_slice(&source.octets());
        }
        raw.extend_from_slice(aux);
        raw
    }

    #[test]
    fn decode_record_with_sources() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let raw = Bytes::from(record_bytes(4, 0, &[src], &[]));
        let (record, len) = MulticastGroupRecord::decode(&raw).unwrap();
        assert_eq!(len, 36);
        assert_eq!(record.record_type, MldRecordType::CHANGE_TO_EXCLUDE_MODE);
        assert_eq!(record.multicast_address, "ff02::fb".parse::<Ipv6Addr>().unwrap());
        assert_eq!(record.sources, vec![src]);
        assert!(record.aux_data.is_empty());
    }

    #[test]
    fn aux_data_is_kept() {
        let raw = Bytes::from(record_bytes(1, 2, &[], &[1, 2, 3, 4, 5, 6, 7, 8]));
        let (record, len) = MulticastGroupRecord::decode(&raw).unwrap();
        assert_eq!(len, 28);
        assert_eq!(&record.aux_data[..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut buf = vec![0u8; record.encoded_len()];
        assert_eq!(record.encode(&mut buf), Ok(28));
        assert_eq!(&buf[..], &raw[..]);
    }

    #[test]
    fn truncation_is_reported() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let raw = record_bytes(5, 0, &[src, src], &[]);

        // short header
        assert!(matches!(
            MulticastGroupRecord::decode(&Bytes::copy_from_slice(&raw[..19])),
            Err(Error::Truncated { needed: 20, .. })
        ));
        // declared sources missing
        assert_eq!(
            MulticastGroupRecord::decode(&Bytes::copy_from_slice(&raw[..40])),
            Err(Error::Truncated {
                needed: 52,
                available: 40
            })
        );

        // aux data missing
        let raw = record_bytes(1, 1, &[], &[0, 0]);
        assert_eq!(
            MulticastGroupRecord::decode(&Bytes::from(raw)),
            Err(Error::Truncated {
                needed: 24,
                available: 22
            })
        );
    }

    #[test]
    fn encode_rejects_unaligned_aux_data() {
        let mut record = MulticastGroupRecord::new(
            MldRecordType::MODE_IS_INCLUDE,
            "ff02::1:3".parse().unwrap(),
            vec![],
        );
        record.aux_data = Bytes::from_static(&[1, 2, 3]);
        let mut buf = [0u8; 64];
        assert_eq!(record.encode(&mut buf), Err(Error::InvalidField("aux_data")));
    }
}
