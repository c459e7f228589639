use std::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use tracing::trace;

use crate::error::{ensure_room, Error, Result};

enum_sim! {
    /// See https://www.iana.org/assignments/icmpv6-parameters
    pub struct NdpOptionType (u8) {
        SOURCE_LINK_ADDR = 1,
        TARGET_LINK_ADDR = 2,
        PREFIX_INFO = 3,
        REDIRECTED_HEADER = 4,
        MTU = 5,
        SOURCE_ADDR_LIST = 9,
        TARGET_ADDR_LIST = 10,
    }
}

/// Options are sized in units of 8 bytes.
pub const OPTION_UNIT: usize = 8;

const PREFIX_INFO_LEN: usize = 32;
const MTU_LEN: usize = 8;
const REDIRECTED_HEADER_PREFIX: usize = 8;
const ADDR_LIST_PREFIX: usize = 8;

/// Whether an address option describes the sender or the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AddressRole {
    /// Describes the sender.
    Source,
    /// Describes the target.
    Target,
}

/// Body of a Prefix Information option (RFC 4861 section 4.6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrefixInformation {
    /// Number of leading valid bits in `prefix`, at most 128.
    pub prefix_length: u8,
    /// The L flag.
    pub on_link: bool,
    /// The A flag.
    pub autonomous: bool,
    /// Seconds, `u32::MAX` for infinity.
    pub valid_lifetime: u32,
    /// Seconds, `u32::MAX` for infinity.
    pub preferred_lifetime: u32,
    /// Kept verbatim, bits past `prefix_length` included.
    pub prefix: Ipv6Addr,
}

/// A decoded Neighbor Discovery option.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NdpOption {
    /// Source/Target Link-layer Address. The address keeps any trailing
    /// padding of the option.
    LinkLayerAddress {
        /// Source or target.
        role: AddressRole,
        /// The link-layer address.
        address: Bytes,
    },
    /// Prefix Information.
    PrefixInformation(PrefixInformation),
    /// MTU of the link.
    Mtu(u32),
    /// Redirected Header: the start of the redirected packet, padded to the
    /// option size.
    RedirectedHeader(Bytes),
    /// Source/Target Address List (RFC 3122).
    AddressList {
        /// Source or target.
        role: AddressRole,
        /// The listed addresses.
        addresses: Vec<Ipv6Addr>,
    },
}

#[inline]
fn units_for(len: usize) -> usize {
    (len + OPTION_UNIT - 1) / OPTION_UNIT
}

impl NdpOption {
    /// A Source Link-layer Address option.
    #[inline]
    pub fn source_link_addr(address: impl Into<Bytes>) -> Self {
        Self::LinkLayerAddress {
            role: AddressRole::Source,
            address: address.into(),
        }
    }

    /// A Target Link-layer Address option.
    #[inline]
    pub fn target_link_addr(address: impl Into<Bytes>) -> Self {
        Self::LinkLayerAddress {
            role: AddressRole::Target,
            address: address.into(),
        }
    }

    /// The option type written on the wire.
    pub fn option_type(&self) -> NdpOptionType {
        match self {
            Self::LinkLayerAddress {
                role: AddressRole::Source,
                ..
            } => NdpOptionType::SOURCE_LINK_ADDR,
            Self::LinkLayerAddress {
                role: AddressRole::Target,
                ..
            } => NdpOptionType::TARGET_LINK_ADDR,
            Self::PrefixInformation(_) => NdpOptionType::PREFIX_INFO,
            Self::Mtu(_) => NdpOptionType::MTU,
            Self::RedirectedHeader(_) => NdpOptionType::REDIRECTED_HEADER,
            Self::AddressList {
                role: AddressRole::Source,
                ..
            } => NdpOptionType::SOURCE_ADDR_LIST,
            Self::AddressList {
                role: AddressRole::Target,
                ..
            } => NdpOptionType::TARGET_ADDR_LIST,
        }
    }

    /// Decode one option from `buf`, which holds exactly the option bytes.
    ///
    /// Returns `Ok(None)` for option types this codec does not know.
    pub(crate) fn decode(buf: &Bytes) -> Result<Option<Self>> {
        let opt_type = NdpOptionType::from(buf[0]);
        let opt_len = buf.len();

        let opt = match opt_type {
            NdpOptionType::SOURCE_LINK_ADDR => Self::source_link_addr(buf.slice(2..)),
            NdpOptionType::TARGET_LINK_ADDR => Self::target_link_addr(buf.slice(2..)),
            NdpOptionType::PREFIX_INFO => {
                if opt_len != PREFIX_INFO_LEN || buf[2] > 128 {
                    return Err(Error::InvalidField("prefix_information"));
                }
                let mut prefix = [0; 16];
                prefix.copy_from_slice(&buf[16..32]);
                Self::PrefixInformation(PrefixInformation {
                    prefix_length: buf[2],
                    on_link: buf[3] & 0x80 != 0,
                    autonomous: buf[3] & 0x40 != 0,
                    valid_lifetime: NetworkEndian::read_u32(&buf[4..8]),
                    preferred_lifetime: NetworkEndian::read_u32(&buf[8..12]),
                    prefix: Ipv6Addr::from(prefix),
                })
            }
            NdpOptionType::REDIRECTED_HEADER => {
                Self::RedirectedHeader(buf.slice(REDIRECTED_HEADER_PREFIX..))
            }
            NdpOptionType::MTU => Self::Mtu(NetworkEndian::read_u32(&buf[4..8])),
            NdpOptionType::SOURCE_ADDR_LIST | NdpOptionType::TARGET_ADDR_LIST => {
                let list = &buf[ADDR_LIST_PREFIX..];
                if list.len() % 16 != 0 {
                    return Err(Error::InvalidField("address_list"));
                }
                let addresses = list
                    .chunks_exact(16)
                    .map(|chunk| {
                        let mut addr = [0; 16];
                        addr.copy_from_slice(chunk);
                        Ipv6Addr::from(addr)
                    })
                    .collect();
                let role = if opt_type == NdpOptionType::SOURCE_ADDR_LIST {
                    AddressRole::Source
                } else {
                    AddressRole::Target
                };
                Self::AddressList { role, addresses }
            }
            _ => return Ok(None),
        };

        Ok(Some(opt))
    }

    /// Number of bytes the option occupies, padding included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::LinkLayerAddress { address, .. } => units_for(2 + address.len()) * OPTION_UNIT,
            Self::PrefixInformation(_) => PREFIX_INFO_LEN,
            Self::Mtu(_) => MTU_LEN,
            Self::RedirectedHeader(data) => {
                units_for(REDIRECTED_HEADER_PREFIX + data.len()) * OPTION_UNIT
            }
            Self::AddressList { addresses, .. } => ADDR_LIST_PREFIX + 16 * addresses.len(),
        }
    }

    /// Write the option, computing its own length field.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        if len / OPTION_UNIT > usize::from(u8::MAX) {
            return Err(Error::InvalidField("option_length"));
        }
        ensure_room(buf, len)?;

        let buf = &mut buf[..len];
        buf.fill(0);
        buf[0] = self.option_type().raw();
        buf[1] = (len / OPTION_UNIT) as u8;

        match self {
            Self::LinkLayerAddress { address, .. } => {
                buf[2..2 + address.len()].copy_from_slice(address);
            }
            Self::PrefixInformation(info) => {
                if info.prefix_length > 128 {
                    return Err(Error::InvalidField("prefix_length"));
                }
                buf[2] = info.prefix_length;
                if info.on_link {
                    buf[3] |= 0x80;
                }
                if info.autonomous {
                    buf[3] |= 0x40;
                }
                NetworkEndian::write_u32(&mut buf[4..8], info.valid_lifetime);
                NetworkEndian::write_u32(&mut buf[8..12], info.preferred_lifetime);
                buf[16..32].copy_from_slice(&info.prefix.octets());
            }
            Self::Mtu(mtu) => {
                NetworkEndian::write_u32(&mut buf[4..8], *mtu);
            }
            Self::RedirectedHeader(data) => {
                let end = REDIRECTED_HEADER_PREFIX + data.len();
                buf[REDIRECTED_HEADER_PREFIX..end].copy_from_slice(data);
            }
            Self::AddressList { addresses, .. } => {
                for (chunk, addr) in buf[ADDR_LIST_PREFIX..]
                    .chunks_exact_mut(16)
                    .zip(addresses.iter())
                {
                    chunk.copy_from_slice(&addr.octets());
                }
            }
        }

        Ok(len)
    }
}

impl fmt::Display for NdpOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkLayerAddress { role, address } => {
                write!(f, "{:?} link-layer address ", role)?;
                for (i, byte) in address.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Self::PrefixInformation(info) => write!(
                f,
                "prefix {}/{}{}{} valid={} preferred={}",
                info.prefix,
                info.prefix_length,
                if info.on_link { " [L]" } else { "" },
                if info.autonomous { " [A]" } else { "" },
                info.valid_lifetime,
                info.preferred_lifetime
            ),
            Self::Mtu(mtu) => write!(f, "mtu {}", mtu),
            Self::RedirectedHeader(data) => write!(f, "redirected header len={}", data.len()),
            Self::AddressList { role, addresses } => {
                write!(f, "{:?} address list", role)?;
                for addr in addresses {
                    write!(f, " {}", addr)?;
                }
                Ok(())
            }
        }
    }
}

/// Iterate over the options of an NDP option chain.
///
/// The walk is a loop over a cursor into the option bytes. A zero or
/// overflowing length, or an option whose body cannot be decoded, stops the
/// iteration and records a fault; options of unknown type are skipped.
#[derive(Debug)]
pub struct NdpOptionIter<'a> {
    buf: &'a Bytes,
    cursor: usize,
    fault: Option<Error>,
}

impl<'a> NdpOptionIter<'a> {
    /// Walk `buf`, which holds the option chain and nothing else.
    #[inline]
    pub fn from_option_bytes(buf: &'a Bytes) -> NdpOptionIter<'a> {
        Self {
            buf,
            cursor: 0,
            fault: None,
        }
    }

    /// The fault that stopped the iteration, if any.
    #[inline]
    pub fn fault(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    /// Consume the iterator, returning its fault.
    #[inline]
    pub fn into_fault(self) -> Option<Error> {
        self.fault
    }

    fn stop(&mut self, reason: &'static str) {
        trace!(offset = self.cursor, reason, "ndp option chain malformed");
        self.fault = Some(Error::MalformedOptionChain {
            offset: self.cursor,
        });
    }
}

impl<'a> Iterator for NdpOptionIter<'a> {
    type Item = NdpOption;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.fault.is_some() || self.cursor >= self.buf.len() {
                return None;
            }

            let remaining = self.buf.len() - self.cursor;
            if remaining < 2 {
                self.stop("dangling option header");
                return None;
            }

            let opt_type = self.buf[self.cursor];
            let opt_len = usize::from(self.buf[self.cursor + 1]) * OPTION_UNIT;
            if opt_len == 0 || opt_len > remaining {
                self.stop("bad option length");
                return None;
            }

            let opt_buf = self.buf.slice(self.cursor..self.cursor + opt_len);
            match NdpOption::decode(&opt_buf) {
                Ok(Some(opt)) => {
                    self.cursor += opt_len;
                    return Some(opt);
                }
                Ok(None) => {
                    trace!(option_type = opt_type, offset = self.cursor, "skipping unknown ndp option");
                    self.cursor += opt_len;
                }
                Err(_) => {
                    self.stop("undecodable option body");
                    return None;
                }
            }
        }
    }
}

/// Decode a whole option chain, keeping the options read before a fault.
pub fn decode_options(buf: &Bytes) -> (Vec<NdpOption>, Option<Error>) {
    let mut iter = NdpOptionIter::from_option_bytes(buf);
    let options = (&mut iter).collect();
    (options, iter.into_fault())
}

/// Total encoded length of an option list.
pub fn options_len(options: &[NdpOption]) -> usize {
    options.iter().map(NdpOption::encoded_len).sum()
}

/// Write the options in list order.
pub fn encode_options(options: &[NdpOption], buf: &mut [u8]) -> Result<usize> {
    let mut cursor = 0;
    for opt in options {
        cursor += opt.encode(&mut buf[cursor..])?;
    }
    Ok(cursor)
}
