//! Neighbor Discovery (RFC 4861) and Inverse Neighbor Discovery (RFC 3122).
use std::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;

use super::{read_ipv6, Icmpv6Type};
use crate::error::{ensure_len, ensure_room, Error, Result};

mod option;
pub use option::{
    decode_options, encode_options, options_len, AddressRole, NdpOption, NdpOptionIter,
    NdpOptionType, PrefixInformation, OPTION_UNIT,
};

/// Bits of the Router Advertisement flags byte other than M and O.
pub const RA_OTHER_FLAGS_MASK: u8 = 0x3f;

/// Fixed fields of a Router Advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouterAdvertisement {
    /// Hop limit hosts should use, 0 if unspecified.
    pub cur_hop_limit: u8,
    /// The M flag.
    pub managed: bool,
    /// The O flag.
    pub other_config: bool,
    /// The remaining flag bits (H, Prf and reserved), in their wire position.
    /// Bits outside [`RA_OTHER_FLAGS_MASK`] are ignored on encode.
    pub flags: u8,
    /// Seconds, 0 if the sender is not a default router.
    pub router_lifetime: u16,
    /// Milliseconds.
    pub reachable_time: u32,
    /// Milliseconds.
    pub retrans_timer: u32,
}

/// Fixed fields of a Neighbor Solicitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NeighborSolicitation {
    /// The address being resolved.
    pub target: Ipv6Addr,
}

/// Fixed fields of a Neighbor Advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NeighborAdvertisement {
    /// The R flag.
    pub router: bool,
    /// The S flag.
    pub solicited: bool,
    /// The O flag.
    pub override_flag: bool,
    /// The address whose link-layer address is advertised.
    pub target: Ipv6Addr,
}

/// Fixed fields of a Redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Redirect {
    /// The better first hop.
    pub target: Ipv6Addr,
    /// The destination being redirected.
    pub destination: Ipv6Addr,
}

/// The fixed part of an NDP message, one variant per message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NdpMessage {
    /// Type 133.
    RouterSolicitation,
    /// Type 134.
    RouterAdvertisement(RouterAdvertisement),
    /// Type 135.
    NeighborSolicitation(NeighborSolicitation),
    /// Type 136.
    NeighborAdvertisement(NeighborAdvertisement),
    /// Type 137.
    Redirect(Redirect),
    /// Type 141.
    InverseSolicitation,
    /// Type 142.
    InverseAdvertisement,
}

impl NdpMessage {
    /// The message type carrying this variant.
    pub fn msg_type(&self) -> Icmpv6Type {
        match self {
            Self::RouterSolicitation => Icmpv6Type::ROUTER_SOLICITATION,
            Self::RouterAdvertisement(_) => Icmpv6Type::ROUTER_ADVERTISEMENT,
            Self::NeighborSolicitation(_) => Icmpv6Type::NEIGHBOR_SOLICITATION,
            Self::NeighborAdvertisement(_) => Icmpv6Type::NEIGHBOR_ADVERTISEMENT,
            Self::Redirect(_) => Icmpv6Type::REDIRECT,
            Self::InverseSolicitation => Icmpv6Type::INVERSE_NEIGHBOR_SOLICITATION,
            Self::InverseAdvertisement => Icmpv6Type::INVERSE_NEIGHBOR_ADVERTISEMENT,
        }
    }

    /// Length of the fixed fields preceding the option chain, counted from
    /// the end of the 4-byte ICMPv6 header.
    pub fn fixed_len(&self) -> usize {
        Self::fixed_len_of(self.msg_type()).unwrap_or(4)
    }

    /// Like [`NdpMessage::fixed_len`], `None` for non-NDP types.
    pub fn fixed_len_of(msg_type: Icmpv6Type) -> Option<usize> {
        match msg_type {
            Icmpv6Type::ROUTER_SOLICITATION
            | Icmpv6Type::INVERSE_NEIGHBOR_SOLICITATION
            | Icmpv6Type::INVERSE_NEIGHBOR_ADVERTISEMENT => Some(4),
            Icmpv6Type::ROUTER_ADVERTISEMENT => Some(12),
            Icmpv6Type::NEIGHBOR_SOLICITATION | Icmpv6Type::NEIGHBOR_ADVERTISEMENT => Some(20),
            Icmpv6Type::REDIRECT => Some(36),
            _ => None,
        }
    }

    fn decode(buf: &[u8], msg_type: Icmpv6Type) -> Result<Self> {
        let fixed_len = Self::fixed_len_of(msg_type).ok_or(Error::PayloadMismatch {
            msg_type: msg_type.raw(),
            code: 0,
        })?;
        ensure_len(buf, fixed_len)?;

        let msg = match msg_type {
            Icmpv6Type::ROUTER_SOLICITATION => Self::RouterSolicitation,
            Icmpv6Type::INVERSE_NEIGHBOR_SOLICITATION => Self::InverseSolicitation,
            Icmpv6Type::INVERSE_NEIGHBOR_ADVERTISEMENT => Self::InverseAdvertisement,
            Icmpv6Type::ROUTER_ADVERTISEMENT => Self::RouterAdvertisement(RouterAdvertisement {
                cur_hop_limit: buf[0],
                managed: buf[1] & 0x80 != 0,
                other_config: buf[1] & 0x40 != 0,
                flags: buf[1] & RA_OTHER_FLAGS_MASK,
                router_lifetime: NetworkEndian::read_u16(&buf[2..4]),
                reachable_time: NetworkEndian::read_u32(&buf[4..8]),
                retrans_timer: NetworkEndian::read_u32(&buf[8..12]),
            }),
            Icmpv6Type::NEIGHBOR_SOLICITATION => Self::NeighborSolicitation(NeighborSolicitation {
                target: read_ipv6(&buf[4..20]),
            }),
            Icmpv6Type::NEIGHBOR_ADVERTISEMENT => {
                Self::NeighborAdvertisement(NeighborAdvertisement {
                    router: buf[0] & 0x80 != 0,
                    solicited: buf[0] & 0x40 != 0,
                    override_flag: buf[0] & 0x20 != 0,
                    target: read_ipv6(&buf[4..20]),
                })
            }
            _ => Self::Redirect(Redirect {
                target: read_ipv6(&buf[4..20]),
                destination: read_ipv6(&buf[20..36]),
            }),
        };

        Ok(msg)
    }

    // `buf` is exactly `fixed_len()` bytes and already zeroed.
    fn encode(&self, buf: &mut [u8]) {
        match self {
            Self::RouterSolicitation | Self::InverseSolicitation | Self::InverseAdvertisement => {}
            Self::RouterAdvertisement(ra) => {
                buf[0] = ra.cur_hop_limit;
                buf[1] = ra.flags & RA_OTHER_FLAGS_MASK;
                if ra.managed {
                    buf[1] |= 0x80;
                }
                if ra.other_config {
                    buf[1] |= 0x40;
                }
                NetworkEndian::write_u16(&mut buf[2..4], ra.router_lifetime);
                NetworkEndian::write_u32(&mut buf[4..8], ra.reachable_time);
                NetworkEndian::write_u32(&mut buf[8..12], ra.retrans_timer);
            }
            Self::NeighborSolicitation(ns) => {
                buf[4..20].copy_from_slice(&ns.target.octets());
            }
            Self::NeighborAdvertisement(na) => {
                if na.router {
                    buf[0] |= 0x80;
                }
                if na.solicited {
                    buf[0] |= 0x40;
                }
                if na.override_flag {
                    buf[0] |= 0x20;
                }
                buf[4..20].copy_from_slice(&na.target.octets());
            }
            Self::Redirect(redirect) => {
                buf[4..20].copy_from_slice(&redirect.target.octets());
                buf[20..36].copy_from_slice(&redirect.destination.octets());
            }
        }
    }
}

/// Body of an NDP message: its fixed fields plus the option chain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NdpPayload {
    /// The fixed fields.
    pub message: NdpMessage,
    /// In wire order.
    pub options: Vec<NdpOption>,
}

impl NdpPayload {
    /// Create a payload from its fixed fields and options.
    #[inline]
    pub fn new(message: NdpMessage, options: Vec<NdpOption>) -> Self {
        Self { message, options }
    }

    /// Decode the fixed fields and the option chain.
    ///
    /// Missing fixed fields fail the decode. A broken option chain does not:
    /// the options read before the fault are returned along with it.
    pub(crate) fn decode(body: &Bytes, msg_type: Icmpv6Type) -> Result<(Self, Option<Error>)> {
        let message = NdpMessage::decode(body, msg_type)?;
        let (options, fault) = decode_options(&body.slice(message.fixed_len()..));
        Ok((Self { message, options }, fault))
    }

    /// The first link-layer address option with the given role.
    pub fn link_layer_address(&self, role: AddressRole) -> Option<&[u8]> {
        self.options.iter().find_map(|opt| match opt {
            NdpOption::LinkLayerAddress { role: r, address } if *r == role => Some(&address[..]),
            _ => None,
        })
    }

    /// Number of bytes [`NdpPayload::encode`] writes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.message.fixed_len() + options_len(&self.options)
    }

    /// Write the fixed fields and the option chain, returning the length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let fixed_len = self.message.fixed_len();
        ensure_room(buf, self.encoded_len())?;

        let (fixed, rest) = buf.split_at_mut(fixed_len);
        fixed.fill(0);
        self.message.encode(fixed);
        let opts_len = encode_options(&self.options, rest)?;
        Ok(fixed_len + opts_len)
    }
}

impl fmt::Display for NdpPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            NdpMessage::RouterSolicitation => f.write_str("router solicitation")?,
            NdpMessage::InverseSolicitation => f.write_str("inverse solicitation")?,
            NdpMessage::InverseAdvertisement => f.write_str("inverse advertisement")?,
            NdpMessage::RouterAdvertisement(ra) => {
                write!(f, "hop limit {}", ra.cur_hop_limit)?;
                if ra.managed {
                    f.write_str(" [M]")?;
                }
                if ra.other_config {
                    f.write_str(" [O]")?;
                }
                write!(
                    f,
                    ", router lifetime {}s, reachable {}ms, retrans {}ms",
                    ra.router_lifetime, ra.reachable_time, ra.retrans_timer
                )?;
            }
            NdpMessage::NeighborSolicitation(ns) => write!(f, "target {}", ns.target)?,
            NdpMessage::NeighborAdvertisement(na) => {
                write!(f, "target {}", na.target)?;
                if na.router {
                    f.write_str(" [R]")?;
                }
                if na.solicited {
                    f.write_str(" [S]")?;
                }
                if na.override_flag {
                    f.write_str(" [O]")?;
                }
            }
            NdpMessage::Redirect(redirect) => write!(
                f,
                "target {}, destination {}",
                redirect.target, redirect.destination
            )?,
        }
        for (i, opt) in self.options.iter().enumerate() {
            f.write_str(if i == 0 { "; options: " } else { ", " })?;
            write!(f, "[{}]", opt)?;
        }
        Ok(())
    }
}
