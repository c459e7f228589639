use std::fmt;
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use super::mld::{MldQuery, MldReport, MulticastGroupRecord};
use super::ndp::{NdpMessage, NdpOption, NdpPayload, NeighborAdvertisement, NeighborSolicitation};
use super::{DecodedPayload, EchoPayload, ErrorPayload, Icmpv6Type, Payload, ICMPV6_HEADER_LEN};
use crate::checksum_utils::{self, CHECKSUM_OFFSET};
use crate::error::{ensure_room, Error, Result};

#[derive(Debug, Clone)]
enum Body {
    /// Read from the wire. The payload is decoded on first access.
    Received {
        raw: Bytes,
        checksum: u16,
        checksum_ok: bool,
        payload: OnceCell<DecodedPayload>,
    },
    /// Built locally for transmission.
    Built(Option<Payload>),
    /// Shorter than the 4-byte header.
    Short(Bytes),
}

/// An ICMPv6 message together with the addresses of its IPv6 packet.
///
/// The addresses are not part of the message bytes; they feed the checksum
/// pseudo-header.
#[derive(Debug, Clone)]
pub struct Icmpv6Message {
    source: Ipv6Addr,
    destination: Ipv6Addr,
    msg_type: Icmpv6Type,
    code: u8,
    body: Body,
}

impl Icmpv6Message {
    /// Decode a message received from `source` for `destination`.
    ///
    /// This never fails. A buffer shorter than 4 bytes gives a message of
    /// type [`Icmpv6Type::INVALID`]; otherwise the header is read and the
    /// checksum checked right away, while the payload waits for the first
    /// call to [`Icmpv6Message::payload`].
    #[inline]
    pub fn decode(buf: &[u8], source: Ipv6Addr, destination: Ipv6Addr) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(buf), source, destination)
    }

    /// Like [`Icmpv6Message::decode`], without copying `raw`.
    pub fn from_bytes(raw: Bytes, source: Ipv6Addr, destination: Ipv6Addr) -> Self {
        if raw.len() < ICMPV6_HEADER_LEN {
            trace!(len = raw.len(), "icmpv6 message shorter than its header");
            return Self {
                source,
                destination,
                msg_type: Icmpv6Type::INVALID,
                code: 0,
                body: Body::Short(raw),
            };
        }

        let msg_type = Icmpv6Type::from(raw[0]);
        let code = raw[1];
        let checksum = NetworkEndian::read_u16(&raw[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2]);
        let checksum_ok = checksum_utils::validate(&raw, &source, &destination);
        if !checksum_ok {
            debug!(
                msg_type = msg_type.raw(),
                code,
                checksum,
                %source,
                %destination,
                "icmpv6 checksum mismatch"
            );
        }

        Self {
            source,
            destination,
            msg_type,
            code,
            body: Body::Received {
                raw,
                checksum,
                checksum_ok,
                payload: OnceCell::new(),
            },
        }
    }

    /// Build a message for transmission.
    ///
    /// Fails with [`Error::PayloadMismatch`] if `payload` cannot travel with
    /// `msg_type` and `code`.
    pub fn new(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        msg_type: Icmpv6Type,
        code: u8,
        payload: Option<Payload>,
    ) -> Result<Self> {
        if let Some(payload) = &payload {
            payload.check_header(msg_type, code)?;
        }
        Ok(Self::built(source, destination, msg_type, code, payload))
    }

    // The caller guarantees the header agrees with the payload.
    fn built(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        msg_type: Icmpv6Type,
        code: u8,
        payload: Option<Payload>,
    ) -> Self {
        Self {
            source,
            destination,
            msg_type,
            code,
            body: Body::Built(payload),
        }
    }

    /// An Echo Request.
    pub fn echo_request(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        identifier: u16,
        sequence: u16,
        data: impl Into<Bytes>,
    ) -> Self {
        let echo = EchoPayload::new(identifier, sequence, data);
        Self::built(source, destination, Icmpv6Type::ECHO_REQUEST, 0, Some(Payload::Echo(echo)))
    }

    /// An Echo Reply.
    pub fn echo_reply(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        identifier: u16,
        sequence: u16,
        data: impl Into<Bytes>,
    ) -> Self {
        let echo = EchoPayload::new(identifier, sequence, data);
        Self::built(source, destination, Icmpv6Type::ECHO_REPLY, 0, Some(Payload::Echo(echo)))
    }

    /// An error message whose type and code come from the payload's reason.
    pub fn error(source: Ipv6Addr, destination: Ipv6Addr, error: ErrorPayload) -> Self {
        let msg_type = error.reason.msg_type();
        let code = error.reason.code();
        Self::built(source, destination, msg_type, code, Some(Payload::Error(error)))
    }

    /// A Router Solicitation carrying `options`.
    pub fn router_solicitation(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        options: Vec<NdpOption>,
    ) -> Self {
        Self::ndp(source, destination, NdpMessage::RouterSolicitation, options)
    }

    /// A solicitation for `target`, carrying our link-layer address.
    pub fn neighbor_solicitation(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        target: Ipv6Addr,
        source_link_addr: impl Into<Bytes>,
    ) -> Self {
        Self::ndp(
            source,
            destination,
            NdpMessage::NeighborSolicitation(NeighborSolicitation { target }),
            vec![NdpOption::source_link_addr(source_link_addr)],
        )
    }

    /// An advertisement of `source`, carrying our link-layer address.
    pub fn neighbor_advertisement(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        target_link_addr: impl Into<Bytes>,
        solicited: bool,
        router: bool,
        override_flag: bool,
    ) -> Self {
        Self::ndp(
            source,
            destination,
            NdpMessage::NeighborAdvertisement(NeighborAdvertisement {
                router,
                solicited,
                override_flag,
                target: source,
            }),
            vec![NdpOption::target_link_addr(target_link_addr)],
        )
    }

    /// Ask for the IPv6 addresses of the node owning `target_link_addr`.
    pub fn inverse_neighbor_solicitation(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        source_link_addr: impl Into<Bytes>,
        target_link_addr: impl Into<Bytes>,
    ) -> Self {
        Self::ndp(
            source,
            destination,
            NdpMessage::InverseSolicitation,
            vec![
                NdpOption::source_link_addr(source_link_addr),
                NdpOption::target_link_addr(target_link_addr),
            ],
        )
    }

    fn ndp(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        message: NdpMessage,
        options: Vec<NdpOption>,
    ) -> Self {
        let msg_type = message.msg_type();
        let payload = Payload::Ndp(NdpPayload::new(message, options));
        Self::built(source, destination, msg_type, 0, Some(payload))
    }

    /// An MLDv2 query for every group.
    pub fn mld_general_query(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        max_response_delay: u32,
        query_interval: u32,
        robustness: u8,
        suppress_router_processing: bool,
    ) -> Self {
        Self::mld_source_query(
            source,
            destination,
            Ipv6Addr::UNSPECIFIED,
            Vec::new(),
            max_response_delay,
            query_interval,
            robustness,
            suppress_router_processing,
        )
    }

    /// An MLDv2 query for one group.
    #[allow(clippy::too_many_arguments)]
    pub fn mld_multicast_query(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        multicast_address: Ipv6Addr,
        max_response_delay: u32,
        query_interval: u32,
        robustness: u8,
        suppress_router_processing: bool,
    ) -> Self {
        Self::mld_source_query(
            source,
            destination,
            multicast_address,
            Vec::new(),
            max_response_delay,
            query_interval,
            robustness,
            suppress_router_processing,
        )
    }

    /// An MLDv2 query for one group, restricted to `sources`.
    #[allow(clippy::too_many_arguments)]
    pub fn mld_source_query(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        multicast_address: Ipv6Addr,
        sources: Vec<Ipv6Addr>,
        max_response_delay: u32,
        query_interval: u32,
        robustness: u8,
        suppress_router_processing: bool,
    ) -> Self {
        let query = MldQuery::v2(
            max_response_delay,
            multicast_address,
            suppress_router_processing,
            robustness,
            query_interval,
            sources,
        );
        Self::built(source, destination, Icmpv6Type::MLD_QUERY, 0, Some(Payload::MldQuery(query)))
    }

    /// An MLDv2 report.
    pub fn mld_report(
        source: Ipv6Addr,
        destination: Ipv6Addr,
        groups: Vec<MulticastGroupRecord>,
    ) -> Self {
        let report = MldReport::new(groups);
        Self::built(source, destination, Icmpv6Type::MLDV2_REPORT, 0, Some(Payload::MldReport(report)))
    }

    /// Source address of the IPv6 packet.
    #[inline]
    pub fn source(&self) -> Ipv6Addr {
        self.source
    }

    /// Destination address of the IPv6 packet.
    #[inline]
    pub fn destination(&self) -> Ipv6Addr {
        self.destination
    }

    /// The type byte, [`Icmpv6Type::INVALID`] for a buffer shorter than
    /// the header.
    #[inline]
    pub fn msg_type(&self) -> Icmpv6Type {
        self.msg_type
    }

    /// The code byte.
    #[inline]
    pub fn code(&self) -> u8 {
        self.code
    }

    /// The checksum read from the wire. Built messages have theirs computed
    /// by [`Icmpv6Message::encode`].
    #[inline]
    pub fn checksum(&self) -> Option<u16> {
        match &self.body {
            Body::Received { checksum, .. } => Some(*checksum),
            _ => None,
        }
    }

    /// Whether the message has a type and a correct checksum.
    ///
    /// This says nothing about the payload; see [`Icmpv6Message::payload`].
    /// Always agrees with [`Icmpv6Message::validate`].
    pub fn is_valid(&self) -> bool {
        match &self.body {
            Body::Received { checksum_ok, .. } => {
                self.msg_type != Icmpv6Type::INVALID && *checksum_ok
            }
            Body::Built(_) => true,
            Body::Short(_) => false,
        }
    }

    /// Like [`Icmpv6Message::is_valid`], telling why the message is not.
    ///
    /// A checksum failure is reported before a type of 0, which gives
    /// [`Error::InvalidField`].
    pub fn validate(&self) -> Result<()> {
        match &self.body {
            Body::Short(raw) => Err(Error::Truncated {
                needed: ICMPV6_HEADER_LEN,
                available: raw.len(),
            }),
            Body::Received {
                raw,
                checksum,
                checksum_ok: false,
                ..
            } => Err(Error::ChecksumMismatch {
                found: *checksum,
                expected: checksum_utils::compute(raw, &self.source, &self.destination),
            }),
            Body::Received { .. } if self.msg_type == Icmpv6Type::INVALID => {
                Err(Error::InvalidField("type"))
            }
            _ => Ok(()),
        }
    }

    /// The payload together with any structural fault found in it.
    ///
    /// Decoded once, on first call, whatever the checksum outcome. `None`
    /// for built messages and for messages shorter than the header.
    pub fn decoded_payload(&self) -> Option<&DecodedPayload> {
        match &self.body {
            Body::Received {
                raw,
                payload,
                ..
            } => Some(payload.get_or_init(|| {
                Payload::decode(&raw.slice(ICMPV6_HEADER_LEN..), self.msg_type, self.code)
            })),
            _ => None,
        }
    }

    /// The payload, if the message is valid and the payload decoded without
    /// fault.
    pub fn payload(&self) -> Option<&Payload> {
        match &self.body {
            Body::Built(payload) => payload.as_ref(),
            Body::Received { .. } if self.is_valid() => self
                .decoded_payload()
                .filter(|decoded| decoded.is_valid())
                .map(DecodedPayload::payload),
            _ => None,
        }
    }

    /// The bytes following the 4-byte header of a received message.
    pub fn payload_bytes(&self) -> Option<Bytes> {
        match &self.body {
            Body::Received { raw, .. } => Some(raw.slice(ICMPV6_HEADER_LEN..)),
            _ => None,
        }
    }

    /// Length of the encoded message.
    ///
    /// A built message without payload takes a 4-byte zero body.
    pub fn encoded_len(&self) -> usize {
        match &self.body {
            Body::Received { raw, .. } => raw.len(),
            Body::Built(payload) => {
                ICMPV6_HEADER_LEN + payload.as_ref().map_or(4, Payload::encoded_len)
            }
            Body::Short(raw) => raw.len(),
        }
    }

    /// Serialize the message into `buf` and fill in its checksum.
    ///
    /// A received message is written back with its original body and a
    /// recomputed checksum.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        if let Body::Short(raw) = &self.body {
            return Err(Error::Truncated {
                needed: ICMPV6_HEADER_LEN,
                available: raw.len(),
            });
        }
        ensure_room(buf, len)?;

        buf[0] = self.msg_type.raw();
        buf[1] = self.code;
        buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].fill(0);
        let body_len = match &self.body {
            Body::Received { raw, .. } => {
                buf[ICMPV6_HEADER_LEN..len].copy_from_slice(&raw[ICMPV6_HEADER_LEN..]);
                raw.len() - ICMPV6_HEADER_LEN
            }
            Body::Built(Some(payload)) => payload.encode(&mut buf[ICMPV6_HEADER_LEN..len])?,
            Body::Built(None) | Body::Short(_) => {
                buf[ICMPV6_HEADER_LEN..len].fill(0);
                len - ICMPV6_HEADER_LEN
            }
        };
        let len = ICMPV6_HEADER_LEN + body_len;

        let checksum = checksum_utils::compute(&buf[..len], &self.source, &self.destination);
        NetworkEndian::write_u16(&mut buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2], checksum);
        Ok(len)
    }

    /// Serialize the message into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = vec![0u8; self.encoded_len()];
        let len = self.encode(&mut buf)?;
        buf.truncate(len);
        Ok(Bytes::from(buf))
    }
}

impl fmt::Display for Icmpv6Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("Invalid packet");
        }
        match self.msg_type.name() {
            Some(name) => write_camel_case(f, name)?,
            None => write!(f, "Type{}", self.msg_type.raw())?,
        }
        write!(f, " from {}", self.source)?;
        match self.payload() {
            Some(payload) => write!(f, ": {}", payload),
            None => f.write_str(": invalid payload"),
        }
    }
}

// ECHO_REQUEST is written as EchoRequest.
fn write_camel_case(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for word in name.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}", first)?;
            for c in chars {
                write!(f, "{}", c.to_ascii_lowercase())?;
            }
        }
    }
    Ok(())
}
