use std::fmt;

use bytes::Bytes;
use tracing::trace;

use super::mld::{MldQuery, MldReport, MulticastRouterAdvertisement};
use super::ndp::{NdpMessage, NdpPayload};
use super::{EchoPayload, ErrorPayload, Icmpv6Type};
use crate::error::{ensure_room, Error, Result};

/// The body of an ICMPv6 message, selected by the message type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Payload {
    /// Echo Request and Echo Reply.
    Echo(EchoPayload),
    /// The four error messages.
    Error(ErrorPayload),
    /// Neighbor Discovery and Inverse Neighbor Discovery.
    Ndp(NdpPayload),
    /// MLD Query, and the MLDv1 Report and Done messages.
    MldQuery(MldQuery),
    /// MLDv2 Report.
    MldReport(MldReport),
    /// Multicast Router Advertisement.
    MulticastRouterAdvertisement(MulticastRouterAdvertisement),
    /// Unrecognized type, or a body too short for its fixed fields.
    Binary(Bytes),
}

/// A payload read from the wire, with the structural fault met while reading
/// it.
///
/// A fault either downgrades the payload to [`Payload::Binary`] (the fixed
/// fields were missing) or leaves a partial payload behind (a broken NDP
/// option chain, a truncated source list or group record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    payload: Payload,
    fault: Option<Error>,
}

impl DecodedPayload {
    /// The payload, possibly partial or downgraded.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The fault met while reading, if any.
    #[inline]
    pub fn fault(&self) -> Option<&Error> {
        self.fault.as_ref()
    }

    /// Whether the payload was read without fault.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }

    /// Split into the payload and its fault.
    #[inline]
    pub fn into_parts(self) -> (Payload, Option<Error>) {
        (self.payload, self.fault)
    }
}

impl Payload {
    /// Decode `body`, the bytes following the 4-byte header, according to
    /// the message type and code.
    pub fn decode(body: &Bytes, msg_type: Icmpv6Type, code: u8) -> DecodedPayload {
        let res = match msg_type {
            Icmpv6Type::DESTINATION_UNREACHABLE
            | Icmpv6Type::PACKET_TOO_BIG
            | Icmpv6Type::TIME_EXCEEDED
            | Icmpv6Type::PARAMETER_PROBLEM => {
                ErrorPayload::decode(body, msg_type, code).map(|p| (Payload::Error(p), None))
            }
            Icmpv6Type::ECHO_REQUEST | Icmpv6Type::ECHO_REPLY => {
                EchoPayload::decode(body).map(|p| (Payload::Echo(p), None))
            }
            Icmpv6Type::MLD_QUERY | Icmpv6Type::MLD_REPORT | Icmpv6Type::MLD_DONE => {
                MldQuery::decode(body, msg_type).map(|(p, fault)| (Payload::MldQuery(p), fault))
            }
            Icmpv6Type::MLDV2_REPORT => {
                MldReport::decode(body).map(|(p, fault)| (Payload::MldReport(p), fault))
            }
            Icmpv6Type::MULTICAST_ROUTER_ADVERTISEMENT => {
                MulticastRouterAdvertisement::decode(body, code)
                    .map(|p| (Payload::MulticastRouterAdvertisement(p), None))
            }
            _ if NdpMessage::fixed_len_of(msg_type).is_some() => {
                NdpPayload::decode(body, msg_type).map(|(p, fault)| (Payload::Ndp(p), fault))
            }
            _ => Ok((Payload::Binary(body.clone()), None)),
        };

        let (payload, fault) = match res {
            Ok(decoded) => decoded,
            Err(err) => (Payload::Binary(body.clone()), Some(err)),
        };
        if let Some(err) = &fault {
            trace!(msg_type = msg_type.raw(), code, error = %err, "icmpv6 payload downgraded");
        }
        DecodedPayload { payload, fault }
    }

    /// Check that this payload can travel in a message with the given type
    /// and code.
    pub fn check_header(&self, msg_type: Icmpv6Type, code: u8) -> Result<()> {
        let matches = match self {
            Payload::Echo(_) => {
                msg_type == Icmpv6Type::ECHO_REQUEST || msg_type == Icmpv6Type::ECHO_REPLY
            }
            Payload::Error(err) => err.reason.msg_type() == msg_type && err.reason.code() == code,
            Payload::Ndp(ndp) => ndp.message.msg_type() == msg_type,
            Payload::MldQuery(query) => match query.v2 {
                Some(_) => msg_type == Icmpv6Type::MLD_QUERY,
                None => {
                    msg_type == Icmpv6Type::MLD_QUERY
                        || msg_type == Icmpv6Type::MLD_REPORT
                        || msg_type == Icmpv6Type::MLD_DONE
                }
            },
            Payload::MldReport(_) => msg_type == Icmpv6Type::MLDV2_REPORT,
            Payload::MulticastRouterAdvertisement(mra) => {
                msg_type == Icmpv6Type::MULTICAST_ROUTER_ADVERTISEMENT
                    && mra.advertisement_interval == code
            }
            Payload::Binary(_) => true,
        };
        if matches {
            Ok(())
        } else {
            Err(Error::PayloadMismatch {
                msg_type: msg_type.raw(),
                code,
            })
        }
    }

    /// Number of bytes [`Payload::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Payload::Echo(p) => p.encoded_len(),
            Payload::Error(p) => p.encoded_len(),
            Payload::Ndp(p) => p.encoded_len(),
            Payload::MldQuery(p) => p.encoded_len(),
            Payload::MldReport(p) => p.encoded_len(),
            Payload::MulticastRouterAdvertisement(p) => p.encoded_len(),
            Payload::Binary(raw) => raw.len(),
        }
    }

    /// Write the payload to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Payload::Echo(p) => p.encode(buf),
            Payload::Error(p) => p.encode(buf),
            Payload::Ndp(p) => p.encode(buf),
            Payload::MldQuery(p) => p.encode(buf),
            Payload::MldReport(p) => p.encode(buf),
            Payload::MulticastRouterAdvertisement(p) => p.encode(buf),
            Payload::Binary(raw) => {
                ensure_room(buf, raw.len())?;
                buf[..raw.len()].copy_from_slice(raw);
                Ok(raw.len())
            }
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Echo(p) => fmt::Display::fmt(p, f),
            Payload::Error(p) => fmt::Display::fmt(p, f),
            Payload::Ndp(p) => fmt::Display::fmt(p, f),
            Payload::MldQuery(p) => fmt::Display::fmt(p, f),
            Payload::MldReport(p) => fmt::Display::fmt(p, f),
            Payload::MulticastRouterAdvertisement(p) => fmt::Display::fmt(p, f),
            Payload::Binary(raw) => write!(f, "{} bytes", raw.len()),
        }
    }
}
