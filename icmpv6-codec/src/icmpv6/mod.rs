//! ICMPv6 messages and their payloads.
//!
//! The entry point is [`Icmpv6Message`]: [`Icmpv6Message::decode`] turns a
//! received buffer into a message, [`Icmpv6Message::encode`] serializes a
//! message and fills in its checksum.
use std::net::Ipv6Addr;

enum_sim! {
    /// See https://www.iana.org/assignments/icmpv6-parameters
    pub struct Icmpv6Type (u8) {
        INVALID = 0,
        // error messages
        DESTINATION_UNREACHABLE = 1,
        PACKET_TOO_BIG = 2,
        TIME_EXCEEDED = 3,
        PARAMETER_PROBLEM = 4,
        PRIVATE_EXPERIMENTATION_ERROR = 100,
        PRIVATE_EXPERIMENTATION_ERROR2 = 101,
        // informational messages
        ECHO_REQUEST = 128,
        ECHO_REPLY = 129,
        MLD_QUERY = 130,
        MLD_REPORT = 131,
        MLD_DONE = 132,
        ROUTER_SOLICITATION = 133,
        ROUTER_ADVERTISEMENT = 134,
        NEIGHBOR_SOLICITATION = 135,
        NEIGHBOR_ADVERTISEMENT = 136,
        REDIRECT = 137,
        ROUTER_RENUMBERING = 138,
        NODE_INFORMATION_QUERY = 139,
        NODE_INFORMATION_RESPONSE = 140,
        INVERSE_NEIGHBOR_SOLICITATION = 141,
        INVERSE_NEIGHBOR_ADVERTISEMENT = 142,
        MLDV2_REPORT = 143,
        HOME_AGENT_ADDRESS_DISCOVERY_REQUEST = 144,
        HOME_AGENT_ADDRESS_DISCOVERY_REPLY = 145,
        MOBILE_PREFIX_SOLICITATION = 146,
        MOBILE_PREFIX_ADVERTISEMENT = 147,
        CERTIFICATION_PATH_SOLICITATION = 148,
        CERTIFICATION_PATH_ADVERTISEMENT = 149,
        EXPERIMENTAL_MOBILITY_PROTOCOLS = 150,
        MULTICAST_ROUTER_ADVERTISEMENT = 151,
        MULTICAST_ROUTER_SOLICITATION = 152,
        MULTICAST_ROUTER_TERMINATION = 153,
        RPL_CONTROL = 155,
        ILNPV6_LOCATOR_UPDATE = 156,
        DUPLICATE_ADDRESS_REQUEST = 157,
        DUPLICATE_ADDRESS_CONFIRMATION = 158,
        MPL_CONTROL = 159,
        EXTENDED_ECHO_REQUEST = 160,
        EXTENDED_ECHO_REPLY = 161,
        PRIVATE_EXPERIMENTATION_INFO = 200,
        PRIVATE_EXPERIMENTATION_INFO2 = 201,
    }
}

impl Icmpv6Type {
    /// Whether this is an error message type (1..=127).
    #[inline]
    pub fn is_error(&self) -> bool {
        self.0 > 0 && self.0 < 128
    }

    /// Whether this is an informational message type (128..=255).
    #[inline]
    pub fn is_info(&self) -> bool {
        self.0 >= 128
    }
}

/// Length of the type, code and checksum fields.
pub const ICMPV6_HEADER_LEN: usize = 4;

// `buf` holds at least 16 bytes.
#[inline]
pub(crate) fn read_ipv6(buf: &[u8]) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&buf[..16]);
    Ipv6Addr::from(octets)
}

mod message;
pub use message::Icmpv6Message;

mod payload;
pub use payload::{DecodedPayload, Payload};

mod echo;
pub use echo::EchoPayload;

mod error_msg;
pub use error_msg::{ErrorPayload, ErrorReason};

pub mod mld;
pub mod ndp;
