use std::fmt;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;

use super::Icmpv6Type;
use crate::error::{ensure_len, ensure_room, Error, Result};

enum_sim! {
    /// The reason of an ICMPv6 error, packed as `(type << 8) | code`.
    ///
    /// See https://www.iana.org/assignments/icmpv6-parameters
    pub struct ErrorReason (u16) {
        NO_ROUTE_TO_DESTINATION = 0x0100,
        ADMINISTRATIVELY_PROHIBITED = 0x0101,
        BEYOND_SCOPE_OF_SOURCE_ADDRESS = 0x0102,
        ADDRESS_UNREACHABLE = 0x0103,
        PORT_UNREACHABLE = 0x0104,
        SOURCE_ADDRESS_FAILED_POLICY = 0x0105,
        REJECT_ROUTE_TO_DESTINATION = 0x0106,
        ERROR_IN_SOURCE_ROUTING_HEADER = 0x0107,
        HEADERS_TOO_LONG = 0x0108,
        PACKET_TOO_BIG = 0x0200,
        HOP_LIMIT_EXCEEDED = 0x0300,
        FRAGMENT_REASSEMBLY_TIME_EXCEEDED = 0x0301,
        ERRONEOUS_HEADER_FIELD = 0x0400,
        UNRECOGNIZED_NEXT_HEADER = 0x0401,
        UNRECOGNIZED_IPV6_OPTION = 0x0402,
        INCOMPLETE_FIRST_FRAGMENT_HEADER_CHAIN = 0x0403,
        SR_UPPER_LAYER_HEADER_ERROR = 0x0404,
        UNRECOGNIZED_NEXT_HEADER_AT_INTERMEDIATE_NODE = 0x0405,
        EXTENSION_HEADER_TOO_BIG = 0x0406,
        EXTENSION_HEADER_CHAIN_TOO_LONG = 0x0407,
        TOO_MANY_EXTENSION_HEADERS = 0x0408,
        TOO_MANY_OPTIONS_IN_EXTENSION_HEADER = 0x0409,
        OPTION_TOO_BIG = 0x040a,
    }
}

impl ErrorReason {
    /// Pack a type and code.
    #[inline]
    pub fn new(msg_type: Icmpv6Type, code: u8) -> Self {
        Self((u16::from(msg_type.raw()) << 8) | u16::from(code))
    }

    /// The message type, the high byte.
    #[inline]
    pub fn msg_type(&self) -> Icmpv6Type {
        Icmpv6Type::from((self.0 >> 8) as u8)
    }

    /// The code, the low byte.
    #[inline]
    pub fn code(&self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

/// Length of the mtu/pointer/unused word preceding the invoking packet.
pub const ERROR_HEADER_LEN: usize = 4;

/// Body of Destination Unreachable, Packet Too Big, Time Exceeded and
/// Parameter Problem messages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ErrorPayload {
    /// Type and code of the message.
    pub reason: ErrorReason,
    /// Present for Packet Too Big only.
    pub mtu: Option<u32>,
    /// Present for Parameter Problem only.
    pub pointer: Option<u32>,
    /// Best-effort text rendering of the bytes following the first word.
    /// Only encoded when `invoking_packet` is empty.
    pub message: Option<String>,
    /// As much of the invoking packet as the sender included. Encoded in
    /// preference to `message`.
    pub invoking_packet: Bytes,
}

impl ErrorPayload {
    /// An error with no mtu, pointer or tail.
    pub fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            mtu: None,
            pointer: None,
            message: None,
            invoking_packet: Bytes::new(),
        }
    }

    /// A Packet Too Big error.
    pub fn packet_too_big(mtu: u32) -> Self {
        Self {
            mtu: Some(mtu),
            ..Self::new(ErrorReason::PACKET_TOO_BIG)
        }
    }

    /// A Parameter Problem error with the given code.
    pub fn parameter_problem(code: u8, pointer: u32) -> Self {
        Self {
            pointer: Some(pointer),
            ..Self::new(ErrorReason::new(Icmpv6Type::PARAMETER_PROBLEM, code))
        }
    }

    /// Carry `message` as the tail, replacing any invoking packet.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.invoking_packet = Bytes::new();
        self
    }

    /// Carry `packet` as the tail. It takes precedence over `message`.
    pub fn with_invoking_packet(mut self, packet: impl Into<Bytes>) -> Self {
        self.invoking_packet = packet.into();
        self
    }

    pub(crate) fn decode(body: &Bytes, msg_type: Icmpv6Type, code: u8) -> Result<Self> {
        ensure_len(body, ERROR_HEADER_LEN)?;

        let word = NetworkEndian::read_u32(&body[0..4]);
        let tail = body.slice(ERROR_HEADER_LEN..);
        let message = if tail.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&tail).into_owned())
        };

        Ok(Self {
            reason: ErrorReason::new(msg_type, code),
            mtu: (msg_type == Icmpv6Type::PACKET_TOO_BIG).then_some(word),
            pointer: (msg_type == Icmpv6Type::PARAMETER_PROBLEM).then_some(word),
            message,
            invoking_packet: tail,
        })
    }

    // The raw invoking packet wins over the text message, so a decoded error
    // is re-encoded byte for byte.
    fn tail(&self) -> &[u8] {
        if !self.invoking_packet.is_empty() {
            &self.invoking_packet
        } else {
            self.message.as_deref().map(str::as_bytes).unwrap_or(&[])
        }
    }

    /// Number of bytes [`ErrorPayload::encode`] writes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        ERROR_HEADER_LEN + self.tail().len()
    }

    /// Write the payload to the start of `buf`, returning its length.
    ///
    /// Fails with [`Error::MissingRequiredField`] when a Packet Too Big has
    /// no mtu or a Parameter Problem no pointer.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let word = match self.reason.msg_type() {
            Icmpv6Type::PACKET_TOO_BIG => self.mtu.ok_or(Error::MissingRequiredField("mtu"))?,
            Icmpv6Type::PARAMETER_PROBLEM => {
                self.pointer.ok_or(Error::MissingRequiredField("pointer"))?
            }
            _ => 0,
        };

        let tail = self.tail();
        let len = ERROR_HEADER_LEN + tail.len();
        ensure_room(buf, len)?;

        NetworkEndian::write_u32(&mut buf[0..4], word);
        buf[ERROR_HEADER_LEN..len].copy_from_slice(tail);
        Ok(len)
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reason={}", self.reason)?;
        if let Some(mtu) = self.mtu {
            write!(f, " mtu={}", mtu)?;
        }
        if let Some(pointer) = self.pointer {
            write!(f, " pointer={}", pointer)?;
        }
        write!(f, " len={}", self.tail().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_split_and_combine() {
        for msg_type in 1..=4u8 {
            for code in 0..=255u8 {
                let reason = ErrorReason::new(Icmpv6Type::from(msg_type), code);
                assert_eq!(reason.msg_type().raw(), msg_type);
                assert_eq!(reason.code(), code);
                assert_eq!(reason.raw(), (u16::from(msg_type) << 8) | u16::from(code));
            }
        }
        assert_eq!(ErrorReason::OPTION_TOO_BIG.code(), 10);
        assert_eq!(
            ErrorReason::HOP_LIMIT_EXCEEDED.msg_type(),
            Icmpv6Type::TIME_EXCEEDED
        );
    }

    #[test]
    fn decode_packet_too_big() {
        let body = Bytes::from_static(&[0x00, 0x00, 0x05, 0xdc, 0x60, 0x00]);
        let err = ErrorPayload::decode(&body, Icmpv6Type::PACKET_TOO_BIG, 0).unwrap();
        assert_eq!(err.reason, ErrorReason::PACKET_TOO_BIG);
        assert_eq!(err.mtu, Some(1500));
        assert_eq!(err.pointer, None);
        assert_eq!(&err.invoking_packet[..], &[0x60, 0x00]);
        assert!(err.message.is_some());
    }

    #[test]
    fn decode_parameter_problem() {
        let body = Bytes::from_static(&[0x00, 0x00, 0x00, 0x28]);
        let err = ErrorPayload::decode(&body, Icmpv6Type::PARAMETER_PROBLEM, 1).unwrap();
        assert_eq!(err.reason, ErrorReason::UNRECOGNIZED_NEXT_HEADER);
        assert_eq!(err.pointer, Some(40));
        assert_eq!(err.mtu, None);
        assert_eq!(err.message, None);
    }

    #[test]
    fn decode_unreachable_ignores_first_word() {
        let body = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef, b'o', b'k']);
        let err = ErrorPayload::decode(&body, Icmpv6Type::DESTINATION_UNREACHABLE, 4).unwrap();
        assert_eq!(err.reason, ErrorReason::PORT_UNREACHABLE);
        assert_eq!(err.mtu, None);
        assert_eq!(err.pointer, None);
        assert_eq!(err.message.as_deref(), Some("ok"));
    }

    #[test]
    fn encode_requires_mtu_and_pointer() {
        let mut buf = [0u8; 32];
        assert_eq!(
            ErrorPayload::new(ErrorReason::PACKET_TOO_BIG).encode(&mut buf),
            Err(Error::MissingRequiredField("mtu"))
        );
        assert_eq!(
            ErrorPayload::new(ErrorReason::ERRONEOUS_HEADER_FIELD).encode(&mut buf),
            Err(Error::MissingRequiredField("pointer"))
        );
        assert_eq!(
            ErrorPayload::new(ErrorReason::ADDRESS_UNREACHABLE).encode(&mut buf),
            Ok(4)
        );
        assert_eq!(&buf[..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn encode_message_text() {
        let err = ErrorPayload::packet_too_big(1280).with_message("too big");
        let mut buf = [0u8; 32];
        let len = err.encode(&mut buf).unwrap();
        assert_eq!(len, 11);
        assert_eq!(&buf[..4], &[0x00, 0x00, 0x05, 0x00]);
        assert_eq!(&buf[4..len], b"too big");
    }

    #[test]
    fn message_replaces_decoded_invoking_packet() {
        let body = Bytes::from_static(&[0x00, 0x00, 0x05, 0xdc, 0x60, 0x00]);
        let err = ErrorPayload::decode(&body, Icmpv6Type::PACKET_TOO_BIG, 0)
            .unwrap()
            .with_message("shrink");
        assert!(err.invoking_packet.is_empty());
        assert_eq!(err.encoded_len(), 10);

        let mut buf = [0u8; 32];
        let len = err.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"\x00\x00\x05\xdcshrink");

        // the invoking packet set afterwards wins again
        let err = err.with_invoking_packet(Bytes::from_static(&[0x60, 0x00]));
        let len = err.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], &body[..]);
    }
}
