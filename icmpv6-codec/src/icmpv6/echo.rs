use std::fmt;

use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;

use crate::error::{ensure_len, ensure_room, Result};

/// Length of the identifier and sequence fields.
pub const ECHO_HEADER_LEN: usize = 4;

/// Body of an Echo Request or Echo Reply.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EchoPayload {
    /// Matches replies to requests.
    pub identifier: u16,
    /// Matches replies to requests.
    pub sequence: u16,
    /// Echoed back verbatim by the responder.
    pub data: Bytes,
}

impl EchoPayload {
    /// Create an echo payload.
    #[inline]
    pub fn new(identifier: u16, sequence: u16, data: impl Into<Bytes>) -> Self {
        Self {
            identifier,
            sequence,
            data: data.into(),
        }
    }

    pub(crate) fn decode(body: &Bytes) -> Result<Self> {
        ensure_len(body, ECHO_HEADER_LEN)?;
        Ok(Self {
            identifier: NetworkEndian::read_u16(&body[0..2]),
            sequence: NetworkEndian::read_u16(&body[2..4]),
            data: body.slice(ECHO_HEADER_LEN..),
        })
    }

    /// Number of bytes [`EchoPayload::encode`] writes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        ECHO_HEADER_LEN + self.data.len()
    }

    /// Write the payload to the start of `buf`, returning its length.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        ensure_room(buf, len)?;

        NetworkEndian::write_u16(&mut buf[0..2], self.identifier);
        NetworkEndian::write_u16(&mut buf[2..4], self.sequence);
        buf[ECHO_HEADER_LEN..len].copy_from_slice(&self.data);
        Ok(len)
    }
}

impl fmt::Display for EchoPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} seq={} len={}",
            self.identifier,
            self.sequence,
            self.data.len()
        )
    }
}
