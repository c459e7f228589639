use quick_error::quick_error;

quick_error! {
    /// Errors produced by the ICMPv6 codec.
    ///
    /// Decoding never fails as a whole: the structural variants
    /// (`Truncated`, `MalformedOptionChain`, `InvalidField`) are recorded as
    /// the fault of a downgraded payload. Encoding returns them directly.
    // quick_error takes no attributes on the fields of struct variants.
    #[allow(missing_docs)]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// A buffer ended before a field it should hold.
        Truncated { needed: usize, available: usize } {
            display("truncated: {} bytes required, {} available", needed, available)
        }
        /// The checksum field disagrees with the computed one.
        ChecksumMismatch { found: u16, expected: u16 } {
            display("checksum mismatch: found {:#06x}, expected {:#06x}", found, expected)
        }
        /// An NDP option with a zero or overflowing length, or an
        /// undecodable body, at `offset` within the chain.
        MalformedOptionChain { offset: usize } {
            display("malformed ndp option chain at option offset {}", offset)
        }
        /// A field the message type requires was not set.
        MissingRequiredField(field: &'static str) {
            display("required field `{}` is missing", field)
        }
        /// A field value has no wire encoding.
        InvalidField(field: &'static str) {
            display("field `{}` does not fit its wire encoding", field)
        }
        /// The output buffer cannot hold the encoded message.
        BufferTooSmall { needed: usize, available: usize } {
            display("output buffer too small: {} bytes required, {} available", needed, available)
        }
        /// The payload cannot travel with the message type and code.
        PayloadMismatch { msg_type: u8, code: u8 } {
            display("payload does not match message type {} code {}", msg_type, code)
        }
    }
}

/// A specialized `Result` for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

#[inline]
pub(crate) fn ensure_len(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        Err(Error::Truncated {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
pub(crate) fn ensure_room(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        Err(Error::BufferTooSmall {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}
