//! Provide utility functions for calculating ICMPv6 checksums.
//!
//! The ICMPv6 checksum (RFC 4443 section 2.3) is the RFC 1071 one's
//! complement sum over an IPv6 pseudo-header followed by the whole ICMPv6
//! message. The pseudo-header is never transmitted.
use std::net::Ipv6Addr;

use byteorder::{ByteOrder, NetworkEndian};

/// IPv6 next-header value of ICMPv6.
pub const ICMPV6_NEXT_HEADER: u8 = 58;

/// Byte offset of the checksum field inside an ICMPv6 message.
pub const CHECKSUM_OFFSET: usize = 2;

/// How the checksum field of the message takes part in the sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumField {
    /// Sum the checksum field as transmitted; used for validation.
    Include,
    /// Treat the checksum field as zero; used for generation.
    Zero,
}

/// Compute an RFC 1071 compliant checksum (without the final complement).
///
/// An odd trailing byte is summed as the high byte of a zero padded word.
pub fn from_slice(mut data: &[u8]) -> u16 {
    let mut accum: u64 = 0;

    // For each 32-byte chunk...
    const CHUNK_SIZE: usize = 32;
    while data.len() >= CHUNK_SIZE {
        let mut d = &data[..CHUNK_SIZE];
        // ... take by 2 bytes and sum them.
        while d.len() >= 2 {
            accum += NetworkEndian::read_u16(d) as u64;
            d = &d[2..];
        }

        data = &data[CHUNK_SIZE..];
    }

    while data.len() >= 2 {
        accum += NetworkEndian::read_u16(data) as u64;
        data = &data[2..];
    }

    if let Some(&value) = data.first() {
        accum += (value as u64) << 8;
    }

    propagate_carries(accum)
}

/// Combine several RFC 1071 compliant checksums.
pub fn combine(checksums: &[u16]) -> u16 {
    let mut accum: u64 = 0;
    for &word in checksums {
        accum += word as u64;
    }
    propagate_carries(accum)
}

/// Sum the IPv6 pseudo-header used by upper-layer checksums.
///
/// Layout: source (16) | destination (16) | upper-layer length (4, big
/// endian) | zero (3) | next header (1).
pub fn pseudo_header(src: &Ipv6Addr, dst: &Ipv6Addr, length: u32, next_header: u8) -> u16 {
    let mut tail = [0; 8];
    NetworkEndian::write_u32(&mut tail[..4], length);
    tail[7] = next_header;

    combine(&[
        from_slice(&src.octets()),
        from_slice(&dst.octets()),
        from_slice(&tail),
    ])
}

/// Sum an ICMPv6 message together with its pseudo-header.
///
/// `message` is the complete message starting at the type byte. The
/// checksum field is either summed as is or treated as zero, depending on
/// `field`.
pub fn message_sum(message: &[u8], src: &Ipv6Addr, dst: &Ipv6Addr, field: ChecksumField) -> u16 {
    let pseudo = pseudo_header(src, dst, message.len() as u32, ICMPV6_NEXT_HEADER);

    let body = match field {
        ChecksumField::Include => from_slice(message),
        ChecksumField::Zero if message.len() > CHECKSUM_OFFSET + 2 => combine(&[
            from_slice(&message[..CHECKSUM_OFFSET]),
            from_slice(&message[CHECKSUM_OFFSET + 2..]),
        ]),
        ChecksumField::Zero => from_slice(&message[..message.len().min(CHECKSUM_OFFSET)]),
    };

    combine(&[pseudo, body])
}

/// Compute the checksum to be written into `message`.
pub fn compute(message: &[u8], src: &Ipv6Addr, dst: &Ipv6Addr) -> u16 {
    !message_sum(message, src, dst, ChecksumField::Zero)
}

/// Check the checksum carried by `message`.
pub fn validate(message: &[u8], src: &Ipv6Addr, dst: &Ipv6Addr) -> bool {
    message_sum(message, src, dst, ChecksumField::Include) == 0xffff
}

// Fold carries back into the low 16 bits until the sum fits.
fn propagate_carries(mut word: u64) -> u16 {
    while word > 0xffff {
        word = (word >> 16) + (word & 0xffff);
    }
    word as u16
}
