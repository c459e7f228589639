//! Exponential encodings of the MLDv2 Maximum Response Code and QQIC fields
//! (RFC 3810 §5.1.3 and §5.1.9).
//!
//! Values in the linear range are carried as is. Larger values set the top
//! bit and split the rest into a 3-bit exponent and a mantissa:
//!
//! ```text
//!  0 1 2 3 4 5 6 7 8 9 A B C D E F
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |1| exp |          mant         |    value = (mant | 0x1000) << (exp + 3)
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//!  0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+
//! |1| exp | mant  |                    value = (mant | 0x10) << (exp + 3)
//! +-+-+-+-+-+-+-+-+
//! ```
//!
//! Encoding rounds down to the nearest representable value and clamps
//! anything above the largest one.

/// Largest value carried without the exponential form of Maximum Response Code.
pub const MAX_RESP_CODE_LINEAR_MAX: u32 = 0x7fff;
/// Largest value Maximum Response Code can represent.
pub const MAX_RESP_CODE_MAX: u32 = (0x1fff) << (7 + 3);

/// Largest value carried without the exponential form of QQIC.
pub const QQIC_LINEAR_MAX: u32 = 0x7f;
/// Largest value QQIC can represent.
pub const QQIC_MAX: u32 = (0x1f) << (7 + 3);

const EXP_OFFSET: u32 = 3;

// Smallest exponent whose mantissa, implicit bit included, fits `mant_bits + 1`
// bits. Callers guarantee a result exists.
fn split(value: u32, mant_bits: u32) -> (u32, u32) {
    let mant_limit = (1u32 << (mant_bits + 1)) - 1;
    let mut exp = 0;
    while exp < 7 && (value >> (exp + EXP_OFFSET)) > mant_limit {
        exp += 1;
    }
    let mant = (value >> (exp + EXP_OFFSET)) & ((1 << mant_bits) - 1);
    (exp, mant)
}

/// Decode a Maximum Response Code into milliseconds.
pub fn decode_max_resp_code(code: u16) -> u32 {
    if code < 0x8000 {
        u32::from(code)
    } else {
        let exp = u32::from((code >> 12) & 0x7);
        let mant = u32::from(code & 0x0fff);
        (mant | 0x1000) << (exp + EXP_OFFSET)
    }
}

/// Encode milliseconds into a Maximum Response Code.
pub fn encode_max_resp_code(value: u32) -> u16 {
    if value <= MAX_RESP_CODE_LINEAR_MAX {
        value as u16
    } else if value >= MAX_RESP_CODE_MAX {
        0xffff
    } else {
        let (exp, mant) = split(value, 12);
        (0x8000 | (exp << 12) | mant) as u16
    }
}

/// Decode a Querier's Query Interval Code into seconds.
pub fn decode_qqic(code: u8) -> u32 {
    if code < 0x80 {
        u32::from(code)
    } else {
        let exp = u32::from((code >> 4) & 0x7);
        let mant = u32::from(code & 0x0f);
        (mant | 0x10) << (exp + EXP_OFFSET)
    }
}

/// Encode seconds into a Querier's Query Interval Code.
pub fn encode_qqic(value: u32) -> u8 {
    if value <= QQIC_LINEAR_MAX {
        value as u8
    } else if value >= QQIC_MAX {
        0xff
    } else {
        let (exp, mant) = split(value, 4);
        (0x80 | (exp << 4) | mant) as u8
    }
}
