//! Base32 as used for cjdns keys: 5 bits per character, packed low bits first.

use crate::error::FormatError;

const ALPHABET: &[u8; 32] = b"0123456789bcdfghjklmnpqrstuvwxyz";

/// Character value for each ASCII code; 99 marks characters outside the alphabet.
/// Both letter halves are populated, so uppercase decodes like lowercase.
#[rustfmt::skip]
const NUM_FOR_ASCII: [u8; 128] = [
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 99, 99, 99, 99, 99, 99,
    99, 99, 10, 11, 12, 99, 13, 14, 15, 99, 16, 17, 18, 19, 20, 99,
    21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 99, 99, 99, 99, 99,
    99, 99, 10, 11, 12, 99, 13, 14, 15, 99, 16, 17, 18, 19, 20, 99,
    21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 99, 99, 99, 99, 99,
];

/// Decode `input`. Fails on non-ASCII bytes, characters outside the alphabet, and
/// a tail that leaves 5+ bits or nonzero padding bits.
pub fn decode(input: &str) -> Result<Vec<u8>, FormatError> {
    let mut output = Vec::with_capacity(input.len());
    let mut next_byte: u32 = 0;
    let mut bits: u32 = 0;

    for (offset, &c) in input.as_bytes().iter().enumerate() {
        if c & 0x80 != 0 {
            return Err(FormatError::NonAscii { offset, byte: c });
        }
        let b = NUM_FOR_ASCII[c as usize];
        if b > 31 {
            return Err(FormatError::BadCharacter(c as char));
        }

        next_byte |= u32::from(b) << bits;
        bits += 5;

        if bits >= 8 {
            output.push((next_byte & 0xff) as u8);
            bits -= 8;
            next_byte >>= 8;
        }
    }

    if bits >= 5 || next_byte != 0 {
        return Err(FormatError::TrailingBits {
            bits,
            value: next_byte,
        });
    }
    Ok(output)
}

/// Encode `input`; the last character carries any leftover bits, zero-padded.
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() * 8 + 4) / 5);
    let mut work: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in input {
        work |= u32::from(byte) << bits;
        bits += 8;
        while bits >= 5 {
            out.push(ALPHABET[(work & 31) as usize] as char);
            bits -= 5;
            work >>= 5;
        }
    }
    if bits > 0 {
        out.push(ALPHABET[(work & 31) as usize] as char);
    }
    out
}
