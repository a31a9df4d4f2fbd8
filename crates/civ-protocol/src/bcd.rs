//! Packed BCD conversions
//!
//! CI-V carries numbers as packed binary-coded decimal: every byte holds two
//! decimal digits, high nibble first. Frequencies and filter indices travel
//! little-endian (least significant digit pair first); power levels travel
//! big-endian.

use crate::error::ParseError;

/// Split a byte into its (high, low) decimal digits
fn digits(byte: u8) -> Result<(u64, u64), ParseError> {
    let high = (byte >> 4) & 0x0F;
    let low = byte & 0x0F;

    if high > 9 || low > 9 {
        return Err(ParseError::InvalidBcd(byte));
    }

    Ok((u64::from(high), u64::from(low)))
}

/// Pack two decimal digits into one byte
fn pack(high: u64, low: u64) -> u8 {
    (((high % 10) as u8) << 4) | ((low % 10) as u8)
}

/// Convert little-endian packed BCD bytes to an integer
///
/// An empty slice decodes to zero.
///
/// ```
/// use civ_protocol::bcd::bcd_le_to_u64;
///
/// assert_eq!(bcd_le_to_u64(&[0x90, 0x78, 0x56, 0x34, 0x12]).unwrap(), 1_234_567_890);
/// ```
pub fn bcd_le_to_u64(data: &[u8]) -> Result<u64, ParseError> {
    data.iter().rev().try_fold(0u64, |acc, &byte| {
        let (high, low) = digits(byte)?;
        Ok(acc.wrapping_mul(100).wrapping_add(high * 10 + low))
    })
}

/// Convert big-endian packed BCD bytes to an integer
pub fn bcd_be_to_u64(data: &[u8]) -> Result<u64, ParseError> {
    data.iter().try_fold(0u64, |acc, &byte| {
        let (high, low) = digits(byte)?;
        Ok(acc.wrapping_mul(100).wrapping_add(high * 10 + low))
    })
}

/// Convert an integer to `len` bytes of little-endian packed BCD
///
/// Digits beyond the `2 * len` least significant ones are dropped.
pub fn u64_to_bcd_le(value: u64, len: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(len);
    let mut remaining = value;

    for _ in 0..len {
        let low = remaining % 10;
        remaining /= 10;
        let high = remaining % 10;
        remaining /= 10;
        result.push(pack(high, low));
    }

    result
}

/// Convert an integer to `len` bytes of big-endian packed BCD
pub fn u64_to_bcd_be(value: u64, len: usize) -> Vec<u8> {
    let mut bytes = u64_to_bcd_le(value, len);
    bytes.reverse();
    bytes
}
