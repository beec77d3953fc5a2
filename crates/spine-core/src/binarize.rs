//! Lossless packing of small integer sets into one integer.
//!
//! Bit `k` of the packed word is set iff `k` is in the set. Decoding
//! returns the set in ascending order, so `decode(encode(s))` equals `s`
//! sorted with duplicates removed.

use crate::error::ObjectError;
use crate::id::ModuleIds;

/// Widest supported packed word.
pub const MAX_BIT_WIDTH: u32 = u64::BITS;

/// Pack `values` into a word of `bit_width` bits.
///
/// `bit_width` must lie in `1..=`[`MAX_BIT_WIDTH`] and every value must
/// satisfy `0 <= v < bit_width`; either violation is
/// [`ObjectError::DomainRange`].
pub fn encode(field: &str, values: &[i64], bit_width: u32) -> Result<u64, ObjectError> {
    if bit_width == 0 || bit_width > MAX_BIT_WIDTH {
        return Err(ObjectError::DomainRange {
            field: field.to_string(),
            detail: format!("bit width {bit_width} is outside 1..={MAX_BIT_WIDTH}"),
        });
    }
    let mut bits = 0u64;
    for &v in values {
        if v < 0 || v >= i64::from(bit_width) {
            return Err(ObjectError::DomainRange {
                field: field.to_string(),
                detail: format!("{v} is outside [0, {bit_width})"),
            });
        }
        bits |= 1u64 << v;
    }
    Ok(bits)
}

/// Unpack a word into the ascending list of set bit positions.
pub fn decode(bits: u64) -> ModuleIds {
    let mut out = ModuleIds::new();
    let mut rest = bits;
    while rest != 0 {
        let k = rest.trailing_zeros();
        out.push(i64::from(k));
        rest &= rest - 1;
    }
    out
}
