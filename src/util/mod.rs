//! Byte and limb conversions shared by the field representations.
//!
//! Element encodings are little-endian and fixed-length. Input may carry one
//! extra high byte above the byte window; output is written into a
//! caller-owned buffer, zero-extended or truncated to its length.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

/// Assembles `bytes` (little-endian) with `high_byte` as the next more
/// significant byte.
pub fn le_bytes_with_high(bytes: &[u8], high_byte: u8) -> BigUint {
    let mut buf = Vec::with_capacity(bytes.len() + 1);
    buf.extend_from_slice(bytes);
    buf.push(high_byte);
    BigUint::from_bytes_le(&buf)
}

/// Writes `value` little-endian into `out`.
///
/// Slots above the value's significant bytes are zeroed; bytes that do not
/// fit are dropped.
pub fn write_le(value: &BigUint, out: &mut [u8]) {
    out.fill(0);
    let be = value.to_bytes_be();
    for (slot, byte) in out.iter_mut().zip(be.iter().rev()) {
        *slot = *byte;
    }
}

/// Writes little-endian limbs into `out` with the same policy as [`write_le`].
pub fn write_limbs_le(limbs: &[u64], out: &mut [u8]) {
    out.fill(0);
    let bytes = limbs.iter().flat_map(|limb| limb.to_le_bytes());
    for (slot, byte) in out.iter_mut().zip(bytes) {
        *slot = byte;
    }
}

/// Returns `v mod modulus` in `[0, modulus)` for a signed `v`.
pub fn reduce_signed(v: &BigInt, modulus: &BigUint) -> BigUint {
    let r = v.magnitude() % modulus;
    if v.sign() == Sign::Minus && !r.is_zero() {
        modulus - r
    } else {
        r
    }
}

/// Converts a BigUint to exactly `num_limbs` little-endian 64-bit limbs.
///
/// `value` must be below `2^(64 * num_limbs)`. Debug builds panic otherwise;
/// release builds keep only the low `num_limbs` limbs. Field code only passes
/// canonical values and `p << k` for `k` within the field's budget, both of
/// which fit by construction of the limb count.
pub fn to_limbs(value: &BigUint, num_limbs: usize) -> Vec<u64> {
    let mut limbs = value.to_u64_digits();
    debug_assert!(limbs.len() <= num_limbs, "value does not fit in {} limbs", num_limbs);
    limbs.resize(num_limbs, 0);
    limbs
}

/// Converts little-endian 64-bit limbs back to a BigUint.
pub fn limbs_to_biguint(limbs: &[u64]) -> BigUint {
    let bytes: Vec<u8> = limbs.iter().flat_map(|limb| limb.to_le_bytes()).collect();
    BigUint::from_bytes_le(&bytes)
}
