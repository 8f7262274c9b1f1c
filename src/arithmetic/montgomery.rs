//! Limb-level Montgomery arithmetic.
//!
//! All routines work on little-endian `u64` limbs of a fixed length `n`
//! with `R = 2^(64n)`. Operands of the multiplication routines may be
//! unreduced as long as their product stays below `R * p`; results are
//! always fully reduced into `[0, p)`.

use num_bigint::BigUint;
use num_traits::One;
use subtle::{Choice, ConditionallySelectable};

use crate::util::to_limbs;

/// Precomputed constants for Montgomery arithmetic modulo an odd `p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MontgomeryConstants {
    /// The modulus
    pub modulus: BigUint,
    /// The modulus as limbs
    pub modulus_limbs: Vec<u64>,
    /// -p^(-1) mod 2^64
    pub n_prime: u64,
    /// R mod p, the Montgomery form of one
    pub r: Vec<u64>,
    /// R^2 mod p, used to convert into Montgomery form
    pub r_squared: Vec<u64>,
}

impl MontgomeryConstants {
    /// Creates Montgomery constants for an odd `modulus` over `num_limbs`
    /// limbs. The modulus must fit in `num_limbs` limbs.
    pub fn new(modulus: &BigUint, num_limbs: usize) -> Self {
        let r = BigUint::one() << (64 * num_limbs);
        let r_mod_p = &r % modulus;
        let r_squared = (&r_mod_p * &r_mod_p) % modulus;
        let modulus_limbs = to_limbs(modulus, num_limbs);

        Self {
            modulus: modulus.clone(),
            n_prime: calculate_n_prime(modulus_limbs[0]),
            modulus_limbs,
            r: to_limbs(&r_mod_p, num_limbs),
            r_squared: to_limbs(&r_squared, num_limbs),
        }
    }

    pub fn num_limbs(&self) -> usize {
        self.modulus_limbs.len()
    }

    /// Converts a canonical value into Montgomery form.
    pub fn to_montgomery(&self, value: &[u64]) -> Vec<u64> {
        mont_mul(value, &self.r_squared, &self.modulus_limbs, self.n_prime)
    }

    /// Converts out of Montgomery form. Accepts any input below `R`.
    pub fn from_montgomery(&self, value: &[u64]) -> Vec<u64> {
        let mut t = vec![0u64; 2 * value.len()];
        t[..value.len()].copy_from_slice(value);
        mont_reduce(t, &self.modulus_limbs, self.n_prime)
    }
}

/// Computes `a + b + carry`, returning the low word and the carry.
#[inline(always)]
pub fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// Computes `a - b - borrow`, returning the low word and the borrow.
#[inline(always)]
pub fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub((b as u128) + (borrow as u128));
    (t as u64, (t >> 127) as u64)
}

/// Computes `a + b * c + carry`, returning the low word and the carry.
#[inline(always)]
pub fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) * (c as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// `a += b`, returning the carry out of the top limb.
pub fn add_limbs(a: &mut [u64], b: &[u64]) -> u64 {
    let mut carry = 0u64;
    for (x, &y) in a.iter_mut().zip(b) {
        let (sum, c) = adc(*x, y, carry);
        *x = sum;
        carry = c;
    }
    carry
}

/// `a -= b`, returning the borrow out of the top limb.
pub fn sub_limbs(a: &mut [u64], b: &[u64]) -> u64 {
    let mut borrow = 0u64;
    for (x, &y) in a.iter_mut().zip(b) {
        let (diff, bw) = sbb(*x, y, borrow);
        *x = diff;
        borrow = bw;
    }
    borrow
}

/// Montgomery multiplication: `a * b * R^(-1) mod p`.
///
/// Requires `a * b < R * p`.
pub fn mont_mul(a: &[u64], b: &[u64], n: &[u64], n_prime: u64) -> Vec<u64> {
    let len = n.len();
    let mut t = vec![0u64; 2 * len];

    // Step 1: t = a * b
    for i in 0..len {
        let mut carry = 0u64;
        for j in 0..len {
            let (lo, hi) = mac(t[i + j], a[i], b[j], carry);
            t[i + j] = lo;
            carry = hi;
        }
        t[i + len] = carry;
    }

    // Step 2: t = t * R^(-1) mod p
    mont_reduce(t, n, n_prime)
}

/// Montgomery squaring: `a^2 * R^(-1) mod p`.
///
/// Computes each cross product once and doubles them. Requires
/// `a^2 < R * p`.
pub fn mont_sqr(a: &[u64], n: &[u64], n_prime: u64) -> Vec<u64> {
    let len = n.len();
    let mut t = vec![0u64; 2 * len];

    // Off-diagonal terms a[i] * a[j], i < j
    for i in 0..len {
        let mut carry = 0u64;
        for j in (i + 1)..len {
            let (lo, hi) = mac(t[i + j], a[i], a[j], carry);
            t[i + j] = lo;
            carry = hi;
        }
        t[i + len] = carry;
    }

    // Multiplied by 2
    let mut top = 0u64;
    for limb in t.iter_mut() {
        let next = *limb >> 63;
        *limb = (*limb << 1) | top;
        top = next;
    }

    // Diagonal terms
    let mut carry = 0u64;
    for i in 0..len {
        let sq = (a[i] as u128) * (a[i] as u128);
        let (lo, c) = adc(t[2 * i], sq as u64, carry);
        t[2 * i] = lo;
        let (hi, c) = adc(t[2 * i + 1], (sq >> 64) as u64, c);
        t[2 * i + 1] = hi;
        carry = c;
    }
    debug_assert_eq!(carry, 0);

    mont_reduce(t, n, n_prime)
}

/// Montgomery reduction of a double-width value: `t * R^(-1) mod p`.
///
/// Requires `t < R * p`, which bounds the intermediate result by `2p`
/// before the final subtraction.
pub fn mont_reduce(mut t: Vec<u64>, n: &[u64], n_prime: u64) -> Vec<u64> {
    let len = n.len();
    debug_assert_eq!(t.len(), 2 * len);

    // Carry that belongs at limb i + len of the next round
    let mut meta_carry = 0u64;
    for i in 0..len {
        let u = t[i].wrapping_mul(n_prime);
        let mut carry = 0u64;
        for j in 0..len {
            let (lo, hi) = mac(t[i + j], u, n[j], carry);
            t[i + j] = lo;
            carry = hi;
        }
        let (sum, c) = adc(t[i + len], carry, meta_carry);
        t[i + len] = sum;
        meta_carry = c;
    }

    let mut result = t.split_off(len);
    final_subtract(&mut result, meta_carry, n);
    result
}

/// Subtracts `n` from `value + top * R` when that does not go negative.
/// Branch-free in the data.
fn final_subtract(value: &mut [u64], top: u64, n: &[u64]) {
    let mut reduced = value.to_vec();
    let borrow = sub_limbs(&mut reduced, n);

    // Keep the subtraction if there was a top carry or no borrow.
    let keep = Choice::from((top | (borrow ^ 1)) as u8 & 1);
    for (x, r) in value.iter_mut().zip(reduced.iter()) {
        x.conditional_assign(r, keep);
    }
}

/// Multiplies limbs by a single word in place, returning the carry out.
pub fn mul_word(a: &mut [u64], w: u64) -> u64 {
    let mut carry = 0u64;
    for limb in a.iter_mut() {
        let (lo, hi) = mac(0, *limb, w, carry);
        *limb = lo;
        carry = hi;
    }
    carry
}

/// Calculates n' such that n * n' ≡ -1 (mod 2^64). `n0` must be odd.
fn calculate_n_prime(n0: u64) -> u64 {
    // Newton iteration doubles the number of correct low bits each round.
    let mut inv = 1u64;
    for _ in 0..6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(n0.wrapping_mul(inv)));
    }
    inv.wrapping_neg()
}
