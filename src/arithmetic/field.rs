//! Bounded field representation over Montgomery-form limbs.
//!
//! Additions are lazy: sums and differences are kept unreduced and each
//! value tracks how many doublings of `p` it may have absorbed. Once that
//! count would pass the field's `max_adds` the addition is refused with
//! [`FieldError::Overflow`] and the caller has to reduce first.
//! Multiplication accepts unreduced operands and always produces a
//! canonical result.

use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, ToPrimitive};
use subtle::{Choice, ConditionallySelectable};

use crate::arithmetic::montgomery::{
    add_limbs, mont_mul, mont_sqr, mul_word, sub_limbs, MontgomeryConstants,
};
use crate::field::{Field, FieldError, FieldResult};
use crate::util::{self, limbs_to_biguint, to_limbs};

/// Bits reserved above `p` for a small-value product before its reduction.
const SMALL_VALUE_BITS: u64 = 32;

/// Largest addition budget [`MontgomeryField::with_max_adds`] accepts.
/// Every budget step costs one cached `p << k`.
pub const MAX_ADDS_LIMIT: u32 = 1024;

/// A value in Montgomery form, possibly unreduced.
///
/// The stored integer is at most `2^num_adds * p`.
#[derive(Clone, Debug)]
pub struct MontgomeryValue {
    limbs: Vec<u64>,
    num_adds: u32,
}

impl MontgomeryValue {
    /// Number of unreduced additions this value has absorbed.
    pub fn num_adds(&self) -> u32 {
        self.num_adds
    }
}

/// A small constant, kept as a machine word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MontgomerySmall(u32);

impl MontgomerySmall {
    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct FieldParams {
    constants: MontgomeryConstants,
    max_adds: u32,
    /// `p << k` for every `k` in `0..=max_adds`
    shifted_moduli: Vec<Vec<u64>>,
}

/// The integers modulo an odd `p`, in Montgomery form with lazy additions.
#[derive(Clone, Debug)]
pub struct MontgomeryField {
    params: Arc<FieldParams>,
}

impl MontgomeryField {
    /// Creates a field with one spare limb above the modulus and the
    /// largest addition budget that limb allows.
    pub fn new(modulus: BigUint) -> FieldResult<Self> {
        let bits = modulus.bits();
        let num_limbs = (bits + 63) / 64 + 1;
        let spare = 64 * num_limbs - bits - 1;
        Self::build(modulus, num_limbs as usize, (spare / 2) as u32)
    }

    /// Creates a field with a budget of `max_adds` unreduced additions,
    /// sizing the limbs to fit.
    ///
    /// Budgets above [`MAX_ADDS_LIMIT`] fail with
    /// [`FieldError::BudgetTooLarge`].
    pub fn with_max_adds(modulus: BigUint, max_adds: u32) -> FieldResult<Self> {
        if max_adds > MAX_ADDS_LIMIT {
            return Err(FieldError::BudgetTooLarge {
                requested: max_adds,
                limit: MAX_ADDS_LIMIT,
            });
        }
        let budget = u64::from(max_adds);
        let headroom = (2 * budget).max(budget + SMALL_VALUE_BITS);
        let num_limbs = ((modulus.bits() + headroom + 1 + 63) / 64) as usize;
        Self::build(modulus, num_limbs, max_adds)
    }

    fn build(modulus: BigUint, num_limbs: usize, max_adds: u32) -> FieldResult<Self> {
        if modulus <= BigUint::one() {
            return Err(FieldError::ModulusTooSmall);
        }
        if modulus.is_even() {
            return Err(FieldError::EvenModulus);
        }

        let constants = MontgomeryConstants::new(&modulus, num_limbs);
        let shifted_moduli = (0..=max_adds)
            .map(|k| to_limbs(&(&modulus << k), num_limbs))
            .collect();

        Ok(Self {
            params: Arc::new(FieldParams {
                constants,
                max_adds,
                shifted_moduli,
            }),
        })
    }

    pub fn num_limbs(&self) -> usize {
        self.params.constants.num_limbs()
    }

    fn constants(&self) -> &MontgomeryConstants {
        &self.params.constants
    }

    fn encode(&self, canonical: &BigUint) -> MontgomeryValue {
        let limbs = to_limbs(canonical, self.num_limbs());
        MontgomeryValue {
            limbs: self.constants().to_montgomery(&limbs),
            num_adds: 0,
        }
    }

    /// Canonical limbs of `v`, out of Montgomery form.
    fn decode(&self, v: &MontgomeryValue) -> Vec<u64> {
        self.constants().from_montgomery(&v.limbs)
    }

    fn mul_limbs(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let c = self.constants();
        mont_mul(a, b, &c.modulus_limbs, c.n_prime)
    }

    /// Budget needed to combine values with `a` and `b` unreduced additions.
    fn budget(&self, a: u32, b: u32) -> FieldResult<u32> {
        let required = a.max(b) + 1;
        if required > self.params.max_adds {
            return Err(FieldError::Overflow {
                required,
                limit: self.params.max_adds,
            });
        }
        Ok(required)
    }
}

impl Field for MontgomeryField {
    type Value = MontgomeryValue;
    type Small = MontgomerySmall;

    fn size(&self) -> &BigUint {
        &self.params.constants.modulus
    }

    fn max_adds(&self) -> Option<u32> {
        Some(self.params.max_adds)
    }

    fn value_of(&self, v: &BigInt) -> MontgomeryValue {
        self.encode(&util::reduce_signed(v, self.size()))
    }

    fn value_from_bytes(&self, bytes: &[u8], high_byte: u8) -> MontgomeryValue {
        let raw = util::le_bytes_with_high(bytes, high_byte);
        self.encode(&(raw % self.size()))
    }

    fn small_of(&self, i: u32) -> MontgomerySmall {
        match self.size().to_u32() {
            Some(p) => MontgomerySmall(i % p),
            None => MontgomerySmall(i),
        }
    }

    fn to_biguint(&self, v: &MontgomeryValue) -> BigUint {
        limbs_to_biguint(&self.decode(v))
    }

    fn add_in_place(&self, a: &mut MontgomeryValue, b: &MontgomeryValue) -> FieldResult<()> {
        let num_adds = self.budget(a.num_adds, b.num_adds)?;
        let carry = add_limbs(&mut a.limbs, &b.limbs);
        debug_assert_eq!(carry, 0);
        a.num_adds = num_adds;
        Ok(())
    }

    fn sub_in_place(&self, a: &mut MontgomeryValue, b: &MontgomeryValue) -> FieldResult<()> {
        let num_adds = self.budget(a.num_adds, b.num_adds)?;
        // a + (2^k * p - b), with k the budget of b, never borrows.
        let mut negated = self.params.shifted_moduli[b.num_adds as usize].clone();
        let borrow = sub_limbs(&mut negated, &b.limbs);
        debug_assert_eq!(borrow, 0);
        let carry = add_limbs(&mut a.limbs, &negated);
        debug_assert_eq!(carry, 0);
        a.num_adds = num_adds;
        Ok(())
    }

    fn mul_in_place(&self, a: &mut MontgomeryValue, b: &MontgomeryValue) {
        a.limbs = self.mul_limbs(&a.limbs, &b.limbs);
        a.num_adds = 0;
    }

    fn mul_small_in_place(&self, a: &mut MontgomeryValue, b: &MontgomerySmall) {
        // x*R * c is already the Montgomery form of x*c; only its size
        // needs bringing back down.
        let carry = mul_word(&mut a.limbs, u64::from(b.0));
        debug_assert_eq!(carry, 0);
        self.reduce_in_place(a);
    }

    fn square_in_place(&self, a: &mut MontgomeryValue) {
        let c = self.constants();
        a.limbs = mont_sqr(&a.limbs, &c.modulus_limbs, c.n_prime);
        a.num_adds = 0;
    }

    fn negate_in_place(&self, a: &mut MontgomeryValue) {
        let mut negated = self.params.shifted_moduli[a.num_adds as usize].clone();
        let borrow = sub_limbs(&mut negated, &a.limbs);
        debug_assert_eq!(borrow, 0);
        a.limbs = negated;
    }

    fn reduce_in_place(&self, a: &mut MontgomeryValue) {
        // (x*R) * R * R^(-1) = x*R, fully reduced.
        a.limbs = self.mul_limbs(&a.limbs, &self.constants().r);
        a.num_adds = 0;
    }

    fn conditional_assign(&self, a: &mut MontgomeryValue, b: &MontgomeryValue, choice: Choice) {
        for (x, y) in a.limbs.iter_mut().zip(b.limbs.iter()) {
            x.conditional_assign(y, choice);
        }
        a.num_adds.conditional_assign(&b.num_adds, choice);
    }

    fn conditional_swap(&self, a: &mut MontgomeryValue, b: &mut MontgomeryValue, choice: Choice) {
        for (x, y) in a.limbs.iter_mut().zip(b.limbs.iter_mut()) {
            u64::conditional_swap(x, y, choice);
        }
        u32::conditional_swap(&mut a.num_adds, &mut b.num_adds, choice);
    }

    fn write_le_bytes(&self, v: &MontgomeryValue, out: &mut [u8]) {
        util::write_limbs_le(&self.decode(v), out);
    }

    fn write_sum_le_bytes(&self, a: &MontgomeryValue, b: &MontgomeryValue, out: &mut [u8]) {
        let mut sum = self.decode(a);
        let carry = add_limbs(&mut sum, &self.decode(b));
        sum.push(carry);
        util::write_limbs_le(&sum, out);
    }
}
