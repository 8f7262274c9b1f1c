use num_bigint::BigUint;
use subtle::Choice;

use super::ops::SeedValue;
use super::{HarnessError, HarnessResult};
use crate::field::{Field, FieldElement, MutableElement, ReferenceField};

/// One logical value held in the field under test and in the reference
/// field.
///
/// Every operation is applied to both sides; [`TestPair::check`] then
/// asserts that their canonical values agree.
#[derive(Debug)]
pub struct TestPair<F: Field> {
    pub fast: MutableElement<F>,
    pub reference: MutableElement<ReferenceField>,
}

impl<F: Field> TestPair<F> {
    pub fn new(fast: MutableElement<F>, reference: MutableElement<ReferenceField>) -> Self {
        Self { fast, reference }
    }

    pub fn from_seed(fast: &F, reference: &ReferenceField, seed: &SeedValue) -> Self {
        Self::new(seed.realize(fast).mutable(), seed.realize(reference).mutable())
    }

    /// The reference side's value, used to report operands.
    pub fn value(&self) -> BigUint {
        self.reference.as_big_integer()
    }

    /// Fails with [`HarnessError::ValueMismatch`] if the two sides disagree.
    /// `operands` are the reference values the operation was applied to.
    pub fn check(&self, op: &'static str, operands: &(BigUint, BigUint)) -> HarnessResult<()> {
        let fast = self.fast.as_big_integer();
        let reference = self.reference.as_big_integer();
        if fast != reference {
            return Err(HarnessError::ValueMismatch {
                op,
                left: operands.0.clone(),
                right: operands.1.clone(),
                fast,
                reference,
            });
        }
        Ok(())
    }

    /// Swaps both sides with `other` under the same choice bit.
    pub fn conditional_swap_with(&mut self, other: &mut TestPair<F>, swap: Choice) {
        self.fast.conditional_swap_with(&mut other.fast, swap);
        self.reference.conditional_swap_with(&mut other.reference, swap);
    }

    /// Writes both sides into copies of `window` and compares the bytes.
    pub fn check_bytes(&self, window: &[u8]) -> HarnessResult<()> {
        let mut fast = window.to_vec();
        let mut reference = window.to_vec();
        self.fast.as_byte_array(&mut fast);
        self.reference.as_byte_array(&mut reference);
        compare_bytes("as_byte_array", fast, reference)
    }

    /// Writes the unreduced sum with `other` on both sides into copies of
    /// `window` and compares the bytes.
    pub fn check_sum_bytes(&self, other: &TestPair<F>, window: &[u8]) -> HarnessResult<()> {
        let mut fast = window.to_vec();
        let mut reference = window.to_vec();
        self.fast.add_mod_power_two(&other.fast, &mut fast);
        self.reference.add_mod_power_two(&other.reference, &mut reference);
        compare_bytes("add_mod_power_two", fast, reference)
    }
}

fn compare_bytes(op: &'static str, fast: Vec<u8>, reference: Vec<u8>) -> HarnessResult<()> {
    if fast != reference {
        return Err(HarnessError::BytesMismatch { op, fast, reference });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithmetic::field::MontgomeryField;
    use num_bigint::BigInt;

    fn pair(v: i64) -> TestPair<MontgomeryField> {
        let p = BigUint::from(1_000_003u32);
        let fast = MontgomeryField::new(p.clone()).unwrap();
        let reference = ReferenceField::new(p).unwrap();
        TestPair::from_seed(&fast, &reference, &SeedValue::Integer(BigInt::from(v)))
    }

    #[test]
    fn test_matching_pair_passes() {
        let a = pair(-5);
        let b = pair(12);
        let operands = (a.value(), b.value());
        a.check("noop", &operands).unwrap();
        a.check_bytes(&[0xff; 5]).unwrap();
        a.check_sum_bytes(&b, &[0xff; 2]).unwrap();
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut a = pair(5);
        a.fast.set_square();
        let operands = (a.value(), a.value());
        match a.check("set_square", &operands) {
            Err(HarnessError::ValueMismatch { op, fast, reference, .. }) => {
                assert_eq!(op, "set_square");
                assert_eq!(fast, BigUint::from(25u32));
                assert_eq!(reference, BigUint::from(5u32));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let err = a.check_bytes(&[0u8; 2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "as_byte_array: fast field wrote 1900, reference wrote 0500"
        );
    }

    #[test]
    fn test_swap_moves_both_sides() {
        let mut a = pair(1);
        let mut b = pair(2);
        a.conditional_swap_with(&mut b, Choice::from(1));
        assert_eq!(a.value(), BigUint::from(2u32));
        assert_eq!(a.fast.as_big_integer(), BigUint::from(2u32));
        assert_eq!(b.value(), BigUint::from(1u32));
    }
}
