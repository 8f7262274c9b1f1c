//! Reference field backed directly by `BigUint`.
//!
//! Every operation reduces mod `p` immediately, so values are always
//! canonical and there is no addition budget. Nothing here is tuned for
//! speed or constant time; this representation is the oracle the bounded
//! ones are checked against.

use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use subtle::Choice;

use super::{Field, FieldError, FieldResult};
use crate::util;

/// The integers modulo `p`, computed with arbitrary-precision arithmetic.
#[derive(Clone, Debug)]
pub struct ReferenceField {
    modulus: Arc<BigUint>,
}

impl ReferenceField {
    /// Create a reference field for `modulus`.
    ///
    /// Primality is not checked.
    pub fn new(modulus: BigUint) -> FieldResult<Self> {
        if modulus <= BigUint::one() {
            return Err(FieldError::ModulusTooSmall);
        }
        Ok(Self {
            modulus: Arc::new(modulus),
        })
    }
}

impl Field for ReferenceField {
    type Value = BigUint;
    type Small = BigUint;

    fn size(&self) -> &BigUint {
        &self.modulus
    }

    fn max_adds(&self) -> Option<u32> {
        None
    }

    fn value_of(&self, v: &BigInt) -> BigUint {
        util::reduce_signed(v, &self.modulus)
    }

    fn value_from_bytes(&self, bytes: &[u8], high_byte: u8) -> BigUint {
        util::le_bytes_with_high(bytes, high_byte) % &*self.modulus
    }

    fn small_of(&self, i: u32) -> BigUint {
        BigUint::from(i) % &*self.modulus
    }

    fn to_biguint(&self, v: &BigUint) -> BigUint {
        v.clone()
    }

    fn add_in_place(&self, a: &mut BigUint, b: &BigUint) -> FieldResult<()> {
        *a += b;
        if *a >= *self.modulus {
            *a -= &*self.modulus;
        }
        Ok(())
    }

    fn sub_in_place(&self, a: &mut BigUint, b: &BigUint) -> FieldResult<()> {
        if *a < *b {
            *a += &*self.modulus;
        }
        *a -= b;
        Ok(())
    }

    fn mul_in_place(&self, a: &mut BigUint, b: &BigUint) {
        *a = (&*a * b) % &*self.modulus;
    }

    fn mul_small_in_place(&self, a: &mut BigUint, b: &BigUint) {
        self.mul_in_place(a, b);
    }

    fn square_in_place(&self, a: &mut BigUint) {
        *a = (&*a * &*a) % &*self.modulus;
    }

    fn negate_in_place(&self, a: &mut BigUint) {
        if !a.is_zero() {
            *a = &*self.modulus - &*a;
        }
    }

    fn reduce_in_place(&self, _a: &mut BigUint) {}

    // Not timing sensitive, so branching is fine here.
    fn conditional_assign(&self, a: &mut BigUint, b: &BigUint, choice: Choice) {
        if bool::from(choice) {
            a.clone_from(b);
        }
    }

    fn conditional_swap(&self, a: &mut BigUint, b: &mut BigUint, choice: Choice) {
        if bool::from(choice) {
            std::mem::swap(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;

    fn field() -> ReferenceField {
        ReferenceField::new(BigUint::from(17u32)).unwrap()
    }

    #[test]
    fn test_field_arithmetic() {
        let field = field();
        let a = field.element(&BigInt::from(5));
        let b = field.element(&BigInt::from(7));

        // Addition
        assert_eq!(a.add(&b).unwrap().as_big_integer(), BigUint::from(12u32));

        // Subtraction wraps
        assert_eq!(a.subtract(&b).unwrap().as_big_integer(), BigUint::from(15u32));

        // Multiplication
        assert_eq!(a.multiply(&b).as_big_integer(), BigUint::from(1u32));

        // Squaring
        assert_eq!(a.square().as_big_integer(), BigUint::from(8u32));

        // Negation
        assert_eq!(a.additive_inverse().as_big_integer(), BigUint::from(12u32));
        assert!(field.zero().additive_inverse().as_big_integer().is_zero());
    }

    #[test]
    fn test_rejects_degenerate_modulus() {
        assert_eq!(
            ReferenceField::new(BigUint::one()).unwrap_err(),
            FieldError::ModulusTooSmall
        );
        assert_eq!(
            ReferenceField::new(BigUint::zero()).unwrap_err(),
            FieldError::ModulusTooSmall
        );
    }

    #[test]
    fn test_element_normalizes_input() {
        let field = field();
        assert_eq!(field.element(&BigInt::from(-3)).as_big_integer(), BigUint::from(14u32));
        assert_eq!(field.element(&BigInt::from(35)).as_big_integer(), BigUint::from(1u32));
        assert_eq!(field.small_value(20), BigUint::from(3u32));
    }

    #[test]
    fn test_bytes_with_high_byte() {
        let field = ReferenceField::new((BigUint::one() << 255u32) - BigUint::from(19u32)).unwrap();
        let bytes = [0xffu8; 32];
        // 2^264 - 1 with the high byte set, reduced mod 2^255 - 19
        let e = field.element_from_bytes(&bytes, 0xff);
        let expected = ((BigUint::one() << 264u32) - BigUint::one()) % field.size();
        assert_eq!(e.as_big_integer(), expected);

        let mut out = [0u8; 32];
        e.as_byte_array(&mut out);
        assert_eq!(field.element_from_bytes(&out, 0), e);
    }

    #[test]
    fn test_add_mod_power_two_is_unreduced() {
        let field = field();
        let a = field.element(&BigInt::from(16));
        let b = field.element(&BigInt::from(15));
        let mut out = [0u8; 2];
        a.add_mod_power_two(&b, &mut out);
        assert_eq!(out, [31, 0]);

        let mut short = [0u8; 0];
        a.add_mod_power_two(&b, &mut short);
    }

    #[test]
    fn test_conditional_operations() {
        let field = field();
        let two = field.element(&BigInt::from(2));
        let mut a = field.one().mutable();
        let mut b = two.mutable();

        a.conditional_set(&two, Choice::from(0));
        assert_eq!(a.as_big_integer(), BigUint::one());
        a.conditional_set(&two, Choice::from(1));
        assert_eq!(a.as_big_integer(), BigUint::from(2u32));

        let mut c = field.zero().mutable();
        c.conditional_swap_with(&mut b, Choice::from(0));
        assert!(c.as_big_integer().is_zero());
        c.conditional_swap_with(&mut b, Choice::from(1));
        assert_eq!(c.as_big_integer(), BigUint::from(2u32));
        assert!(b.as_big_integer().is_zero());
    }
}
