//! Field abstraction for arithmetic modulo a fixed prime.
//!
//! A [`Field`] is the port each representation implements: it owns the
//! value-level arithmetic over its storage type. Callers never touch that
//! storage directly; they work through the two handle types built on top of
//! it, the immutable [`Element`] and the in-place [`MutableElement`].

use std::fmt::Debug;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use subtle::Choice;

pub mod element;
pub mod moduli;
pub mod reference;

pub use element::{Element, FieldElement, MutableElement};
pub use moduli::KnownPrime;
pub use reference::ReferenceField;

/// Error types for field operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// A bounded representation ran out of room for unreduced additions.
    #[error("addition budget exhausted: {required} unreduced additions exceed the limit of {limit}")]
    Overflow { required: u32, limit: u32 },

    #[error("addition budget of {requested} exceeds the supported maximum of {limit}")]
    BudgetTooLarge { requested: u32, limit: u32 },

    #[error("modulus must be greater than one")]
    ModulusTooSmall,

    #[error("modulus must be odd")]
    EvenModulus,

    #[error("buffer underflow: {needed} bytes requested, {available} available")]
    BufferUnderflow { needed: usize, available: usize },
}

/// Result type for field operations
pub type FieldResult<T> = Result<T, FieldError>;

/// A representation of the integers modulo `p`.
///
/// Implementations hold no mutable state and are cheap to clone, so every
/// element carries its own handle to the field. Value-level operations
/// overwrite their first argument; only the additive ones may fail, and only
/// with [`FieldError::Overflow`], in which case the argument is left as it
/// was.
pub trait Field: Clone + Debug + Send + Sync + Sized {
    /// Storage for one element. May hold an unreduced value.
    type Value: Clone + Debug + Send + Sync;

    /// Storage for a small non-negative constant used by
    /// [`MutableElement::set_product_small`].
    type Small: Clone + Debug + Send + Sync;

    /// Returns the modulus `p`.
    fn size(&self) -> &BigUint;

    /// Number of unreduced additions a value can absorb, or `None` when the
    /// representation reduces eagerly.
    fn max_adds(&self) -> Option<u32>;

    /// Encodes `v mod p`.
    fn value_of(&self, v: &BigInt) -> Self::Value;

    /// Encodes little-endian `bytes` extended by `high_byte`, reduced mod `p`.
    fn value_from_bytes(&self, bytes: &[u8], high_byte: u8) -> Self::Value;

    fn small_of(&self, i: u32) -> Self::Small;

    /// Canonical representative of `v` in `[0, p)`. Must not change `v`.
    fn to_biguint(&self, v: &Self::Value) -> BigUint;

    fn add_in_place(&self, a: &mut Self::Value, b: &Self::Value) -> FieldResult<()>;

    fn sub_in_place(&self, a: &mut Self::Value, b: &Self::Value) -> FieldResult<()>;

    fn mul_in_place(&self, a: &mut Self::Value, b: &Self::Value);

    fn mul_small_in_place(&self, a: &mut Self::Value, b: &Self::Small);

    fn square_in_place(&self, a: &mut Self::Value);

    fn negate_in_place(&self, a: &mut Self::Value);

    /// Brings `a` into canonical form. A no-op for eager representations.
    fn reduce_in_place(&self, a: &mut Self::Value);

    /// Sets `a` to `b` when `choice` is set.
    fn conditional_assign(&self, a: &mut Self::Value, b: &Self::Value, choice: Choice);

    /// Exchanges `a` and `b` when `choice` is set.
    fn conditional_swap(&self, a: &mut Self::Value, b: &mut Self::Value, choice: Choice);

    /// Writes the canonical value little-endian into `out`, zero-extended or
    /// truncated to `out.len()`.
    fn write_le_bytes(&self, v: &Self::Value, out: &mut [u8]) {
        crate::util::write_le(&self.to_biguint(v), out);
    }

    /// Writes the plain integer sum of the canonical values of `a` and `b`,
    /// without reduction mod `p`, into `out`.
    fn write_sum_le_bytes(&self, a: &Self::Value, b: &Self::Value, out: &mut [u8]) {
        let sum = self.to_biguint(a) + self.to_biguint(b);
        crate::util::write_le(&sum, out);
    }

    /// The additive identity.
    fn zero(&self) -> Element<Self> {
        Element::from_parts(self.clone(), self.value_of(&BigInt::zero()))
    }

    /// The multiplicative identity.
    fn one(&self) -> Element<Self> {
        Element::from_parts(self.clone(), self.value_of(&BigInt::one()))
    }

    /// Returns the element `v mod p`. Negative and out-of-range input is
    /// normalized.
    fn element(&self, v: &BigInt) -> Element<Self> {
        Element::from_parts(self.clone(), self.value_of(v))
    }

    /// Returns the element encoded by little-endian `bytes` with `high_byte`
    /// as the next more significant byte, reduced mod `p`.
    ///
    /// Pass `&buf[offset..offset + length]` to read a window of a larger
    /// buffer.
    fn element_from_bytes(&self, bytes: &[u8], high_byte: u8) -> Element<Self> {
        Element::from_parts(self.clone(), self.value_from_bytes(bytes, high_byte))
    }

    /// Returns `i mod p` tagged for the small-value multiply.
    fn small_value(&self, i: u32) -> Self::Small {
        self.small_of(i)
    }
}
