//! Immutable and mutable element handles.
//!
//! Both handles wrap the same storage type, [`Field::Value`]. [`Element`] is
//! a value: it can be cloned and shared, and every operation on it returns a
//! new element. [`MutableElement`] is not `Clone`; its in-place operations
//! take `&mut self`, so while it is being changed nothing else can observe it.
//! Converting between the two always copies.

use std::fmt;

use num_bigint::BigUint;
use subtle::Choice;

use super::{Field, FieldError, FieldResult};

/// The read-only capability set, shared by both handles.
///
/// Operands may be either handle, as long as they belong to the same field.
pub trait FieldElement: fmt::Debug {
    type Field: Field;

    /// The field this element belongs to.
    fn field(&self) -> &Self::Field;

    /// The underlying storage. Exposed for [`Field`] implementations.
    fn value(&self) -> &<Self::Field as Field>::Value;

    /// Returns `(self + b) mod p`.
    fn add(&self, b: &impl FieldElement<Field = Self::Field>) -> FieldResult<Element<Self::Field>> {
        check_same_field(self.field(), b.field());
        let mut value = self.value().clone();
        self.field().add_in_place(&mut value, b.value())?;
        Ok(Element::from_parts(self.field().clone(), value))
    }

    /// Returns `(self - b) mod p`.
    fn subtract(
        &self,
        b: &impl FieldElement<Field = Self::Field>,
    ) -> FieldResult<Element<Self::Field>> {
        check_same_field(self.field(), b.field());
        let mut value = self.value().clone();
        self.field().sub_in_place(&mut value, b.value())?;
        Ok(Element::from_parts(self.field().clone(), value))
    }

    /// Returns `(-self) mod p`.
    fn additive_inverse(&self) -> Element<Self::Field> {
        let mut value = self.value().clone();
        self.field().negate_in_place(&mut value);
        Element::from_parts(self.field().clone(), value)
    }

    /// Returns `(self * b) mod p`.
    fn multiply(&self, b: &impl FieldElement<Field = Self::Field>) -> Element<Self::Field> {
        check_same_field(self.field(), b.field());
        let mut value = self.value().clone();
        self.field().mul_in_place(&mut value, b.value());
        Element::from_parts(self.field().clone(), value)
    }

    /// Returns `(self * self) mod p`.
    fn square(&self) -> Element<Self::Field> {
        let mut value = self.value().clone();
        self.field().square_in_place(&mut value);
        Element::from_parts(self.field().clone(), value)
    }

    /// The canonical representative in `[0, p)`.
    fn as_big_integer(&self) -> BigUint {
        self.field().to_biguint(self.value())
    }

    /// Writes the canonical value little-endian into `result`.
    ///
    /// High-order slots past the value are zeroed. If the value needs more
    /// bytes than `result` holds, the high-order bytes are dropped; this is
    /// a fixed output window, not an error.
    fn as_byte_array(&self, result: &mut [u8]) {
        self.field().write_le_bytes(self.value(), result);
    }

    /// Writes the low bytes of the integer sum `self + arg` of the two
    /// canonical values, *without* reduction mod `p`, into `result` using
    /// the same zero-extension and truncation as [`as_byte_array`].
    ///
    /// This is not field addition: it exposes the raw sum for carry
    /// analysis.
    ///
    /// [`as_byte_array`]: FieldElement::as_byte_array
    fn add_mod_power_two(&self, arg: &impl FieldElement<Field = Self::Field>, result: &mut [u8]) {
        check_same_field(self.field(), arg.field());
        self.field()
            .write_sum_le_bytes(self.value(), arg.value(), result);
    }

    /// Copies the value into a new mutable handle.
    fn mutable(&self) -> MutableElement<Self::Field> {
        MutableElement {
            field: self.field().clone(),
            value: self.value().clone(),
        }
    }

    /// Copies the value into a new immutable handle.
    fn fixed(&self) -> Element<Self::Field> {
        Element::from_parts(self.field().clone(), self.value().clone())
    }
}

#[inline]
fn check_same_field<F: Field>(a: &F, b: &F) {
    debug_assert_eq!(a.size(), b.size(), "operands belong to different fields");
}

/// An immutable field element.
#[derive(Clone)]
pub struct Element<F: Field> {
    field: F,
    value: F::Value,
}

impl<F: Field> Element<F> {
    pub(crate) fn from_parts(field: F, value: F::Value) -> Self {
        Self { field, value }
    }
}

impl<F: Field> FieldElement for Element<F> {
    type Field = F;

    fn field(&self) -> &F {
        &self.field
    }

    fn value(&self) -> &F::Value {
        &self.value
    }
}

impl<F: Field> PartialEq for Element<F> {
    fn eq(&self, other: &Self) -> bool {
        self.field.size() == other.field.size() && self.as_big_integer() == other.as_big_integer()
    }
}

impl<F: Field> Eq for Element<F> {}

impl<F: Field> fmt::Debug for Element<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({:#x})", self.as_big_integer())
    }
}

impl<F: Field> fmt::Display for Element<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_big_integer())
    }
}

/// A field element changed in place.
///
/// Every setter overwrites the receiver and returns it for chaining; inputs
/// are never changed.
pub struct MutableElement<F: Field> {
    field: F,
    value: F::Value,
}

impl<F: Field> FieldElement for MutableElement<F> {
    type Field = F;

    fn field(&self) -> &F {
        &self.field
    }

    fn value(&self) -> &F::Value {
        &self.value
    }
}

impl<F: Field> MutableElement<F> {
    /// `self = (self + b) mod p`. On overflow `self` is unchanged.
    pub fn set_sum(&mut self, b: &impl FieldElement<Field = F>) -> FieldResult<&mut Self> {
        check_same_field(&self.field, b.field());
        self.field.add_in_place(&mut self.value, b.value())?;
        Ok(self)
    }

    /// `self = (self - b) mod p`. On overflow `self` is unchanged.
    pub fn set_difference(&mut self, b: &impl FieldElement<Field = F>) -> FieldResult<&mut Self> {
        check_same_field(&self.field, b.field());
        self.field.sub_in_place(&mut self.value, b.value())?;
        Ok(self)
    }

    pub fn set_product(&mut self, b: &impl FieldElement<Field = F>) -> &mut Self {
        check_same_field(&self.field, b.field());
        self.field.mul_in_place(&mut self.value, b.value());
        self
    }

    /// Multiplies by a small constant from [`Field::small_value`].
    ///
    /// Numerically identical to [`set_product`](Self::set_product) with the
    /// same constant as an element.
    pub fn set_product_small(&mut self, b: &F::Small) -> &mut Self {
        self.field.mul_small_in_place(&mut self.value, b);
        self
    }

    pub fn set_square(&mut self) -> &mut Self {
        self.field.square_in_place(&mut self.value);
        self
    }

    pub fn set_additive_inverse(&mut self) -> &mut Self {
        self.field.negate_in_place(&mut self.value);
        self
    }

    /// Copies the value of `v`.
    pub fn set_value(&mut self, v: &impl FieldElement<Field = F>) -> &mut Self {
        check_same_field(&self.field, v.field());
        self.value = v.value().clone();
        self
    }

    /// Same encoding as [`Field::element_from_bytes`].
    pub fn set_value_bytes(&mut self, bytes: &[u8], high_byte: u8) -> &mut Self {
        self.value = self.field.value_from_bytes(bytes, high_byte);
        self
    }

    /// Reads `length` bytes from the front of `buf` and advances it past
    /// them.
    pub fn set_value_from_buf(
        &mut self,
        buf: &mut &[u8],
        length: usize,
        high_byte: u8,
    ) -> FieldResult<&mut Self> {
        let data: &[u8] = *buf;
        if data.len() < length {
            return Err(FieldError::BufferUnderflow {
                needed: length,
                available: data.len(),
            });
        }
        let (head, rest) = data.split_at(length);
        self.value = self.field.value_from_bytes(head, high_byte);
        *buf = rest;
        Ok(self)
    }

    /// Fully reduces the internal representation, resetting the addition
    /// budget of bounded fields.
    pub fn set_reduced(&mut self) -> &mut Self {
        self.field.reduce_in_place(&mut self.value);
        self
    }

    /// Takes the value of `b` if `set` is 1, otherwise keeps its own.
    pub fn conditional_set(&mut self, b: &impl FieldElement<Field = F>, set: Choice) -> &mut Self {
        check_same_field(&self.field, b.field());
        self.field.conditional_assign(&mut self.value, b.value(), set);
        self
    }

    /// Exchanges values with `b` if `swap` is 1.
    pub fn conditional_swap_with(&mut self, b: &mut MutableElement<F>, swap: Choice) {
        check_same_field(&self.field, &b.field);
        self.field.conditional_swap(&mut self.value, &mut b.value, swap);
    }
}

impl<F: Field> fmt::Debug for MutableElement<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MutableElement({:#x})", self.as_big_integer())
    }
}

impl<F: Field> fmt::Display for MutableElement<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_big_integer())
    }
}
