//! Randomly chosen operations, applied identically to any field.

use num_bigint::{BigInt, BigUint};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use subtle::Choice;

use crate::field::{Element, Field, FieldElement, FieldResult, MutableElement};

/// Operations from the additive family. The result replaces the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Subtract,
    SetSum,
    SetDifference,
    /// Keep the left operand.
    TakeLeft,
    /// Replace the left operand with the right one.
    TakeRight,
}

impl AddOp {
    pub const ALL: [AddOp; 6] = [
        AddOp::Add,
        AddOp::Subtract,
        AddOp::SetSum,
        AddOp::SetDifference,
        AddOp::TakeLeft,
        AddOp::TakeRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AddOp::Add => "add",
            AddOp::Subtract => "subtract",
            AddOp::SetSum => "set_sum",
            AddOp::SetDifference => "set_difference",
            AddOp::TakeLeft => "take_left",
            AddOp::TakeRight => "take_right",
        }
    }

    /// Fails only with the field's capacity error, leaving `left` as it was.
    pub fn apply<G: Field>(
        self,
        left: &mut MutableElement<G>,
        right: &MutableElement<G>,
    ) -> FieldResult<()> {
        match self {
            AddOp::Add => {
                let sum = left.add(right)?;
                left.set_value(&sum);
            }
            AddOp::Subtract => {
                let difference = left.subtract(right)?;
                left.set_value(&difference);
            }
            AddOp::SetSum => {
                left.set_sum(right)?;
            }
            AddOp::SetDifference => {
                left.set_difference(right)?;
            }
            AddOp::TakeLeft => {}
            AddOp::TakeRight => {
                left.set_value(right);
            }
        }
        Ok(())
    }
}

impl Distribution<AddOp> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AddOp {
        AddOp::ALL[rng.gen_range(0..AddOp::ALL.len())]
    }
}

/// Operations from the multiplicative family. The result replaces the left
/// operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    Multiply,
    Square,
    SetProduct,
    SetSquare,
    SetProductSmall,
}

impl MulOp {
    pub const ALL: [MulOp; 5] = [
        MulOp::Multiply,
        MulOp::Square,
        MulOp::SetProduct,
        MulOp::SetSquare,
        MulOp::SetProductSmall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MulOp::Multiply => "multiply",
            MulOp::Square => "square",
            MulOp::SetProduct => "set_product",
            MulOp::SetSquare => "set_square",
            MulOp::SetProductSmall => "set_product_small",
        }
    }

    /// `small` is the constant used by [`MulOp::SetProductSmall`].
    pub fn apply<G: Field>(self, left: &mut MutableElement<G>, right: &MutableElement<G>, small: u32) {
        match self {
            MulOp::Multiply => {
                let product = left.multiply(right);
                left.set_value(&product);
            }
            MulOp::Square => {
                let square = left.square();
                left.set_value(&square);
            }
            MulOp::SetProduct => {
                left.set_product(right);
            }
            MulOp::SetSquare => {
                left.set_square();
            }
            MulOp::SetProductSmall => {
                let small = left.field().small_value(small);
                left.set_product_small(&small);
            }
        }
    }
}

impl Distribution<MulOp> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> MulOp {
        MulOp::ALL[rng.gen_range(0..MulOp::ALL.len())]
    }
}

/// Ways of overwriting the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// Copy the right operand.
    Value,
    /// Decode a window of a byte buffer.
    Bytes,
    /// Decode from the front of a byte cursor.
    Buffer,
    /// Take the right operand under a random choice bit.
    ConditionalSet,
}

impl SetOp {
    pub const ALL: [SetOp; 4] = [SetOp::Value, SetOp::Bytes, SetOp::Buffer, SetOp::ConditionalSet];

    pub fn name(self) -> &'static str {
        match self {
            SetOp::Value => "set_value",
            SetOp::Bytes => "set_value_bytes",
            SetOp::Buffer => "set_value_from_buf",
            SetOp::ConditionalSet => "conditional_set",
        }
    }

    pub fn apply<G: Field>(
        self,
        left: &mut MutableElement<G>,
        right: &MutableElement<G>,
        input: &SetInput,
    ) -> FieldResult<()> {
        match self {
            SetOp::Value => {
                left.set_value(right);
            }
            SetOp::Bytes => {
                left.set_value_bytes(input.window(), input.high_byte);
            }
            SetOp::Buffer => {
                let mut cursor = &input.data[input.offset..];
                left.set_value_from_buf(&mut cursor, input.length, input.high_byte)?;
            }
            SetOp::ConditionalSet => {
                left.conditional_set(right, Choice::from(input.choice));
            }
        }
        Ok(())
    }
}

impl Distribution<SetOp> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SetOp {
        SetOp::ALL[rng.gen_range(0..SetOp::ALL.len())]
    }
}

/// Random input shared by both sides of a [`SetOp`].
#[derive(Debug, Clone)]
pub struct SetInput {
    pub data: Vec<u8>,
    pub offset: usize,
    pub length: usize,
    pub high_byte: u8,
    pub choice: u8,
}

impl SetInput {
    /// Samples a buffer of `2 * field_bytes + 1` bytes with a window of at
    /// most `field_bytes` bytes inside it.
    pub fn sample<R: Rng>(rng: &mut R, field_bytes: usize) -> Self {
        let mut data = vec![0u8; 2 * field_bytes + 1];
        rng.fill(&mut data[..]);
        Self {
            data,
            offset: rng.gen_range(0..=field_bytes),
            length: rng.gen_range(0..=field_bytes),
            high_byte: rng.gen(),
            choice: rng.gen::<u8>() & 1,
        }
    }

    pub fn window(&self) -> &[u8] {
        &self.data[self.offset..self.offset + self.length]
    }
}

/// Short fixed pattern used by [`Seed::ShortBytes`].
const SHORT_PATTERN: [u8; 3] = [0x5a, 0x0f, 0xc3];

/// Starting values for the operation-sequence test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Random,
    Zero,
    One,
    ShortBytes,
    FullBytes,
    FullBytesWithHigh,
}

/// A seed with its random parts drawn, ready to be realized in any field.
#[derive(Debug, Clone)]
pub enum SeedValue {
    Integer(BigInt),
    Bytes(Vec<u8>, u8),
}

impl Seed {
    pub const ALL: [Seed; 6] = [
        Seed::Random,
        Seed::Zero,
        Seed::One,
        Seed::ShortBytes,
        Seed::FullBytes,
        Seed::FullBytesWithHigh,
    ];

    pub fn draw<R: Rng>(self, rng: &mut R, field_bytes: usize) -> SeedValue {
        match self {
            Seed::Random => {
                let mut bytes = vec![0u8; field_bytes + 1];
                rng.fill(&mut bytes[..]);
                SeedValue::Integer(BigInt::from(BigUint::from_bytes_le(&bytes)))
            }
            Seed::Zero => SeedValue::Integer(BigInt::from(0)),
            Seed::One => SeedValue::Integer(BigInt::from(1)),
            Seed::ShortBytes => SeedValue::Bytes(SHORT_PATTERN.to_vec(), 0),
            Seed::FullBytes => SeedValue::Bytes(random_bytes(rng, field_bytes), 0),
            Seed::FullBytesWithHigh => {
                let bytes = random_bytes(rng, field_bytes);
                SeedValue::Bytes(bytes, rng.gen())
            }
        }
    }
}

impl Distribution<Seed> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Seed {
        Seed::ALL[rng.gen_range(0..Seed::ALL.len())]
    }
}

impl SeedValue {
    pub fn realize<G: Field>(&self, field: &G) -> Element<G> {
        match self {
            SeedValue::Integer(v) => field.element(v),
            SeedValue::Bytes(bytes, high_byte) => field.element_from_bytes(bytes, *high_byte),
        }
    }
}

fn random_bytes<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}
