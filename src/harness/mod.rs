//! Differential testing of a field representation against [`ReferenceField`].
//!
//! [`DifferentialHarness`] builds a reference field over the same modulus as
//! the field under test and drives both with identical randomized
//! operations, comparing canonical values after every step and byte output
//! after every iteration. Randomness comes from a `ChaCha20Rng` derived from
//! [`HarnessConfig::seed`] for each seed pair, so a failing run can be
//! replayed exactly.

use num_bigint::BigUint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use subtle::Choice;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::field::{Field, FieldElement, FieldError, ReferenceField};

pub mod ops;
pub mod pair;

pub use ops::{AddOp, MulOp, Seed, SeedValue, SetInput, SetOp};
pub use pair::TestPair;

/// Failures found by the harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("{op}: fast field produced {fast:#x}, reference produced {reference:#x} (operands {left:#x}, {right:#x})")]
    ValueMismatch {
        op: &'static str,
        left: BigUint,
        right: BigUint,
        fast: BigUint,
        reference: BigUint,
    },

    #[error("{op}: fast field wrote {}, reference wrote {}", hex::encode(.fast), hex::encode(.reference))]
    BytesMismatch {
        op: &'static str,
        fast: Vec<u8>,
        reference: Vec<u8>,
    },

    /// The field under test failed where the reference succeeded, even
    /// after reducing its operands.
    #[error("{op}: fast field failed where the reference succeeded")]
    UnexpectedFailure {
        op: &'static str,
        #[source]
        source: FieldError,
    },

    #[error("{op}: reference field failed")]
    ReferenceFailure {
        op: &'static str,
        #[source]
        source: FieldError,
    },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Result type for harness runs
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Parameters for a harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Iterations of the operation sequence per seed pair
    pub iterations: usize,
    /// Self-additions attempted by the overflow test
    pub overflow_repeats: usize,
    /// Length of an element's byte encoding, excluding the high byte
    pub field_bytes: usize,
    pub seed: u64,
}

impl HarnessConfig {
    pub fn new(field_bytes: usize) -> Self {
        Self {
            iterations: 500,
            overflow_repeats: 2000,
            field_bytes,
            seed: 0x5eed,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_overflow_repeats(mut self, overflow_repeats: usize) -> Self {
        self.overflow_repeats = overflow_repeats;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Number of successful self-additions before the field under test raised
/// its capacity error, per path. `None` means it never did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowOutcome {
    pub mutable: Option<usize>,
    pub immutable: Option<usize>,
}

/// Summary of a passing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessReport {
    pub overflow: OverflowOutcome,
    pub seed_pairs: usize,
    /// Operations checked across all seed pairs
    pub checks: usize,
}

/// Drives a field under test and the reference field in lockstep.
#[derive(Debug, Clone)]
pub struct DifferentialHarness<F: Field> {
    fast: F,
    reference: ReferenceField,
    config: HarnessConfig,
}

impl<F: Field> DifferentialHarness<F> {
    pub fn new(fast: F, config: HarnessConfig) -> HarnessResult<Self> {
        let reference = ReferenceField::new(fast.size().clone())?;
        Ok(Self {
            fast,
            reference,
            config,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the overflow test followed by the operation-sequence test.
    pub fn run(&self) -> HarnessResult<HarnessReport> {
        let overflow = self.overflow_test()?;
        let seed_pairs = Seed::ALL.len() * Seed::ALL.len();
        let checks = self.sequence_test()?;
        Ok(HarnessReport {
            overflow,
            seed_pairs,
            checks,
        })
    }

    fn rng_for(&self, stream: u64) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        rng.set_stream(stream);
        rng
    }

    /// Adds a value to itself [`HarnessConfig::overflow_repeats`] times, first
    /// in place and then through immutable `add`, checking every step until
    /// the field under test reports overflow.
    pub fn overflow_test(&self) -> HarnessResult<OverflowOutcome> {
        let mut rng = self.rng_for(0);
        let seed: Seed = rng.gen();
        let value = seed.draw(&mut rng, self.config.field_bytes);

        let mut pair = TestPair::from_seed(&self.fast, &self.reference, &value);
        let mut mutable = None;
        for step in 0..self.config.overflow_repeats {
            let operands = (pair.value(), pair.value());
            let reference_snapshot = pair.reference.fixed();
            pair.reference
                .set_sum(&reference_snapshot)
                .map_err(|source| HarnessError::ReferenceFailure { op: "set_sum", source })?;

            let fast_snapshot = pair.fast.fixed();
            let result = pair.fast.set_sum(&fast_snapshot).map(|_| ());
            match result {
                Ok(()) => pair.check("set_sum", &operands)?,
                Err(FieldError::Overflow { .. }) => {
                    mutable = Some(step);
                    break;
                }
                Err(source) => return Err(HarnessError::UnexpectedFailure { op: "set_sum", source }),
            }
        }

        let mut fast = value.realize(&self.fast);
        let mut reference = value.realize(&self.reference);
        let mut immutable = None;
        for step in 0..self.config.overflow_repeats {
            let operands = (reference.as_big_integer(), reference.as_big_integer());
            reference = reference
                .add(&reference)
                .map_err(|source| HarnessError::ReferenceFailure { op: "add", source })?;

            match fast.add(&fast) {
                Ok(sum) => fast = sum,
                Err(FieldError::Overflow { .. }) => {
                    immutable = Some(step);
                    break;
                }
                Err(source) => return Err(HarnessError::UnexpectedFailure { op: "add", source }),
            }
            let pair = TestPair::new(fast.mutable(), reference.mutable());
            pair.check("add", &operands)?;
        }

        Ok(OverflowOutcome { mutable, immutable })
    }

    /// Runs [`HarnessConfig::iterations`] iterations for every ordered pair
    /// of seeds and returns the number of checks performed.
    pub fn sequence_test(&self) -> HarnessResult<usize> {
        let pairs: Vec<(usize, Seed, Seed)> = Seed::ALL
            .iter()
            .flat_map(|&a| Seed::ALL.iter().map(move |&b| (a, b)))
            .enumerate()
            .map(|(i, (a, b))| (i, a, b))
            .collect();

        #[cfg(feature = "parallel")]
        let counts: Vec<HarnessResult<usize>> = pairs
            .par_iter()
            .map(|&(i, a, b)| self.run_seed_pair(i, a, b))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let counts: Vec<HarnessResult<usize>> = pairs
            .iter()
            .map(|&(i, a, b)| self.run_seed_pair(i, a, b))
            .collect();

        counts.into_iter().sum()
    }

    fn run_seed_pair(&self, index: usize, left_seed: Seed, right_seed: Seed) -> HarnessResult<usize> {
        let mut rng = self.rng_for(index as u64 + 1);
        let field_bytes = self.config.field_bytes;

        let left_value = left_seed.draw(&mut rng, field_bytes);
        let right_value = right_seed.draw(&mut rng, field_bytes);
        let mut left = TestPair::from_seed(&self.fast, &self.reference, &left_value);
        let mut right = TestPair::from_seed(&self.fast, &self.reference, &right_value);

        let mut checks = 0;
        for _ in 0..self.config.iterations {
            checks += self.iteration(&mut rng, &mut left, &mut right)?;
        }
        Ok(checks)
    }

    /// Applies an additive operation to both sides and checks the result.
    ///
    /// If the field under test runs out of addition budget, both of its
    /// operands are reduced and the operation is retried once; a second
    /// failure is reported as [`HarnessError::UnexpectedFailure`].
    pub fn add_step(
        &self,
        op: AddOp,
        left: &mut TestPair<F>,
        right: &mut TestPair<F>,
    ) -> HarnessResult<()> {
        let operands = (left.value(), right.value());
        op.apply(&mut left.reference, &right.reference)
            .map_err(|source| HarnessError::ReferenceFailure { op: op.name(), source })?;
        match op.apply(&mut left.fast, &right.fast) {
            Ok(()) => {}
            Err(FieldError::Overflow { .. }) => {
                left.fast.set_reduced();
                right.fast.set_reduced();
                op.apply(&mut left.fast, &right.fast)
                    .map_err(|source| HarnessError::UnexpectedFailure { op: op.name(), source })?;
            }
            Err(source) => return Err(HarnessError::UnexpectedFailure { op: op.name(), source }),
        }
        left.check(op.name(), &operands)
    }

    /// One iteration of the operation sequence. Returns the number of checks.
    fn iteration(
        &self,
        rng: &mut ChaCha20Rng,
        left: &mut TestPair<F>,
        right: &mut TestPair<F>,
    ) -> HarnessResult<usize> {
        // Additive step
        let op: AddOp = rng.gen();
        self.add_step(op, left, right)?;

        // Bring the left operand back to a product
        let operands = (left.value(), left.value());
        left.fast.set_square();
        left.reference.set_square();
        left.check("set_square", &operands)?;

        // Multiplicative step
        let op: MulOp = rng.gen();
        let small: u32 = rng.gen();
        let operands = (left.value(), right.value());
        op.apply(&mut left.fast, &right.fast, small);
        op.apply(&mut left.reference, &right.reference, small);
        left.check(op.name(), &operands)?;

        // Conditional swap
        let swap = Choice::from(rng.gen::<u8>() & 1);
        let operands = (left.value(), right.value());
        left.conditional_swap_with(right, swap);
        left.check("conditional_swap_with", &operands)?;
        right.check("conditional_swap_with", &operands)?;

        // Overwrite the left operand
        let op: SetOp = rng.gen();
        let input = SetInput::sample(rng, self.config.field_bytes);
        let operands = (left.value(), right.value());
        op.apply(&mut left.reference, &right.reference, &input)
            .map_err(|source| HarnessError::ReferenceFailure { op: op.name(), source })?;
        op.apply(&mut left.fast, &right.fast, &input)
            .map_err(|source| HarnessError::UnexpectedFailure { op: op.name(), source })?;
        left.check(op.name(), &operands)?;

        // Byte output, into a window prefilled with garbage
        let mut window = vec![0u8; rng.gen_range(0..=self.config.field_bytes + 1)];
        rng.fill(&mut window[..]);
        left.check_bytes(&window)?;
        left.check_sum_bytes(right, &window)?;

        Ok(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithmetic::field::MontgomeryField;
    use crate::field::KnownPrime;

    #[test]
    fn test_config_builder() {
        let config = HarnessConfig::new(32)
            .with_iterations(3)
            .with_overflow_repeats(10)
            .with_seed(99);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.overflow_repeats, 10);
        assert_eq!(config.field_bytes, 32);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_reference_against_itself() {
        let field = ReferenceField::new(BigUint::from(1_000_003u32)).unwrap();
        let harness = DifferentialHarness::new(field, HarnessConfig::new(3).with_iterations(20)).unwrap();
        let report = harness.run().unwrap();
        assert_eq!(report.overflow, OverflowOutcome { mutable: None, immutable: None });
        assert_eq!(report.seed_pairs, 36);
        assert_eq!(report.checks, 36 * 20 * 8);
    }

    #[test]
    fn test_montgomery_small_prime() {
        let field = MontgomeryField::with_max_adds(BigUint::from(65_537u32), 2).unwrap();
        let harness = DifferentialHarness::new(field, HarnessConfig::new(2).with_iterations(50)).unwrap();
        let report = harness.run().unwrap();
        assert_eq!(report.overflow, OverflowOutcome { mutable: Some(2), immutable: Some(2) });
    }

    /// A pair whose fast side has used up `adds` additions of budget.
    fn unreduced_pair(
        harness: &DifferentialHarness<MontgomeryField>,
        v: i64,
        adds: usize,
    ) -> TestPair<MontgomeryField> {
        let value = SeedValue::Integer(num_bigint::BigInt::from(v));
        let mut pair = TestPair::from_seed(&harness.fast, &harness.reference, &value);
        for _ in 0..adds {
            let zero = harness.fast.zero();
            pair.fast.set_sum(&zero).unwrap();
        }
        pair
    }

    #[test]
    fn test_add_step_reduces_and_retries() {
        let field = MontgomeryField::with_max_adds(BigUint::from(65_537u32), 1).unwrap();
        let harness = DifferentialHarness::new(field, HarnessConfig::new(2)).unwrap();

        for op in [AddOp::Add, AddOp::Subtract, AddOp::SetSum, AddOp::SetDifference] {
            let mut left = unreduced_pair(&harness, 40_000, 1);
            let mut right = unreduced_pair(&harness, 30_000, 1);
            assert_eq!(left.fast.value().num_adds(), 1);

            // Without the reduction this operation would need a budget of two.
            let mut copy = left.fast.fixed().mutable();
            assert!(matches!(
                op.apply(&mut copy, &right.fast),
                Err(FieldError::Overflow { required: 2, limit: 1 })
            ));

            harness.add_step(op, &mut left, &mut right).unwrap();
            assert_eq!(left.fast.value().num_adds(), 1, "{}", op.name());
            assert_eq!(right.fast.value().num_adds(), 0, "{}", op.name());
            assert_eq!(left.fast.as_big_integer(), left.reference.as_big_integer());
        }
    }

    #[test]
    fn test_add_step_reports_second_failure() {
        let field = MontgomeryField::with_max_adds(BigUint::from(65_537u32), 0).unwrap();
        let harness = DifferentialHarness::new(field, HarnessConfig::new(2)).unwrap();
        let mut left = unreduced_pair(&harness, 3, 0);
        let mut right = unreduced_pair(&harness, 4, 0);

        match harness.add_step(AddOp::SetSum, &mut left, &mut right) {
            Err(HarnessError::UnexpectedFailure { op, source }) => {
                assert_eq!(op, "set_sum");
                assert_eq!(source, FieldError::Overflow { required: 1, limit: 0 });
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Operations that add nothing still pass.
        harness.add_step(AddOp::TakeRight, &mut left, &mut right).unwrap();
        assert_eq!(left.value(), BigUint::from(4u32));
    }

    #[test]
    fn test_runs_are_reproducible() {
        let prime = KnownPrime::Poly1305;
        let field = MontgomeryField::new(prime.modulus().clone()).unwrap();
        let config = HarnessConfig::new(prime.field_bytes()).with_iterations(5).with_seed(3);
        let harness = DifferentialHarness::new(field, config).unwrap();

        let mut a = harness.rng_for(4);
        let mut b = harness.rng_for(4);
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        assert_ne!(harness.rng_for(5).gen::<u64>(), harness.rng_for(4).gen::<u64>());
        assert_eq!(harness.run().unwrap(), harness.run().unwrap());
    }
}
