//! modp: arithmetic modulo a fixed prime for elliptic-curve cryptography
//!
//! This library provides a pluggable field abstraction with an
//! arbitrary-precision reference representation, a bounded Montgomery
//! representation with lazy additions, and a differential harness that
//! checks one against the other.

pub mod arithmetic;
pub mod field;
pub mod harness;
pub mod util;

// Re-export commonly used types
pub use arithmetic::field::MontgomeryField;
pub use field::{
    Element, Field, FieldElement, FieldError, FieldResult, KnownPrime, MutableElement,
    ReferenceField,
};
pub use harness::{DifferentialHarness, HarnessConfig, HarnessError, HarnessReport, TestPair};

/// Feature flags
#[cfg(feature = "parallel")]
pub use rayon;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
