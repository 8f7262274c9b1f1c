pub mod field;
pub mod montgomery;

pub use field::{MontgomeryField, MAX_ADDS_LIMIT, MontgomerySmall, MontgomeryValue};
