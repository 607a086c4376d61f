//! The prelude exports the fixed-width word types and the helpers
//! for taking DPS-8 machine words apart.  Providing this prelude is
//! the main purpose of the base crate.
pub use super::error::*;
pub use super::subword::{field, join_halves, left_half, right_half, split_halves};
pub use super::unsigned::*;
pub use super::{u2, u3, u9, u12, u14, u15, u18, u24, u36};
