//! Various convenience utilities for splitting 36-bit DPS-8 words
//! into smaller components and for joining them together.
use std::ops::Shl;

use crate::unsigned::{Unsigned18Bit, Unsigned36Bit};

/// Split a 36-bit word into two 18-bit values.
pub fn split_halves(w: Unsigned36Bit) -> (Unsigned18Bit, Unsigned18Bit) {
    (left_half(w), right_half(w))
}

/// Join two 18-bit values into a 36-bit word.
pub fn join_halves(left: Unsigned18Bit, right: Unsigned18Bit) -> Unsigned36Bit {
    Unsigned36Bit::from(left).shl(18) | Unsigned36Bit::from(right)
}

/// Extract the right (less-significant) halfword from a full word.
pub fn right_half(word: Unsigned36Bit) -> Unsigned18Bit {
    Unsigned18Bit::truncating_from_u64(u64::from(word))
}

/// Extract the left (more-significant) halfword from a full word.
/// Page table words keep the page frame address here.
pub fn left_half(word: Unsigned36Bit) -> Unsigned18Bit {
    Unsigned18Bit::truncating_from_u64(u64::from(word) >> 18)
}

/// Extract the field of `word` whose least-significant bit is at
/// position `shift`, truncated to the width of `T`.
///
/// For example the R1 ring of an SDW is `field::<Unsigned3Bit>(even, 9)`.
pub fn field<T: Truncate>(word: Unsigned36Bit, shift: u32) -> T {
    T::truncate(u64::from(word) >> shift)
}

/// Types into which [`field`] can extract bits.
pub trait Truncate {
    fn truncate(bits: u64) -> Self;
}

macro_rules! truncate_impl {
    ($($t:ty)*) => {
        $(
            impl Truncate for $t {
                fn truncate(bits: u64) -> Self {
                    <$t>::truncating_from_u64(bits)
                }
            }
        )*
    }
}

truncate_impl!(
    crate::unsigned::Unsigned2Bit
    crate::unsigned::Unsigned3Bit
    crate::unsigned::Unsigned9Bit
    crate::unsigned::Unsigned12Bit
    crate::unsigned::Unsigned14Bit
    crate::unsigned::Unsigned15Bit
    crate::unsigned::Unsigned18Bit
    crate::unsigned::Unsigned24Bit
    crate::unsigned::Unsigned36Bit
);
