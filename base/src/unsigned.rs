//! Unsigned types of the various bit widths which appear in DPS-8
//! registers and descriptor words.  The 36-bit machine word itself
//! is [`Unsigned36Bit`]; absolute (physical) addresses are
//! [`Unsigned24Bit`]; word offsets within a segment are
//! [`Unsigned18Bit`]; segment numbers are [`Unsigned15Bit`]; ring
//! numbers are [`Unsigned3Bit`].
//!
//! Bit numbering used by the methods of these types counts from the
//! least-significant bit (bit 0).  The DPS-8 documentation numbers
//! bits from the other end, so a field documented as "bits 33-35"
//! of a word is bits 0-2 here.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter, Octal};
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::error::ConversionFailed;

#[cfg(test)]
mod tests;

/// This macro implements conversions from native types to Unsigned*Bit
/// which are always possible (e.g. From<u8> for Unsigned18Bit).
macro_rules! from_native_type_to_self {
    ($SelfT:ty, $($from:ty)*) => {
        $(
            impl From<$from> for $SelfT {
                fn from(n: $from) -> Self {
                    Self {
                        bits: n.into(),
                    }
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types which are always possible (e.g. From<Unsigned15Bit> for i16).
macro_rules! from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl From<$SelfT> for $to {
                fn from(n: $SelfT) -> $to {
                    // The range of n.bits is narrower than the range
                    // of its storage type, so this cast cannot lose
                    // information even where `.into()` is not
                    // available (e.g. u16 -> i16 for Unsigned15Bit).
                    n.bits as $to
                }
            }
        )*
    }
}

/// This macro implements conversions from Unsigned*Bit to native
/// types where the conversion may not always fit.  For example
/// TryFrom<Unsigned18Bit> for u8.
macro_rules! try_from_self_to_native_type {
    ($SelfT:ty, $($to:ty)*) => {
        $(
            impl TryFrom<$SelfT> for $to {
                type Error = ConversionFailed;
                fn try_from(n: $SelfT) -> Result<$to, ConversionFailed> {
                    <$to>::try_from(n.bits).map_err(|_| ConversionFailed::TooLarge)
                }
            }
        )*
    }
}

/// This macro implements a conversions from native types to
/// Unsigned*Bit where the conversion may not always fit.  For example
/// TryFrom<u64> for Unsigned36Bit.
macro_rules! try_from_native_type_to_self {
    ($SelfT:ty, $InnerT:ty, $($from:ty)*) => {
        $(
            impl TryFrom<$from> for $SelfT {
                type Error = ConversionFailed;
                fn try_from(n: $from) -> Result<Self, ConversionFailed> {
                    let bits: $InnerT = match n.try_into() {
                        Err(_) => {
                            // This macro is also used for unsigned
                            // source types, where this test is
                            // always false.
                            #[allow(unused_comparisons)]
                            if n < 0 {
                                return Err(ConversionFailed::TooSmall);
                            } else {
                                return Err(ConversionFailed::TooLarge);
                            }
                        }
                        Ok(value) if value > Self::VALUE_BITS => {
                            return Err(ConversionFailed::TooLarge);
                        }
                        Ok(value) => value,
                    };
                    Ok(Self { bits })
                }
            }
        )*
    }
}

/// This macro implements lossless conversion from a narrower
/// Unsigned*Bit type to a wider one.
macro_rules! from_narrower_word {
    ($SelfT:ty, $($from:ty)*) => {
        $(
            impl From<$from> for $SelfT {
                fn from(n: $from) -> Self {
                    Self {
                        bits: n.bits.into(),
                    }
                }
            }
        )*
    }
}

/// This macro implements checked conversion from a wider
/// Unsigned*Bit type to a narrower one.
macro_rules! try_from_wider_word {
    ($SelfT:ty, $InnerT:ty, $($from:ty)*) => {
        $(
            impl TryFrom<$from> for $SelfT {
                type Error = ConversionFailed;
                fn try_from(n: $from) -> Result<Self, ConversionFailed> {
                    match <$InnerT>::try_from(n.bits) {
                        Ok(bits) if bits <= Self::VALUE_BITS => Ok(Self { bits }),
                        _ => Err(ConversionFailed::TooLarge),
                    }
                }
            }
        )*
    }
}

/// This macro implements the base functionality of the unsigned
/// types.  The `SelfT` argument is the name of the type we are
/// defining.  `BITS` is the bit width of the type we are defining.
/// `InnerT` is the name of the native type which will store those
/// bits.
macro_rules! unsigned_word_impl {
    ($SelfT:ty, $BITS:expr, $InnerT:ty) => {
        impl $SelfT {
            const MODULUS: $InnerT = (1 << $BITS);
            const VALUE_BITS: $InnerT = Self::MODULUS - 1;

            /// The width of this type, in bits.
            pub const BITS: u32 = $BITS;

            pub const MAX: Self = Self {
                bits: Self::MODULUS - 1,
            };

            pub const ZERO: Self = Self { bits: 0 };
            pub const ONE: Self = Self { bits: 1 };
            pub const MIN: Self = Self::ZERO;

            // This will always fail at compile time, so no need to
            // hide it.  It's pub so that it can be used in u36!() and
            // similar.
            pub const fn new<const N: $InnerT>() -> $SelfT {
                type Word = $SelfT;
                struct Helper<const M: $InnerT>;
                impl<const M: $InnerT> Helper<M> {
                    const U: Word = {
                        if M > Word::MAX.bits {
                            panic!("input value is out of range")
                        } else {
                            Word {
                                bits: Word::MAX.bits & M,
                            }
                        }
                    };
                }
                Helper::<N>::U
            }

            /// Keep only the low-order `BITS` bits of `n`.  This is
            /// the way field values are extracted from machine words
            /// (e.g. `(w >> 12) & 077777777`).
            pub const fn truncating_from_u64(n: u64) -> Self {
                Self {
                    bits: (n & (Self::VALUE_BITS as u64)) as $InnerT,
                }
            }

            pub const fn is_zero(&self) -> bool {
                self.bits == 0
            }

            /// Test bit `n`, counting from the least-significant end.
            pub const fn bit(&self, n: u32) -> bool {
                n < $BITS && (self.bits >> n) & 1 != 0
            }

            /// Return a copy of `self` with bit `n` (counting from the
            /// least-significant end) set to `value`.
            pub const fn with_bit(self, n: u32, value: bool) -> Self {
                if n >= $BITS {
                    self
                } else if value {
                    Self {
                        bits: self.bits | (1 << n),
                    }
                } else {
                    Self {
                        bits: self.bits & !(1 << n),
                    }
                }
            }

            pub fn wrapping_add(self, rhs: $SelfT) -> $SelfT {
                Self {
                    bits: self.bits.wrapping_add(rhs.bits) & Self::VALUE_BITS,
                }
            }

            pub fn wrapping_sub(self, rhs: $SelfT) -> $SelfT {
                Self {
                    bits: (self.bits + Self::MODULUS).wrapping_sub(rhs.bits) & Self::VALUE_BITS,
                }
            }

            pub fn checked_add(self, rhs: $SelfT) -> Option<$SelfT> {
                match self.bits.checked_add(rhs.bits) {
                    Some(result) => Self::try_from(result).ok(),
                    None => None,
                }
            }

            pub fn checked_sub(self, rhs: $SelfT) -> Option<$SelfT> {
                match self.bits.checked_sub(rhs.bits) {
                    Some(result) => Self::try_from(result).ok(),
                    None => None,
                }
            }

            // We cannot call std::ops::BitAnd in a const because trait
            // methods cannot be const.  So we have this work-alike in
            // impl, since it can be called in a const context.
            pub const fn and(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }

            // We cannot call std::ops::BitOr in a const because trait
            // methods cannot be const.  So we have this work-alike in
            // impl, since it can be called in a const context.
            pub const fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl Default for $SelfT {
            fn default() -> Self {
                Self { bits: 0 }
            }
        }

        impl Display for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Octal for $SelfT {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
                Octal::fmt(&self.bits, f)
            }
        }

        impl Debug for $SelfT {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($SelfT), "{{bits: {:#o}}}"), self.bits)
            }
        }

        impl Hash for $SelfT {
            fn hash<H>(&self, state: &mut H)
            where
                H: Hasher,
            {
                self.bits.hash(state)
            }
        }

        impl<T> PartialEq<T> for $SelfT
        where
            T: TryInto<$SelfT> + Copy,
        {
            fn eq(&self, other: &T) -> bool {
                let converted: Result<$SelfT, _> = (*other).try_into();
                match converted {
                    Ok(rhs) => self.bits == rhs.bits,
                    Err(_) => false,
                }
            }
        }

        impl Eq for $SelfT {}

        impl PartialOrd<$SelfT> for $SelfT {
            fn partial_cmp(&self, other: &$SelfT) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl PartialOrd<u32> for $SelfT {
            fn partial_cmp(&self, other: &u32) -> Option<Ordering> {
                match <$SelfT>::try_from(*other) {
                    Ok(value) => Some(self.cmp(&value)),
                    // The error case tells us that `other` doesn't fit
                    // into $SelfT, so `other` must be greater.
                    Err(_) => Some(Ordering::Less),
                }
            }
        }

        impl PartialOrd<u64> for $SelfT {
            fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
                match <$SelfT>::try_from(*other) {
                    Ok(value) => Some(self.cmp(&value)),
                    Err(_) => Some(Ordering::Less),
                }
            }
        }

        impl Ord for $SelfT {
            fn cmp(&self, other: &$SelfT) -> Ordering {
                self.bits.cmp(&other.bits)
            }
        }

        impl std::ops::Not for $SelfT {
            type Output = Self;
            fn not(self) -> Self {
                Self {
                    bits: (!self.bits) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitAnd<$InnerT> for $SelfT {
            type Output = Self;
            fn bitand(self, mask: $InnerT) -> Self {
                Self {
                    bits: self.bits & mask,
                }
            }
        }

        impl std::ops::BitAnd<$SelfT> for $SelfT {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                self.bitand(rhs.bits)
            }
        }

        impl std::ops::BitOr<$InnerT> for $SelfT {
            type Output = Self;
            fn bitor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits | mask) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitOr for $SelfT {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.bitor(rhs.bits)
            }
        }

        impl std::ops::BitXor<$InnerT> for $SelfT {
            type Output = Self;
            fn bitxor(self, mask: $InnerT) -> Self {
                Self {
                    bits: (self.bits ^ mask) & Self::VALUE_BITS,
                }
            }
        }

        impl std::ops::BitXor for $SelfT {
            type Output = Self;
            fn bitxor(self, rhs: Self) -> Self {
                self.bitxor(rhs.bits)
            }
        }

        // Shifts are logical (not rotating), as in the DPS-8 address
        // arithmetic: bits shifted off either end are lost and zeroes
        // are shifted in.
        impl std::ops::Shr<u32> for $SelfT {
            type Output = $SelfT;
            fn shr(self, shift_by: u32) -> Self {
                Self {
                    bits: self.bits.checked_shr(shift_by).unwrap_or(0),
                }
            }
        }

        impl std::ops::Shl<u32> for $SelfT {
            type Output = $SelfT;
            fn shl(self, shift_by: u32) -> Self {
                let bits = if shift_by >= $BITS {
                    0
                } else {
                    (self.bits << shift_by) & Self::VALUE_BITS
                };
                Self { bits }
            }
        }
    };
}

/// `Unsigned2Bit` holds the fault code (FC) field of a segment or
/// page descriptor; it selects which directed fault is taken when
/// the descriptor is not present.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned2Bit {
    pub(crate) bits: u8,
}

/// `Unsigned3Bit` is a ring number (0 is the most privileged ring).
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned3Bit {
    pub(crate) bits: u8,
}

/// `Unsigned9Bit` is the opcode field of an instruction word.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned9Bit {
    pub(crate) bits: u16,
}

/// `Unsigned12Bit` holds the page-number key of a PTWAM entry and
/// the stack base field of the DSBR.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned12Bit {
    pub(crate) bits: u16,
}

/// `Unsigned14Bit` is a segment bound (in units of 16 words) or an
/// entry bound.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned14Bit {
    pub(crate) bits: u16,
}

/// `Unsigned15Bit` is a segment number.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned15Bit {
    pub(crate) bits: u16,
}

/// `Unsigned18Bit` is half of a machine word.  It is the width of a
/// computed (word) address within a segment and of a page frame
/// address held in a page table word.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned18Bit {
    pub(crate) bits: u32,
}

/// `Unsigned24Bit` is an absolute main-memory address.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned24Bit {
    pub(crate) bits: u32,
}

/// `Unsigned36Bit` is the DPS-8 machine word.
#[derive(Clone, Copy, Serialize)]
pub struct Unsigned36Bit {
    pub(crate) bits: u64,
}

unsigned_word_impl!(Unsigned2Bit, 2, u8);
unsigned_word_impl!(Unsigned3Bit, 3, u8);
unsigned_word_impl!(Unsigned9Bit, 9, u16);
unsigned_word_impl!(Unsigned12Bit, 12, u16);
unsigned_word_impl!(Unsigned14Bit, 14, u16);
unsigned_word_impl!(Unsigned15Bit, 15, u16);
unsigned_word_impl!(Unsigned18Bit, 18, u32);
unsigned_word_impl!(Unsigned24Bit, 24, u32);
unsigned_word_impl!(Unsigned36Bit, 36, u64);

////////////////////////////////////////////////////////////////////////
// Unsigned2Bit, Unsigned3Bit
////////////////////////////////////////////////////////////////////////

from_self_to_native_type!(Unsigned2Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned2Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

from_self_to_native_type!(Unsigned3Bit, u8 i8 u16 i16 u32 i32 u64 i64 usize isize);
try_from_native_type_to_self!(Unsigned3Bit, u8, i8 u8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned9Bit
////////////////////////////////////////////////////////////////////////

// all the things that always fit into Unsigned9Bit
from_native_type_to_self!(Unsigned9Bit, u8);
// all the things that Unsigned9Bit always fits into
from_self_to_native_type!(Unsigned9Bit, u16 i16 u32 i32 u64 i64 usize isize);
// all the things that Unsigned9Bit may not fit into
try_from_self_to_native_type!(Unsigned9Bit, u8 i8);
// all the things that may not fit into Unsigned9Bit
try_from_native_type_to_self!(Unsigned9Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned12Bit, Unsigned14Bit, Unsigned15Bit
////////////////////////////////////////////////////////////////////////

from_native_type_to_self!(Unsigned12Bit, u8);
from_self_to_native_type!(Unsigned12Bit, u16 i16 u32 i32 u64 i64 usize isize);
try_from_self_to_native_type!(Unsigned12Bit, u8 i8);
try_from_native_type_to_self!(Unsigned12Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

from_native_type_to_self!(Unsigned14Bit, u8);
from_self_to_native_type!(Unsigned14Bit, u16 i16 u32 i32 u64 i64 usize isize);
try_from_self_to_native_type!(Unsigned14Bit, u8 i8);
try_from_native_type_to_self!(Unsigned14Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

from_native_type_to_self!(Unsigned15Bit, u8);
from_self_to_native_type!(Unsigned15Bit, u16 i16 u32 i32 u64 i64 usize isize);
try_from_self_to_native_type!(Unsigned15Bit, u8 i8);
try_from_native_type_to_self!(Unsigned15Bit, u16, i8 u16 i16 u32 i32 u64 i64 usize isize);

////////////////////////////////////////////////////////////////////////
// Unsigned18Bit
////////////////////////////////////////////////////////////////////////

from_native_type_to_self!(Unsigned18Bit, u8 u16);
from_self_to_native_type!(Unsigned18Bit, u32 i32 u64 i64 usize isize);
try_from_self_to_native_type!(Unsigned18Bit, u8 i8 u16 i16);
try_from_native_type_to_self!(Unsigned18Bit, u32, i8 i16 u32 i32 u64 i64 usize isize);
from_narrower_word!(Unsigned18Bit, Unsigned2Bit Unsigned3Bit Unsigned9Bit Unsigned12Bit Unsigned14Bit Unsigned15Bit);
try_from_wider_word!(Unsigned18Bit, u32, Unsigned24Bit Unsigned36Bit);

////////////////////////////////////////////////////////////////////////
// Unsigned24Bit
////////////////////////////////////////////////////////////////////////

from_native_type_to_self!(Unsigned24Bit, u8 u16);
from_self_to_native_type!(Unsigned24Bit, u32 i32 u64 i64 usize isize);
try_from_self_to_native_type!(Unsigned24Bit, u8 i8 u16 i16);
try_from_native_type_to_self!(Unsigned24Bit, u32, i8 i16 u32 i32 u64 i64 usize isize);
from_narrower_word!(Unsigned24Bit, Unsigned15Bit Unsigned18Bit);
try_from_wider_word!(Unsigned24Bit, u32, Unsigned36Bit);

////////////////////////////////////////////////////////////////////////
// Unsigned36Bit
////////////////////////////////////////////////////////////////////////

from_native_type_to_self!(Unsigned36Bit, u8 u16 u32);
from_self_to_native_type!(Unsigned36Bit, u64 i64);
try_from_self_to_native_type!(Unsigned36Bit, u8 i8 u16 i16 u32 i32 usize);
try_from_native_type_to_self!(Unsigned36Bit, u64, i8 i16 i32 u64 i64 usize);
from_narrower_word!(Unsigned36Bit, Unsigned2Bit Unsigned3Bit Unsigned9Bit Unsigned12Bit Unsigned14Bit Unsigned15Bit Unsigned18Bit Unsigned24Bit);

////////////////////////////////////////////////////////////////////////
// Narrowing conversions between the short types
////////////////////////////////////////////////////////////////////////

try_from_wider_word!(Unsigned14Bit, u16, Unsigned15Bit Unsigned18Bit);
try_from_wider_word!(Unsigned15Bit, u16, Unsigned18Bit Unsigned24Bit);
try_from_wider_word!(Unsigned12Bit, u16, Unsigned18Bit);
try_from_wider_word!(Unsigned3Bit, u8, Unsigned36Bit);
