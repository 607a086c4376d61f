//! The `base` crate defines the DPS-8 machine word types which are
//! useful to every part of the simulator.  The idea is that
//! something which only needs to take machine words apart (a dump
//! formatter, for example) would depend on the base crate but would
//! not need to depend on the appending unit itself.

mod error;
mod unsigned;

pub mod prelude;
pub mod subword;
pub use crate::unsigned::*;

#[macro_export]
macro_rules! u2 {
    ($n:expr) => {
        $crate::prelude::Unsigned2Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u3 {
    ($n:expr) => {
        $crate::prelude::Unsigned3Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u9 {
    ($n:expr) => {
        $crate::prelude::Unsigned9Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u12 {
    ($n:expr) => {
        $crate::prelude::Unsigned12Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u14 {
    ($n:expr) => {
        $crate::prelude::Unsigned14Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u15 {
    ($n:expr) => {
        $crate::prelude::Unsigned15Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u18 {
    ($n:expr) => {
        $crate::prelude::Unsigned18Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u24 {
    ($n:expr) => {
        $crate::prelude::Unsigned24Bit::new::<{ $n }>()
    };
}

#[macro_export]
macro_rules! u36 {
    ($n:expr) => {
        $crate::prelude::Unsigned36Bit::new::<{ $n }>()
    };
}

#[test]
fn test_u36() {
    use prelude::Unsigned36Bit;
    let m: Unsigned36Bit = u36!(40_u64);
    let n: Unsigned36Bit = Unsigned36Bit::from(40_u32);
    assert_eq!(m, n);

    let p: Unsigned36Bit = u36!(1u64 << 34);
    let q: Unsigned36Bit =
        Unsigned36Bit::try_from(1u64 << 34).expect("test data should be in range");
    assert_eq!(p, q);
}

#[test]
fn test_u24() {
    use prelude::Unsigned24Bit;
    let p: Unsigned24Bit = u24!(0o77777777);
    assert_eq!(p, Unsigned24Bit::MAX);
}

#[test]
fn test_u3() {
    use prelude::Unsigned3Bit;
    let p: Unsigned3Bit = u3!(5);
    let q: Unsigned3Bit = Unsigned3Bit::try_from(5_u8).expect("test data should be in range");
    assert_eq!(p, q);
}
