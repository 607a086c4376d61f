use std::ops::Shl;
use std::ops::Shr;

use super::{
    ConversionFailed, Unsigned15Bit, Unsigned18Bit, Unsigned24Bit, Unsigned36Bit, Unsigned3Bit,
};

macro_rules! assert_octal_eq {
    ($left:expr_2021, $right:expr_2021 $(,)?) => {{
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    panic!(
                        "Assertion failed: {:>#012o} != {:>#012o}",
                        left_val, right_val
                    );
                }
            }
        }
    }};
}

#[test]
fn test_unsigned3bit_max() {
    assert_eq!(Unsigned3Bit::MAX.bits, 7);
}

#[test]
fn test_unsigned24bit_max() {
    assert_eq!(Unsigned24Bit::MAX.bits, 0xFF_FFFF);
}

#[test]
fn test_try_from_out_of_range() {
    assert_eq!(Unsigned3Bit::try_from(8_u8), Err(ConversionFailed::TooLarge));
    assert_eq!(Unsigned3Bit::try_from(-1_i8), Err(ConversionFailed::TooSmall));
    assert_eq!(
        Unsigned15Bit::try_from(0o100000_u32),
        Err(ConversionFailed::TooLarge)
    );
    assert_eq!(
        Unsigned24Bit::try_from(1_u32 << 24),
        Err(ConversionFailed::TooLarge)
    );
    assert_eq!(
        Unsigned36Bit::try_from(1_u64 << 36),
        Err(ConversionFailed::TooLarge)
    );
}

#[test]
fn test_narrowing_between_words() {
    let w = Unsigned36Bit::try_from(0o777_u32).unwrap();
    assert_eq!(Unsigned3Bit::try_from(w), Err(ConversionFailed::TooLarge));
    assert_eq!(
        Unsigned18Bit::try_from(w),
        Ok(Unsigned18Bit::try_from(0o777_u32).unwrap())
    );
    let a = Unsigned24Bit::try_from(0o1_000_000_u32).unwrap();
    assert_eq!(Unsigned18Bit::try_from(a), Err(ConversionFailed::TooLarge));
}

#[test]
fn test_widening_between_words() {
    let segno = Unsigned15Bit::try_from(0o77777_u16).unwrap();
    let as_offset: Unsigned18Bit = segno.into();
    assert_octal_eq!(as_offset, Unsigned18Bit::try_from(0o77777_u32).unwrap());
    let addr: Unsigned24Bit = Unsigned18Bit::MAX.into();
    assert_octal_eq!(addr, Unsigned24Bit::try_from(0o777777_u32).unwrap());
}

#[test]
fn test_truncating_from_u64() {
    assert_octal_eq!(
        Unsigned24Bit::truncating_from_u64(0o7_1234_5670_u64),
        Unsigned24Bit::try_from(0o1234_5670_u32).unwrap()
    );
    assert_eq!(Unsigned3Bit::truncating_from_u64(0o17), Unsigned3Bit::MAX);
}

#[test]
fn test_bit() {
    let w = Unsigned36Bit::try_from(0o1004_u64).unwrap();
    assert!(w.bit(2));
    assert!(w.bit(9));
    assert!(!w.bit(6));
    assert!(!w.bit(36));
    assert!(!w.bit(200));
}

#[test]
fn test_with_bit() {
    let w = Unsigned36Bit::ZERO.with_bit(9, true);
    assert_octal_eq!(w, Unsigned36Bit::try_from(0o1000_u64).unwrap());
    assert_octal_eq!(w.with_bit(6, true), Unsigned36Bit::try_from(0o1100_u64).unwrap());
    assert_octal_eq!(w.with_bit(9, false), Unsigned36Bit::ZERO);
    // Bits beyond the width of the type are ignored.
    assert_octal_eq!(w.with_bit(36, true), w);
}

#[test]
fn test_shifts_are_logical() {
    let w = Unsigned36Bit::try_from(0o400_000_000_001_u64).unwrap();
    assert_octal_eq!(w.shl(1), Unsigned36Bit::try_from(2_u64).unwrap());
    assert_octal_eq!(w.shr(1), Unsigned36Bit::try_from(0o200_000_000_000_u64).unwrap());
    assert_octal_eq!(w.shr(36), Unsigned36Bit::ZERO);
    assert_octal_eq!(w.shl(36), Unsigned36Bit::ZERO);
}

#[test]
fn test_bit_ops_stay_in_range() {
    let a = Unsigned24Bit::MAX;
    assert_eq!(!a, Unsigned24Bit::ZERO);
    assert_octal_eq!(a & 0o77777760_u32, Unsigned24Bit::try_from(0o77777760_u32).unwrap());
    assert_octal_eq!(Unsigned24Bit::ZERO | 0o777777777_u32, Unsigned24Bit::MAX);
    assert_octal_eq!(Unsigned3Bit::MAX ^ Unsigned3Bit::ONE, Unsigned3Bit::try_from(6_u8).unwrap());
}

#[test]
fn test_wrapping_add() {
    let max = Unsigned24Bit::MAX;
    assert_eq!(max.wrapping_add(Unsigned24Bit::ONE), Unsigned24Bit::ZERO);
    assert_eq!(max.checked_add(Unsigned24Bit::ONE), None);
}

#[test]
fn test_wrapping_sub() {
    assert_eq!(
        Unsigned18Bit::ZERO.wrapping_sub(Unsigned18Bit::ONE),
        Unsigned18Bit::MAX
    );
    assert_eq!(Unsigned18Bit::ZERO.checked_sub(Unsigned18Bit::ONE), None);
}

#[test]
fn test_compare_with_native() {
    let r = Unsigned3Bit::try_from(4_u8).unwrap();
    assert_eq!(r, 4_u8);
    assert_ne!(r, 5_u8);
    // Not representable, hence not equal.
    assert_ne!(r, 0o404_u32);
    assert!(r < 5_u32);
    assert!(r < 0o100_u64);
}

#[test]
fn test_display_is_octal() {
    let a = Unsigned24Bit::try_from(0o1000_u32).unwrap();
    assert_eq!(format!("{a}"), "1000");
    assert_eq!(format!("{a:o}"), "1000");
    assert_eq!(format!("{a:?}"), "Unsigned24Bit{bits: 0o1000}");
}

#[cfg(test)]
mod u3_proptests {
    use super::super::Unsigned3Bit;
    use test_strategy::{proptest, Arbitrary};

    #[derive(Debug, Arbitrary)]
    struct U3SubtractionTestInput {
        #[strategy(0..8u8)]
        greater: u8,
        #[strategy(0..=#greater)]
        lesser: u8,
    }

    #[proptest]
    fn wrapping_sub_and_checked_sub_give_same_result(input: U3SubtractionTestInput) {
        let lesser = Unsigned3Bit::try_from(input.lesser).unwrap();
        let greater = Unsigned3Bit::try_from(input.greater).unwrap();

        if let Some(diff) = greater.checked_sub(lesser) {
            let wdiff: Unsigned3Bit = greater.wrapping_sub(lesser);
            assert_eq!(diff, wdiff);
        }
    }

    #[proptest]
    fn ordering_matches_native(#[strategy(0..8u8)] a: u8, #[strategy(0..8u8)] b: u8) {
        let ra = Unsigned3Bit::try_from(a).unwrap();
        let rb = Unsigned3Bit::try_from(b).unwrap();
        assert_eq!(ra.cmp(&rb), a.cmp(&b));
    }
}

#[cfg(test)]
mod u24_proptests {
    use super::super::Unsigned24Bit;
    use test_strategy::proptest;

    #[proptest]
    fn truncation_keeps_low_bits(n: u64) {
        let a = Unsigned24Bit::truncating_from_u64(n);
        assert_eq!(u64::from(a), n & 0xFF_FFFF);
    }

    #[proptest]
    fn wrapping_add_is_modular(#[strategy(0..(1u32 << 24))] a: u32, #[strategy(0..(1u32 << 24))] b: u32) {
        let left = Unsigned24Bit::try_from(a).unwrap();
        let right = Unsigned24Bit::try_from(b).unwrap();
        assert_eq!(u32::from(left.wrapping_add(right)), (a + b) & 0xFF_FFFF);
    }
}

#[cfg(test)]
mod u36_proptests {
    use super::super::Unsigned36Bit;
    use test_strategy::proptest;

    #[proptest]
    fn with_bit_then_bit_round_trips(#[strategy(0..(1u64 << 36))] n: u64, #[strategy(0..36u32)] pos: u32) {
        let w = Unsigned36Bit::try_from(n).unwrap();
        assert!(w.with_bit(pos, true).bit(pos));
        assert!(!w.with_bit(pos, false).bit(pos));
    }
}
