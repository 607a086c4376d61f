//! Segment descriptor words (SDWs) and page table words (PTWs), and
//! their layout in main memory.
//!
//! An SDW occupies an even/odd pair of words in the descriptor
//! segment:
//!
//! | word | field | bits (from the least-significant end) |
//! | ---- | ----- | ---- |
//! | even | ADDR  | 35-12 |
//! | even | R1, R2, R3 | 11-9, 8-6, 5-3 |
//! | even | DF (present) | 2 |
//! | even | FC | 1-0 |
//! | odd  | BOUND | 34-21 |
//! | odd  | R, E, W, P, U, G, C | 20, 19, 18, 17, 16, 15, 14 |
//! | odd  | EB | 13-0 |
//!
//! A PTW is a single word: ADDR in the upper half, U (used) in bit 9,
//! M (modified) in bit 6, DF (present) in bit 2 and FC in bits 1-0.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

pub(crate) const PTW_USED_BIT: u32 = 9;
pub(crate) const PTW_MODIFIED_BIT: u32 = 6;
const DF_BIT: u32 = 2;

/// A segment descriptor word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sdw {
    /// Absolute address of the segment (if unpaged) or of its page
    /// table (if paged).
    pub addr: Unsigned24Bit,
    pub r1: Unsigned3Bit,
    pub r2: Unsigned3Bit,
    pub r3: Unsigned3Bit,
    /// Segment bound, in units of 16 words.
    pub bound: Unsigned14Bit,
    /// Read permission.
    pub r: bool,
    /// Execute permission.
    pub e: bool,
    /// Write permission.
    pub w: bool,
    /// Privileged.
    pub p: bool,
    /// Unpaged.
    pub u: bool,
    /// Gate control.
    pub g: bool,
    /// Cache control.
    pub c: bool,
    /// Entry bound.
    pub eb: Unsigned14Bit,
    /// Descriptor present ("directed fault" bit).  When clear, the
    /// descriptor must not be used and `fc` selects the fault.
    pub df: bool,
    pub fc: Unsigned2Bit,
    /// The segment number this descriptor was fetched for; the SDWAM
    /// is keyed on it.
    pub pointer: Unsigned15Bit,
}

impl Sdw {
    /// Decode an SDW from the even and odd words of its pair.
    #[must_use]
    pub fn from_words(segno: Unsigned15Bit, even: Unsigned36Bit, odd: Unsigned36Bit) -> Sdw {
        Sdw {
            addr: field(even, 12),
            r1: field(even, 9),
            r2: field(even, 6),
            r3: field(even, 3),
            df: even.bit(DF_BIT),
            fc: field(even, 0),
            bound: field(odd, 21),
            r: odd.bit(20),
            e: odd.bit(19),
            w: odd.bit(18),
            p: odd.bit(17),
            u: odd.bit(16),
            g: odd.bit(15),
            c: odd.bit(14),
            eb: field(odd, 0),
            pointer: segno,
        }
    }

    /// Encode the SDW as the (even, odd) pair it occupies in the
    /// descriptor segment.
    #[must_use]
    pub fn to_words(&self) -> (Unsigned36Bit, Unsigned36Bit) {
        let flag = |b: bool, pos: u32| -> u64 { u64::from(b) << pos };
        let even: u64 = (u64::from(self.addr) << 12)
            | (u64::from(self.r1) << 9)
            | (u64::from(self.r2) << 6)
            | (u64::from(self.r3) << 3)
            | flag(self.df, DF_BIT)
            | u64::from(self.fc);
        let odd: u64 = (u64::from(self.bound) << 21)
            | flag(self.r, 20)
            | flag(self.e, 19)
            | flag(self.w, 18)
            | flag(self.p, 17)
            | flag(self.u, 16)
            | flag(self.g, 15)
            | flag(self.c, 14)
            | u64::from(self.eb);
        (
            Unsigned36Bit::truncating_from_u64(even),
            Unsigned36Bit::truncating_from_u64(odd),
        )
    }

    #[must_use]
    pub fn is_paged(&self) -> bool {
        !self.u
    }

    /// True when R1 <= R2 <= R3.
    #[must_use]
    pub fn ring_brackets_ordered(&self) -> bool {
        self.r1 <= self.r2 && self.r2 <= self.r3
    }
}

impl Display for Sdw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADDR:{:08o} R1:{:o} R2:{:o} R3:{:o} BOUND:{:o} R:{} E:{} W:{} P:{} U:{} G:{} C:{} EB:{:o} DF:{} FC:{:o} POINTER={:05o}",
            self.addr,
            self.r1,
            self.r2,
            self.r3,
            self.bound,
            u8::from(self.r),
            u8::from(self.e),
            u8::from(self.w),
            u8::from(self.p),
            u8::from(self.u),
            u8::from(self.g),
            u8::from(self.c),
            self.eb,
            u8::from(self.df),
            self.fc,
            self.pointer,
        )
    }
}

/// A page table word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ptw {
    /// High-order bits of the absolute address of the page frame.
    pub addr: Unsigned18Bit,
    /// Page has been used.
    pub u: bool,
    /// Page has been modified.
    pub m: bool,
    /// Page present.  When clear, `fc` selects the directed fault.
    pub df: bool,
    pub fc: Unsigned2Bit,
}

impl Ptw {
    #[must_use]
    pub fn from_word(word: Unsigned36Bit) -> Ptw {
        Ptw {
            addr: left_half(word),
            u: word.bit(PTW_USED_BIT),
            m: word.bit(PTW_MODIFIED_BIT),
            df: word.bit(DF_BIT),
            fc: field(word, 0),
        }
    }

    #[must_use]
    pub fn to_word(&self) -> Unsigned36Bit {
        join_halves(self.addr, Unsigned18Bit::from(self.fc))
            .with_bit(PTW_USED_BIT, self.u)
            .with_bit(PTW_MODIFIED_BIT, self.m)
            .with_bit(DF_BIT, self.df)
    }

    /// The absolute address of the first word of the page frame.
    /// The low-order bits of ADDR are ignored since pages are 1024
    /// words long.
    #[must_use]
    pub fn frame_address(&self) -> Unsigned24Bit {
        Unsigned24Bit::from(self.addr & 0o777760_u32) << 6
    }
}

impl Display for Ptw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADDR:{:06o} U:{} M:{} DF:{} FC:{:o}",
            self.addr,
            u8::from(self.u),
            u8::from(self.m),
            u8::from(self.df),
            self.fc
        )
    }
}
