//! The processor registers which take part in address appending.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

/// Temporary pointer register.  Holds the segmented address of the
/// operand being prepared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tpr {
    /// Effective ring number.
    pub trr: Unsigned3Bit,
    /// Segment number.
    pub tsr: Unsigned15Bit,
    /// Computed address (word offset within the segment).
    pub ca: Unsigned18Bit,
}

impl Display for Tpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}:{:05o}|{:06o}", self.trr, self.tsr, self.ca)
    }
}

/// Procedure pointer register.  Identifies the executing procedure
/// and the ring it runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ppr {
    pub prr: Unsigned3Bit,
    pub psr: Unsigned15Bit,
    /// Privileged mode.
    pub p: bool,
    pub ic: Unsigned18Bit,
}

/// Descriptor segment base register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dsbr {
    /// Absolute address of the descriptor segment (if unpaged) or of
    /// its page table.
    pub addr: Unsigned24Bit,
    /// Bound of the descriptor segment, in units of 16 words.
    pub bnd: Unsigned14Bit,
    /// The descriptor segment is unpaged.
    pub unpaged: bool,
    pub stack: Unsigned12Bit,
}

impl Dsbr {
    /// Decode the DSBR from the Y-pair operand of LDBR.
    #[must_use]
    pub fn from_y_pair(y: &[Unsigned36Bit; 2]) -> Dsbr {
        Dsbr {
            addr: field(y[0], 12),
            bnd: field(y[1], 21),
            unpaged: y[1].bit(16),
            stack: field(y[1], 0),
        }
    }

    /// Encode the DSBR as the Y-pair stored by SDBR.  Bits outside
    /// the register's fields are zero.
    #[must_use]
    pub fn to_y_pair(&self) -> [Unsigned36Bit; 2] {
        let even = Unsigned36Bit::from(self.addr) << 12;
        let odd = (u64::from(self.bnd) << 21)
            | (u64::from(self.unpaged) << 16)
            | u64::from(self.stack);
        [even, Unsigned36Bit::truncating_from_u64(odd)]
    }

    /// True if the SDW for `segno` lies within the descriptor
    /// segment.  Each SDW occupies two words and the bound counts
    /// 16-word blocks.
    #[must_use]
    pub fn descriptor_segment_contains(&self, segno: Unsigned15Bit) -> bool {
        2 * u32::from(segno) < 16 * (u32::from(self.bnd) + 1)
    }
}

impl Display for Dsbr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ADDR:{:08o} BND:{:05o} U:{} STACK:{:04o}",
            self.addr,
            self.bnd,
            u8::from(self.unpaged),
            self.stack
        )
    }
}
