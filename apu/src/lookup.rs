//! Translation of a segmented address for debugging tools.
//!
//! A lookup follows the same tables as the appending unit but has no
//! side effects: it does not consult or load the associative
//! memories, does not mark pages used, and does not raise faults.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use tracing::{Level, event};

use base::prelude::*;

use crate::descriptor::{Ptw, Sdw};
use crate::fetch::PAGE_SIZE;
use crate::memory::MemoryUnit;
use crate::registers::Dsbr;

/// The reason a segmented address could not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    DescriptorSegmentBound { segno: Unsigned15Bit },
    DsptwNotPresent { segno: Unsigned15Bit },
    SdwNotPresent { segno: Unsigned15Bit },
    SegmentBound { segno: Unsigned15Bit, offset: Unsigned18Bit },
    PtwNotPresent { segno: Unsigned15Bit, offset: Unsigned18Bit },
    /// A descriptor lies beyond the end of main memory.
    NonexistentAddress { address: Unsigned24Bit },
}

impl LookupFailure {
    /// The failure codes reported by the debugger's address lookup
    /// command.  Zero is never used.
    pub fn code(&self) -> u8 {
        match self {
            LookupFailure::DescriptorSegmentBound { .. } => 1,
            LookupFailure::DsptwNotPresent { .. } => 2,
            LookupFailure::SdwNotPresent { .. } => 3,
            LookupFailure::SegmentBound { .. } => 4,
            LookupFailure::PtwNotPresent { .. } => 5,
            LookupFailure::NonexistentAddress { .. } => 6,
        }
    }
}

impl Display for LookupFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::DescriptorSegmentBound { segno } => {
                write!(f, "{segno:05o}: DSBR boundary violation")
            }
            LookupFailure::DsptwNotPresent { segno } => {
                write!(f, "{segno:05o}: !PTW0.F (descriptor segment page)")
            }
            LookupFailure::SdwNotPresent { segno } => {
                write!(f, "{segno:05o}: !SDW0.F != 0")
            }
            LookupFailure::SegmentBound { segno, offset } => {
                write!(f, "{segno:05o}:{offset:06o}: C(TPR.CA)0,13 > SDW.BOUND")
            }
            LookupFailure::PtwNotPresent { segno, offset } => {
                write!(f, "{segno:05o}:{offset:06o}: !PTW0.F")
            }
            LookupFailure::NonexistentAddress { address } => {
                write!(f, "descriptor at nonexistent address {address:08o}")
            }
        }
    }
}

impl Error for LookupFailure {}

fn peek(mem: &MemoryUnit, address: Unsigned24Bit) -> Result<Unsigned36Bit, LookupFailure> {
    mem.peek(address)
        .ok_or(LookupFailure::NonexistentAddress { address })
}

fn peek_sdw(
    mem: &MemoryUnit,
    address: Unsigned24Bit,
    segno: Unsigned15Bit,
) -> Result<Sdw, LookupFailure> {
    let even = peek(mem, address)?;
    let odd = peek(mem, address.wrapping_add(Unsigned24Bit::ONE))?;
    Ok(Sdw::from_words(segno, even, odd))
}

fn words(n: u32) -> Unsigned24Bit {
    Unsigned24Bit::truncating_from_u64(u64::from(n))
}

/// Find the SDW for `segno` in the descriptor segment described by
/// `dsbr`.
fn lookup_sdw(mem: &MemoryUnit, dsbr: &Dsbr, segno: Unsigned15Bit) -> Result<Sdw, LookupFailure> {
    if !dsbr.descriptor_segment_contains(segno) {
        return Err(LookupFailure::DescriptorSegmentBound { segno });
    }
    let sdw_offset = 2 * u32::from(segno);
    let sdw = if dsbr.unpaged {
        peek_sdw(mem, dsbr.addr.wrapping_add(words(sdw_offset)), segno)?
    } else {
        let dsptw = Ptw::from_word(peek(
            mem,
            dsbr.addr.wrapping_add(words(sdw_offset / PAGE_SIZE)),
        )?);
        if !dsptw.df {
            return Err(LookupFailure::DsptwNotPresent { segno });
        }
        peek_sdw(
            mem,
            dsptw
                .frame_address()
                .wrapping_add(words(sdw_offset % PAGE_SIZE)),
            segno,
        )?
    };
    if sdw.df {
        Ok(sdw)
    } else {
        Err(LookupFailure::SdwNotPresent { segno })
    }
}

/// Translate `segno:offset` into an absolute address.
pub fn lookup_address(
    mem: &MemoryUnit,
    dsbr: &Dsbr,
    segno: Unsigned15Bit,
    offset: Unsigned18Bit,
) -> Result<Unsigned24Bit, LookupFailure> {
    let sdw = lookup_sdw(mem, dsbr, segno)?;
    if u32::from(offset >> 4) > u32::from(sdw.bound) {
        return Err(LookupFailure::SegmentBound { segno, offset });
    }
    let address = if sdw.is_paged() {
        let ptw = Ptw::from_word(peek(
            mem,
            sdw.addr.wrapping_add(words(u32::from(offset) / PAGE_SIZE)),
        )?);
        if !ptw.df {
            return Err(LookupFailure::PtwNotPresent { segno, offset });
        }
        ptw.frame_address()
            .wrapping_add(words(u32::from(offset) % PAGE_SIZE))
    } else {
        (sdw.addr & 0o77777760_u32).wrapping_add(Unsigned24Bit::from(offset))
    };
    event!(
        Level::TRACE,
        "lookup {segno:05o}:{offset:06o} -> {address:08o}"
    );
    Ok(address)
}
