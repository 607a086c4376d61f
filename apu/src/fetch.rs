//! Fetching and updating descriptors in main memory.
//!
//! These are the memory operations of the appending unit's
//! descriptor fetch cycles.  They neither consult nor load the
//! associative memories, and they do not record APU status; the
//! caller does both.
use tracing::{Level, event};

use base::prelude::*;

use crate::descriptor::{PTW_MODIFIED_BIT, PTW_USED_BIT, Ptw, Sdw};
use crate::fault::{AcvFaults, Fault};
use crate::memory::PhysicalMemory;
use crate::registers::Dsbr;

/// Words per page.
pub const PAGE_SIZE: u32 = 1024;

fn offset(base: Unsigned24Bit, n: u32) -> Unsigned24Bit {
    base.wrapping_add(Unsigned24Bit::truncating_from_u64(u64::from(n)))
}

fn check_descriptor_segment_bound(dsbr: &Dsbr, segno: Unsigned15Bit) -> Result<(), Fault> {
    if dsbr.descriptor_segment_contains(segno) {
        Ok(())
    } else {
        event!(
            Level::DEBUG,
            "segment {segno:05o} is beyond the descriptor segment bound {:05o}",
            dsbr.bnd
        );
        Err(Fault::access_violation(
            AcvFaults::OOSB,
            "descriptor segment bound violation",
        ))
    }
}

fn read_sdw_pair<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    address: Unsigned24Bit,
    segno: Unsigned15Bit,
) -> Result<Sdw, Fault> {
    let even = mem.core_read(address)?;
    let odd = mem.core_read(offset(address, 1))?;
    let sdw = Sdw::from_words(segno, even, odd);
    event!(Level::TRACE, "SDW for segment {segno:05o} at {address:08o}: {sdw}");
    Ok(sdw)
}

/// Fetch the PTW of the descriptor segment page which holds the SDW
/// for `segno`.
pub fn fetch_dsptw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    dsbr: &Dsbr,
    segno: Unsigned15Bit,
) -> Result<Ptw, Fault> {
    check_descriptor_segment_bound(dsbr, segno)?;
    let x1 = (2 * u32::from(segno)) / PAGE_SIZE;
    let ptw = Ptw::from_word(mem.core_read(offset(dsbr.addr, x1))?);
    event!(Level::TRACE, "DSPTW for segment {segno:05o}: {ptw}");
    Ok(ptw)
}

/// Mark the descriptor segment page used, both in main memory and in
/// `dsptw`.
pub fn modify_dsptw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    dsbr: &Dsbr,
    segno: Unsigned15Bit,
    dsptw: &mut Ptw,
) -> Result<(), Fault> {
    let x1 = (2 * u32::from(segno)) / PAGE_SIZE;
    let address = offset(dsbr.addr, x1);
    let word = mem.core_read(address)?;
    mem.core_write(address, word.with_bit(PTW_USED_BIT, true))?;
    dsptw.u = true;
    Ok(())
}

/// Fetch the SDW for `segno` from a paged descriptor segment.
pub fn fetch_psdw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    dsptw: &Ptw,
    segno: Unsigned15Bit,
) -> Result<Sdw, Fault> {
    let y1 = (2 * u32::from(segno)) % PAGE_SIZE;
    read_sdw_pair(mem, offset(dsptw.frame_address(), y1), segno)
}

/// Fetch the SDW for `segno` from an unpaged descriptor segment.
pub fn fetch_nsdw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    dsbr: &Dsbr,
    segno: Unsigned15Bit,
) -> Result<Sdw, Fault> {
    check_descriptor_segment_bound(dsbr, segno)?;
    read_sdw_pair(mem, offset(dsbr.addr, 2 * u32::from(segno)), segno)
}

fn ptw_address(sdw: &Sdw, ca: Unsigned18Bit) -> Unsigned24Bit {
    offset(sdw.addr, u32::from(ca) / PAGE_SIZE)
}

/// Fetch the PTW for the page of the segment described by `sdw`
/// which contains `ca`.  The page is marked used in main memory if it
/// was not already.
pub fn fetch_ptw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    sdw: &Sdw,
    ca: Unsigned18Bit,
) -> Result<Ptw, Fault> {
    let address = ptw_address(sdw, ca);
    let word = mem.core_read(address)?;
    let mut ptw = Ptw::from_word(word);
    event!(Level::TRACE, "PTW at {address:08o}: {ptw}");
    if !ptw.u {
        mem.core_write(address, word.with_bit(PTW_USED_BIT, true))?;
        ptw.u = true;
    }
    Ok(ptw)
}

/// Mark the page containing `ca` modified, in main memory and in
/// `ptw`.
pub fn modify_ptw<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    sdw: &Sdw,
    ca: Unsigned18Bit,
    ptw: &mut Ptw,
) -> Result<(), Fault> {
    let address = ptw_address(sdw, ca);
    let word = mem.core_read(address)?;
    mem.core_write(address, word.with_bit(PTW_MODIFIED_BIT, true))?;
    ptw.m = true;
    Ok(())
}

/// Check the page following the one containing `ca`.  If its PTW
/// describes the next page frame but the page is not present, the
/// directed fault it selects is taken now rather than part-way
/// through the instruction.
pub fn do_ptw2<M: PhysicalMemory + ?Sized>(
    mem: &mut M,
    sdw: &Sdw,
    ca: Unsigned18Bit,
    ptw: &Ptw,
) -> Result<(), Fault> {
    let address = offset(ptw_address(sdw, ca), 1);
    let ptw2 = Ptw::from_word(mem.core_read(address)?);
    event!(Level::TRACE, "PTW2 at {address:08o}: {ptw2}");
    let this_frame = u32::from(ptw.addr & 0o777760_u32);
    let next_frame = u32::from(ptw2.addr & 0o777760_u32);
    if next_frame == this_frame + 16 && !ptw2.df {
        return Err(Fault::directed(ptw2.fc, "PTW2.F == 0"));
    }
    Ok(())
}

/// The descriptor fetch operations used by the appending unit.  The
/// provided implementations operate on physical memory; a backplane
/// can override them.
pub trait DescriptorFetcher: PhysicalMemory {
    fn fetch_dsptw(&mut self, dsbr: &Dsbr, segno: Unsigned15Bit) -> Result<Ptw, Fault> {
        fetch_dsptw(self, dsbr, segno)
    }

    fn modify_dsptw(
        &mut self,
        dsbr: &Dsbr,
        segno: Unsigned15Bit,
        dsptw: &mut Ptw,
    ) -> Result<(), Fault> {
        modify_dsptw(self, dsbr, segno, dsptw)
    }

    fn fetch_psdw(&mut self, dsptw: &Ptw, segno: Unsigned15Bit) -> Result<Sdw, Fault> {
        fetch_psdw(self, dsptw, segno)
    }

    fn fetch_nsdw(&mut self, dsbr: &Dsbr, segno: Unsigned15Bit) -> Result<Sdw, Fault> {
        fetch_nsdw(self, dsbr, segno)
    }

    fn fetch_ptw(&mut self, sdw: &Sdw, ca: Unsigned18Bit) -> Result<Ptw, Fault> {
        fetch_ptw(self, sdw, ca)
    }

    fn modify_ptw(&mut self, sdw: &Sdw, ca: Unsigned18Bit, ptw: &mut Ptw) -> Result<(), Fault> {
        modify_ptw(self, sdw, ca, ptw)
    }

    fn do_ptw2(&mut self, sdw: &Sdw, ca: Unsigned18Bit, ptw: &Ptw) -> Result<(), Fault> {
        do_ptw2(self, sdw, ca, ptw)
    }
}
