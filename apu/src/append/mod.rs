//! The appending unit converts a segmented address (segment number
//! and word offset, in the TPR) into an absolute main memory address,
//! checking on the way that the effective ring is permitted to make
//! the access.
//!
//! Every kind of data cycle runs the same sequence of steps, named
//! after the sheets of the hardware flowchart:
//!
//! - A: find the SDW for the segment, in the SDWAM or the descriptor
//!   segment;
//! - B: check the ring brackets and access permissions;
//! - G: check the segment bound, and take an access violation fault
//!   if any check failed;
//! - H (unpaged segment) or I (paged segment): form the final address;
//! - HI: transfer the operand.
//!
//! Access violation conditions accumulate through sheets B and G so
//! that the fault reports all of them.  A descriptor which is not
//! present causes an immediate directed fault.
use serde::Serialize;
use tracing::{Level, event, span};

use base::prelude::*;

use crate::backplane::Backplane;
use crate::cycle::ProcessorCycle;
use crate::descriptor::Sdw;
use crate::diagnostics::{ApuStatus, ApuTrace};
use crate::fault::{AcvFaults, Fault, FaultDispatcher};
use crate::instruction::CurrentInstruction;
use crate::registers::{Dsbr, Ppr, Tpr};
use crate::wam::{DescriptorCache, WamModel};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApuConfiguration {
    /// When false, the associative memories are never consulted.
    pub enable_wam: bool,
    pub wam_model: WamModel,
}

impl Default for ApuConfiguration {
    fn default() -> ApuConfiguration {
        ApuConfiguration {
            enable_wam: true,
            wam_model: WamModel::Dps8m,
        }
    }
}

/// What the cycle does with the final address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Read,
    Store,
    ReadModifyWrite,
    Absa,
}

impl Intent {
    fn checks_read_bracket(&self) -> bool {
        matches!(self, Intent::Read | Intent::ReadModifyWrite | Intent::Absa)
    }

    fn checks_write_bracket(&self) -> bool {
        matches!(self, Intent::Store | Intent::ReadModifyWrite)
    }
}

enum Transfer<'a> {
    Read(&'a mut [Unsigned36Bit]),
    Store(&'a [Unsigned36Bit]),
    StoreZone {
        word: Unsigned36Bit,
        zone: Unsigned36Bit,
    },
    ReadModifyWrite(&'a mut [Unsigned36Bit]),
    None,
}

impl Transfer<'_> {
    fn intent(&self) -> Intent {
        match self {
            Transfer::Read(_) => Intent::Read,
            Transfer::Store(_) | Transfer::StoreZone { .. } => Intent::Store,
            Transfer::ReadModifyWrite(_) => Intent::ReadModifyWrite,
            Transfer::None => Intent::Absa,
        }
    }
}

#[derive(Debug, Default)]
pub struct AppendingUnit {
    pub tpr: Tpr,
    pub ppr: Ppr,
    pub dsbr: Dsbr,
    /// Execute/store flag, set when an operand cycle loads TPR.TSR.
    pub xsf: bool,
    config: ApuConfiguration,
    last_cycle: ProcessorCycle,
    acv_faults: AcvFaults,
    trace: ApuTrace,
}

impl AppendingUnit {
    pub fn new(config: &ApuConfiguration) -> AppendingUnit {
        AppendingUnit {
            config: *config,
            ..AppendingUnit::default()
        }
    }

    pub fn config(&self) -> &ApuConfiguration {
        &self.config
    }

    pub fn last_cycle(&self) -> ProcessorCycle {
        self.last_cycle
    }

    /// The access violation conditions found by the most recent cycle.
    pub fn acv_faults(&self) -> AcvFaults {
        self.acv_faults
    }

    pub fn trace(&self) -> &ApuTrace {
        &self.trace
    }

    /// True when the associative memories are to be bypassed while
    /// preparing addresses for `inst`.
    #[must_use]
    pub fn nomatch(&self, inst: &CurrentInstruction) -> bool {
        !self.config.enable_wam || inst.bypasses_associative_memory()
    }

    /// Record that the processor performed a cycle of kind `cycle`
    /// which did not need the appending unit.
    pub fn note_cycle(&mut self, cycle: ProcessorCycle) {
        self.last_cycle = cycle;
    }

    /// Read `data.len()` words of an operand.
    pub fn operand_read<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &mut [Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(ProcessorCycle::OperandRead, inst, bus, Transfer::Read(data))
    }

    /// Read words on behalf of the appending unit itself (for
    /// example, a pointer pair).
    pub fn apu_data_read<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &mut [Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(ProcessorCycle::ApuDataRead, inst, bus, Transfer::Read(data))
    }

    pub fn operand_store<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &[Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(ProcessorCycle::OperandStore, inst, bus, Transfer::Store(data))
    }

    /// Store only the bits of `word` selected by `zone`.
    pub fn operand_store_zone<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        word: Unsigned36Bit,
        zone: Unsigned36Bit,
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(
            ProcessorCycle::OperandStore,
            inst,
            bus,
            Transfer::StoreZone { word, zone },
        )
    }

    pub fn apu_data_store<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &[Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(ProcessorCycle::ApuDataStore, inst, bus, Transfer::Store(data))
    }

    /// The read half of a read-modify-write operand access.  A
    /// single word is read with a lock, which the caller releases
    /// with [`crate::memory::PhysicalMemory::core_write_unlock`].
    pub fn operand_rmw<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &mut [Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(
            ProcessorCycle::OperandRmw,
            inst,
            bus,
            Transfer::ReadModifyWrite(data),
        )
    }

    pub fn apu_data_rmw<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        data: &mut [Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(
            ProcessorCycle::ApuDataRmw,
            inst,
            bus,
            Transfer::ReadModifyWrite(data),
        )
    }

    /// Compute the absolute address corresponding to TPR (for the
    /// ABSA instruction) without accessing the operand.
    pub fn absa<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
    ) -> Result<Unsigned24Bit, Fault> {
        self.append_cycle(ProcessorCycle::Absa, inst, bus, Transfer::None)
    }

    /// LDBR: load the DSBR from a Y-pair.  The associative memories
    /// are emptied.
    pub fn load_dsbr<C: DescriptorCache + ?Sized>(&mut self, cache: &mut C, y: &[Unsigned36Bit; 2]) {
        if self.config.enable_wam {
            cache.clear_associative_memory();
        }
        self.dsbr = Dsbr::from_y_pair(y);
        event!(Level::DEBUG, "ldbr: DSBR is now {}", self.dsbr);
    }

    /// SDBR: the Y-pair to store for the DSBR.
    #[must_use]
    pub fn store_dsbr(&self) -> [Unsigned36Bit; 2] {
        self.dsbr.to_y_pair()
    }

    /// Pass `fault` to the fault dispatcher, noting in the APU state
    /// that the cycle faulted.
    fn raise<D: FaultDispatcher + ?Sized>(&mut self, bus: &mut D, fault: Fault) -> Fault {
        self.trace.state.flt = true;
        self.trace.cycle_bits.increment_fct();
        bus.do_fault(fault)
    }

    fn note_acv(&mut self, acv: AcvFaults, reason: &str) {
        event!(Level::DEBUG, "{acv}: {reason}");
        self.acv_faults.insert(acv);
        self.trace.state.flt = true;
    }

    fn append_cycle<B: Backplane + ?Sized>(
        &mut self,
        cycle: ProcessorCycle,
        inst: &CurrentInstruction,
        bus: &mut B,
        transfer: Transfer<'_>,
    ) -> Result<Unsigned24Bit, Fault> {
        let span = span!(Level::TRACE, "append", cycle=%cycle, tpr=%self.tpr);
        let _enter = span.enter();

        if inst.b29 {
            event!(
                Level::TRACE,
                "operand address formed from pointer register {:o}",
                inst.prn
            );
        }
        let nomatch = self.nomatch(inst);
        let last_cycle = std::mem::replace(&mut self.last_cycle, cycle);
        self.acv_faults = AcvFaults::NONE;
        self.trace.reset();
        let intent = transfer.intent();

        let sdw = self.sheet_a(bus, nomatch, intent)?;
        self.sheet_b(inst, &sdw, last_cycle, intent);
        self.sheet_g(bus, &sdw)?;
        let final_address = if sdw.is_paged() {
            self.sheet_i(inst, bus, &sdw, nomatch, intent)?
        } else {
            self.sheet_h(&sdw)
        };
        self.sheet_hi(bus, final_address, transfer)?;
        Ok(final_address)
    }

    /// Sheet A: obtain the SDW for TPR.TSR.
    fn sheet_a<B: Backplane + ?Sized>(
        &mut self,
        bus: &mut B,
        nomatch: bool,
        intent: Intent,
    ) -> Result<Sdw, Fault> {
        let segno = self.tpr.tsr;
        let cached = if nomatch {
            None
        } else {
            bus.fetch_sdw_from_sdwam(segno)
        };
        let sdw = match cached {
            Some(sdw) => sdw,
            None => {
                event!(
                    Level::TRACE,
                    "SDW for segment {segno:05o} not in SDWAM; DSBR.U={}",
                    u8::from(self.dsbr.unpaged)
                );
                let sdw = if self.dsbr.unpaged {
                    self.trace.cycle_bits.set_status(ApuStatus::Sdwnp);
                    bus.fetch_nsdw(&self.dsbr, segno)
                        .map_err(|fault| self.raise(bus, fault))?
                } else {
                    self.trace.cycle_bits.set_status(ApuStatus::Dsptw);
                    let mut dsptw = bus
                        .fetch_dsptw(&self.dsbr, segno)
                        .map_err(|fault| self.raise(bus, fault))?;
                    if !dsptw.df {
                        let fault = Fault::directed(dsptw.fc, "PTW0.F == 0");
                        return Err(self.raise(bus, fault));
                    }
                    if !dsptw.u {
                        self.trace.cycle_bits.set_status(ApuStatus::Mdsptw);
                        bus.modify_dsptw(&self.dsbr, segno, &mut dsptw)
                            .map_err(|fault| self.raise(bus, fault))?;
                    }
                    self.trace.cycle_bits.set_status(ApuStatus::Sdwp);
                    bus.fetch_psdw(&dsptw, segno)
                        .map_err(|fault| self.raise(bus, fault))?
                };
                // ABSA reports the address even of a segment which
                // is not present.
                if !sdw.df && intent != Intent::Absa {
                    let fault = Fault::directed(sdw.fc, "SDW0.F == 0");
                    return Err(self.raise(bus, fault));
                }
                // Under ABSA an SDW which is not present is cached
                // too, and later cycles which find it in the SDWAM do
                // not take the directed fault.  The hardware behaves
                // the same way.
                bus.load_sdwam(segno, &sdw, nomatch);
                sdw
            }
        };
        self.trace.rsdwh_r1 = sdw.r1;
        Ok(sdw)
    }

    /// Sheet B: ring bracket and permission checks.
    fn sheet_b(
        &mut self,
        inst: &CurrentInstruction,
        sdw: &Sdw,
        last_cycle: ProcessorCycle,
        intent: Intent,
    ) {
        event!(
            Level::TRACE,
            "R1={:o} R2={:o} R3={:o} R={} W={}",
            sdw.r1,
            sdw.r2,
            sdw.r3,
            u8::from(sdw.r),
            u8::from(sdw.w)
        );
        if !sdw.ring_brackets_ordered() {
            self.note_acv(AcvFaults::IRO, "C(SDW.R1) <= C(SDW.R2) <= C(SDW.R3) is false");
        }
        if last_cycle == ProcessorCycle::RtcdOperandFetch {
            event!(
                Level::WARN,
                "last cycle was {last_cycle}, opcode {:03o}",
                inst.opcode
            );
        }

        if intent.checks_read_bracket() {
            if self.tpr.trr > sdw.r2 {
                self.note_acv(AcvFaults::ORB, "C(TPR.TRR) > C(SDW.R2)");
            }
            if !sdw.r {
                self.tpr.trr = self.ppr.prr;
                if self.ppr.psr != self.tpr.tsr {
                    self.note_acv(AcvFaults::R_OFF, "C(PPR.PSR) != C(TPR.TSR)");
                }
            }
        }

        if intent.checks_write_bracket() {
            if self.tpr.tsr == self.ppr.psr {
                self.tpr.trr = self.ppr.prr;
            }
            // The hardware compares against R1 here, not R2.
            if self.tpr.trr > sdw.r1 {
                self.note_acv(AcvFaults::OWB, "C(TPR.TRR) > C(SDW.R1)");
            }
            if !sdw.w {
                self.tpr.trr = self.ppr.prr;
                self.note_acv(AcvFaults::W_OFF, "SDW.W is off");
            }
        }
    }

    /// Sheet G: the bound check, and the access violation fault if
    /// any check failed.
    fn sheet_g<D: FaultDispatcher + ?Sized>(&mut self, bus: &mut D, sdw: &Sdw) -> Result<(), Fault> {
        let block = u32::from(self.tpr.ca >> 4) & 0o37777;
        if block > u32::from(sdw.bound) {
            self.note_acv(AcvFaults::OOSB, "C(TPR.CA)0,13 > SDW.BOUND");
        }
        if self.acv_faults.is_empty() {
            Ok(())
        } else {
            let fault = Fault::access_violation(self.acv_faults, "ACV fault");
            Err(self.raise(bus, fault))
        }
    }

    /// Sheet H: final address of an unpaged segment.
    fn sheet_h(&mut self, sdw: &Sdw) -> Unsigned24Bit {
        self.trace.cycle_bits.set_status(ApuStatus::Fanp);
        self.trace.state.fanp = true;
        let final_address = (sdw.addr & 0o77777760_u32).wrapping_add(Unsigned24Bit::from(self.tpr.ca));
        event!(
            Level::TRACE,
            "FANP: {:05o}:{:06o} is at {:08o}",
            self.tpr.tsr,
            self.tpr.ca,
            final_address
        );
        final_address
    }

    /// Sheet I: find the PTW and form the final address of a paged
    /// segment.
    fn sheet_i<B: Backplane + ?Sized>(
        &mut self,
        inst: &CurrentInstruction,
        bus: &mut B,
        sdw: &Sdw,
        nomatch: bool,
        intent: Intent,
    ) -> Result<Unsigned24Bit, Fault> {
        let ca = self.tpr.ca;
        let cached = if nomatch {
            None
        } else {
            bus.fetch_ptw_from_ptwam(sdw.pointer, ca)
        };
        let mut ptw = match cached {
            Some(ptw) => ptw,
            None => {
                self.trace.cycle_bits.set_status(ApuStatus::Ptw);
                let ptw = bus
                    .fetch_ptw(sdw, ca)
                    .map_err(|fault| self.raise(bus, fault))?;
                if !ptw.df && intent != Intent::Absa {
                    let fault = Fault::directed(ptw.fc, "PTW0.F == 0");
                    return Err(self.raise(bus, fault));
                }
                bus.load_ptwam(sdw.pointer, ca, &ptw, nomatch);
                ptw
            }
        };

        if inst.is_uninterruptible_eis() {
            self.trace.cycle_bits.set_status(ApuStatus::Ptw2);
            bus.do_ptw2(sdw, ca, &ptw)
                .map_err(|fault| self.raise(bus, fault))?;
        }

        if intent.checks_write_bracket() && !ptw.m {
            self.trace.cycle_bits.set_status(ApuStatus::Mptw);
            bus.modify_ptw(sdw, ca, &mut ptw)
                .map_err(|fault| self.raise(bus, fault))?;
            bus.note_ptw_modified(sdw.pointer, ca);
        }

        self.trace.cycle_bits.set_status(ApuStatus::Fap);
        self.trace.state.fap = true;
        let final_address = ptw
            .frame_address()
            .wrapping_add(Unsigned24Bit::from(ca & 0o1777_u32));
        event!(
            Level::TRACE,
            "FAP: {:05o}:{:06o} is at {:08o} ({})",
            self.tpr.tsr,
            ca,
            final_address,
            ptw
        );
        Ok(final_address)
    }

    /// Sheet HI: transfer the operand.
    fn sheet_hi<B: Backplane + ?Sized>(
        &mut self,
        bus: &mut B,
        final_address: Unsigned24Bit,
        transfer: Transfer<'_>,
    ) -> Result<(), Fault> {
        let result = match transfer {
            Transfer::None => Ok(()),
            Transfer::Read(buf) => {
                self.xsf = true;
                bus.core_read_n(final_address, buf)
            }
            Transfer::Store(data) => {
                self.xsf = true;
                bus.core_write_n(final_address, data)
            }
            Transfer::StoreZone { word, zone } => {
                self.xsf = true;
                bus.core_write_zone(final_address, word, zone)
            }
            Transfer::ReadModifyWrite(buf) => {
                self.xsf = true;
                match buf {
                    [word] => bus.core_read_lock(final_address).map(|w| {
                        *word = w;
                    }),
                    _ => {
                        event!(
                            Level::WARN,
                            "read-modify-write of {} words at {:08o}",
                            buf.len(),
                            final_address
                        );
                        bus.core_read_n(final_address, buf)
                    }
                }
            }
        };
        result.map_err(|fault| self.raise(bus, fault))?;
        self.trace.data_bus_offset = self.tpr.ca;
        self.trace.data_bus_addr = final_address;
        self.trace.state.fa = true;
        Ok(())
    }
}
