//! The collaborators of the appending unit, gathered behind one
//! interface.
use base::prelude::*;

use crate::descriptor::{Ptw, Sdw};
use crate::fault::{Fault, FaultDispatcher};
use crate::faultunit::FaultUnit;
use crate::fetch::DescriptorFetcher;
use crate::memory::{MemoryConfiguration, MemoryUnit, PhysicalMemory};
use crate::wam::{DescriptorCache, Wam, WamModel};

/// Everything the appending unit calls out to during a cycle.
pub trait Backplane: PhysicalMemory + DescriptorFetcher + DescriptorCache + FaultDispatcher {}

impl<T> Backplane for T where
    T: PhysicalMemory + DescriptorFetcher + DescriptorCache + FaultDispatcher
{
}

/// Main memory, the associative memories and the fault unit of one
/// processor.
#[derive(Debug)]
pub struct StandardBackplane {
    pub mem: MemoryUnit,
    pub wam: Wam,
    pub faults: FaultUnit,
}

impl StandardBackplane {
    pub fn new(mem_config: &MemoryConfiguration, wam_model: WamModel) -> StandardBackplane {
        StandardBackplane {
            mem: MemoryUnit::new(mem_config),
            wam: Wam::new(wam_model),
            faults: FaultUnit::new(),
        }
    }
}

impl PhysicalMemory for StandardBackplane {
    fn core_read(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault> {
        self.mem.core_read(address)
    }

    fn core_write(&mut self, address: Unsigned24Bit, word: Unsigned36Bit) -> Result<(), Fault> {
        self.mem.core_write(address, word)
    }

    fn core_read_lock(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault> {
        self.mem.core_read_lock(address)
    }

    fn core_write_unlock(
        &mut self,
        address: Unsigned24Bit,
        word: Unsigned36Bit,
    ) -> Result<(), Fault> {
        self.mem.core_write_unlock(address, word)
    }
}

impl DescriptorFetcher for StandardBackplane {}

impl DescriptorCache for StandardBackplane {
    fn fetch_sdw_from_sdwam(&mut self, segno: Unsigned15Bit) -> Option<Sdw> {
        self.wam.fetch_sdw_from_sdwam(segno)
    }

    fn load_sdwam(&mut self, segno: Unsigned15Bit, sdw: &Sdw, nomatch: bool) {
        self.wam.load_sdwam(segno, sdw, nomatch)
    }

    fn fetch_ptw_from_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit) -> Option<Ptw> {
        self.wam.fetch_ptw_from_ptwam(pointer, ca)
    }

    fn load_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit, ptw: &Ptw, nomatch: bool) {
        self.wam.load_ptwam(pointer, ca, ptw, nomatch)
    }

    fn note_ptw_modified(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit) {
        self.wam.note_ptw_modified(pointer, ca)
    }

    fn clear_associative_memory(&mut self) {
        self.wam.clear_associative_memory()
    }
}

impl FaultDispatcher for StandardBackplane {
    fn do_fault(&mut self, fault: Fault) -> Fault {
        self.faults.do_fault(fault)
    }
}
