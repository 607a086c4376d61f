//! This crate emulates the appending unit of the DPS-8/M processor:
//! translation of a segmented address (ring, segment, word offset)
//! into an absolute main-memory address, with ring bracket and
//! permission checks, paging and the associative memories.
#![crate_name = "apu"]

mod append;
mod backplane;
mod cycle;
mod descriptor;
mod diagnostics;
mod fault;
mod faultunit;
mod fetch;
mod instruction;
mod lookup;
mod memory;
mod processor;
mod registers;
mod wam;

pub use append::{AppendingUnit, ApuConfiguration};
pub use backplane::{Backplane, StandardBackplane};
pub use cycle::ProcessorCycle;
pub use descriptor::{Ptw, Sdw};
pub use diagnostics::{ApuCycleBits, ApuState, ApuStatus, ApuTrace};
pub use fault::{AcvFaults, Fault, FaultDetails, FaultDispatcher, FaultKind, UnknownFaultName};
pub use faultunit::{FaultStatus, FaultUnit};
pub use fetch::{
    DescriptorFetcher, PAGE_SIZE, do_ptw2, fetch_dsptw, fetch_nsdw, fetch_psdw, fetch_ptw,
    modify_dsptw, modify_ptw,
};
pub use instruction::CurrentInstruction;
pub use lookup::{LookupFailure, lookup_address};
pub use memory::{MAX_MEMORY_WORDS, MemoryConfiguration, MemoryUnit, PhysicalMemory};
pub use processor::{Processor, ProcessorConfiguration};
pub use registers::{Dsbr, Ppr, Tpr};
pub use wam::{
    AssociativeMemory, DescriptorCache, PtwamKey, SdwamDumpEntry, Wam, WamEntry, WamModel,
};
