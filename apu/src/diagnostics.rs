//! Diagnostic state recorded by the appending unit.
//!
//! None of this affects address translation; it is kept so that a
//! debugger or a fault handler can see how far the last cycle got.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

/// The APU cycle status, as shown in the APU history register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApuStatus {
    /// Fetching a PTW of the descriptor segment.
    Dsptw,
    /// Marking a descriptor segment page used.
    Mdsptw,
    /// Fetching an SDW from an unpaged descriptor segment.
    Sdwnp,
    /// Fetching an SDW from a paged descriptor segment.
    Sdwp,
    Ptw,
    /// Checking the next page for uninterruptible EIS instructions.
    Ptw2,
    /// Marking a page modified.
    Mptw,
    /// Final address, paged.
    Fap,
    /// Final address, unpaged.
    Fanp,
    Fabs,
}

impl ApuStatus {
    /// The status bit which this status sets.  Some statuses share a
    /// bit.
    pub const fn bit(&self) -> u16 {
        match self {
            ApuStatus::Dsptw | ApuStatus::Mdsptw => 1 << 10,
            ApuStatus::Sdwnp => 1 << 9,
            ApuStatus::Sdwp => 1 << 8,
            ApuStatus::Ptw | ApuStatus::Mptw => 1 << 7,
            ApuStatus::Ptw2 => 1 << 6,
            ApuStatus::Fap => 1 << 5,
            ApuStatus::Fanp => 1 << 4,
            ApuStatus::Fabs => 1 << 3,
        }
    }
}

/// The 12-bit APU cycle status word.  The low three bits (FCT) count
/// faults, modulo 8, and are preserved when the status changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApuCycleBits(Unsigned12Bit);

impl ApuCycleBits {
    pub fn set_status(&mut self, status: ApuStatus) {
        let fct = u16::from(self.0) & 0o7;
        self.0 = Unsigned12Bit::truncating_from_u64(u64::from(status.bit() | fct));
    }

    /// Count a fault in FCT.
    pub fn increment_fct(&mut self) {
        let fct = (u16::from(self.0) + 1) & 0o7;
        self.0 = (self.0 & 0o7770_u16) | fct;
    }

    pub fn fct(&self) -> Unsigned3Bit {
        Unsigned3Bit::truncating_from_u64(u64::from(self.0 & 0o7_u16))
    }

    pub fn bits(&self) -> Unsigned12Bit {
        self.0
    }

    pub fn has(&self, status: ApuStatus) -> bool {
        u16::from(self.0) & status.bit() != 0
    }
}

impl Display for ApuCycleBits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// How far address appending got in the most recent cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApuState {
    pub flt: bool,
    /// The final address was formed from an unpaged segment.
    pub fanp: bool,
    /// The final address was formed from a paged segment.
    pub fap: bool,
    /// The final address was placed on the data bus.
    pub fa: bool,
}

/// Diagnostic fields of the appending unit.  Reset at the start of
/// every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApuTrace {
    pub cycle_bits: ApuCycleBits,
    pub state: ApuState,
    /// The offset (CA) of the operand placed on the data bus.
    pub data_bus_offset: Unsigned18Bit,
    /// The final address placed on the data bus.
    pub data_bus_addr: Unsigned24Bit,
    /// R1 of the SDW used by the most recent cycle.
    pub rsdwh_r1: Unsigned3Bit,
}

impl ApuTrace {
    pub fn reset(&mut self) {
        let cycle_bits = self.cycle_bits;
        *self = ApuTrace {
            cycle_bits,
            ..ApuTrace::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_preserves_fct() {
        let mut bits = ApuCycleBits::default();
        for _ in 0..5 {
            bits.increment_fct();
        }
        bits.set_status(ApuStatus::Sdwp);
        assert_eq!(bits.bits(), u12!(0o0405));
        bits.set_status(ApuStatus::Fap);
        assert_eq!(bits.bits(), u12!(0o0045));
        assert!(bits.has(ApuStatus::Fap));
        assert!(!bits.has(ApuStatus::Sdwp));
    }

    #[test]
    fn test_fct_wraps() {
        let mut bits = ApuCycleBits::default();
        bits.set_status(ApuStatus::Ptw);
        for _ in 0..7 {
            bits.increment_fct();
        }
        assert_eq!(bits.fct(), u3!(7));
        bits.increment_fct();
        assert_eq!(bits.fct(), u3!(0));
        assert!(bits.has(ApuStatus::Ptw));
    }

    #[test]
    fn test_shared_status_bits() {
        assert_eq!(ApuStatus::Dsptw.bit(), ApuStatus::Mdsptw.bit());
        assert_eq!(ApuStatus::Ptw.bit(), ApuStatus::Mptw.bit());
        assert_ne!(ApuStatus::Ptw.bit(), ApuStatus::Ptw2.bit());
    }

    #[test]
    fn test_reset_keeps_cycle_bits() {
        let mut trace = ApuTrace::default();
        trace.cycle_bits.set_status(ApuStatus::Fanp);
        trace.state.fanp = true;
        trace.data_bus_addr = u24!(0o1234);
        trace.reset();
        assert!(trace.cycle_bits.has(ApuStatus::Fanp));
        assert_eq!(trace.state, ApuState::default());
        assert_eq!(trace.data_bus_addr, u24!(0));
    }
}
