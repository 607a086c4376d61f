//! Processor cycle kinds.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// The kind of memory cycle the processor is performing.  The
/// appending unit remembers the kind of the previous cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessorCycle {
    #[default]
    Unknown,
    OperandStore,
    OperandRead,
    IndirectWordFetch,
    RtcdOperandFetch,
    InstructionFetch,
    ApuDataRead,
    ApuDataStore,
    Absa,
    OperandRmw,
    ApuDataRmw,
}

impl ProcessorCycle {
    pub const fn name(&self) -> &'static str {
        match self {
            ProcessorCycle::Unknown => "UNKNOWN_CYCLE",
            ProcessorCycle::OperandStore => "OPERAND_STORE",
            ProcessorCycle::OperandRead => "OPERAND_READ",
            ProcessorCycle::IndirectWordFetch => "INDIRECT_WORD_FETCH",
            ProcessorCycle::RtcdOperandFetch => "RTCD_OPERAND_FETCH",
            ProcessorCycle::InstructionFetch => "INSTRUCTION_FETCH",
            ProcessorCycle::ApuDataRead => "APU_DATA_READ",
            ProcessorCycle::ApuDataStore => "APU_DATA_STORE",
            ProcessorCycle::Absa => "ABSA_CYCLE",
            ProcessorCycle::OperandRmw => "OPERAND_RMW",
            ProcessorCycle::ApuDataRmw => "APU_DATA_RMW",
        }
    }
}

impl Display for ProcessorCycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn test_cycle_names() {
    assert_eq!(ProcessorCycle::default().to_string(), "UNKNOWN_CYCLE");
    assert_eq!(ProcessorCycle::OperandRead.to_string(), "OPERAND_READ");
    assert_eq!(ProcessorCycle::Absa.to_string(), "ABSA_CYCLE");
}
