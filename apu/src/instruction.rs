//! The little the appending unit needs to know about the instruction
//! being executed.
use serde::Serialize;

use base::prelude::*;

/// Opcodes (with the state of the extended-opcode flag) of the
/// instructions which load or store the associative memories and the
/// descriptor base registers.  Address preparation for these ignores
/// the associative memory.
const ASSOCIATIVE_MEMORY_OPCODES: [(u16, bool); 6] = [
    (0o232, true),
    (0o254, true),
    (0o154, true),
    (0o173, true),
    (0o557, false),
    (0o257, false),
];

/// Opcode groups (`opcode & 0o770`, extended opcodes only) of the EIS
/// instructions which cannot be interrupted part-way and so must
/// check the following page is present before they begin.
const UNINTERRUPTIBLE_EIS_GROUPS: [u16; 4] = [0o020, 0o200, 0o220, 0o300];

/// Metadata about the current instruction, supplied by the
/// instruction decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurrentInstruction {
    pub opcode: Unsigned9Bit,
    /// The extended-opcode bit (instruction word bit 27).
    pub opcode_x: bool,
    /// The instruction uses a pointer register (instruction word
    /// bit 29).
    pub b29: bool,
    /// The pointer register named by the address field, when `b29`
    /// is set.
    pub prn: Unsigned3Bit,
}

impl CurrentInstruction {
    pub fn new(opcode: Unsigned9Bit, opcode_x: bool) -> CurrentInstruction {
        CurrentInstruction {
            opcode,
            opcode_x,
            b29: false,
            prn: Unsigned3Bit::ZERO,
        }
    }

    /// The same instruction, with its operand address taken relative
    /// to pointer register `prn`.
    #[must_use]
    pub fn with_pointer_register(self, prn: Unsigned3Bit) -> CurrentInstruction {
        CurrentInstruction {
            b29: true,
            prn,
            ..self
        }
    }

    /// True for instructions during whose address preparation the
    /// associative memory is forced to "no match".
    #[must_use]
    pub fn bypasses_associative_memory(&self) -> bool {
        let op = u16::from(self.opcode);
        ASSOCIATIVE_MEMORY_OPCODES.contains(&(op, self.opcode_x))
    }

    #[must_use]
    pub fn is_uninterruptible_eis(&self) -> bool {
        self.opcode_x && UNINTERRUPTIBLE_EIS_GROUPS.contains(&(u16::from(self.opcode) & 0o770))
    }
}
