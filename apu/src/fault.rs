//! Processor faults raised by the appending unit.
//!
//! The appending unit raises only two kinds of fault itself: the
//! access violation fault (ACV), whose conditions accumulate over the
//! course of a cycle, and the directed faults (DF0-DF3), which are
//! taken immediately when a descriptor is found not to be present.
//! A store fault (STR) is raised by main memory when the final
//! address does not exist.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

bitflags::bitflags! {
    /// The set of access violation conditions detected during one
    /// append cycle.  Several of these can be present at once; the
    /// fault subtype carries all of them.
    ///
    /// ACVn has the value `1 << (15 - n)`, so ACV0 is the most
    /// significant bit of the 16-bit subtype.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct AcvFaults: u16 {
        /// ACV0: the ring brackets of the SDW are not ordered.
        const IRO = 1 << 15;
        const OEB = 1 << 14;
        const E_OFF = 1 << 13;
        /// ACV3: the effective ring is outside the read bracket.
        const ORB = 1 << 12;
        /// ACV4: the segment is not readable.
        const R_OFF = 1 << 11;
        /// ACV5: the effective ring is outside the write bracket.
        const OWB = 1 << 10;
        /// ACV6: the segment is not writable.
        const W_OFF = 1 << 9;
        const NO_GA = 1 << 8;
        const OCB = 1 << 7;
        const OCALL = 1 << 6;
        const BOC = 1 << 5;
        const INRET = 1 << 4;
        const CRT = 1 << 3;
        const RALR = 1 << 2;
        const AME = 1 << 1;
        /// ACV15: the offset is beyond the segment bound.
        const OOSB = 1 << 0;
    }
}

const ACV_NAMES: [(&str, &str); 16] = [
    ("IRO", "Illegal ring order"),
    ("OEB", "Not in execute bracket"),
    ("E-OFF", "No execute permission"),
    ("ORB", "Not in read bracket"),
    ("R-OFF", "No read permission"),
    ("OWB", "Not in write bracket"),
    ("W-OFF", "No write permission"),
    ("NO GA", "Call limiter fault"),
    ("OCB", "Out of call brackets"),
    ("OCALL", "Outward call"),
    ("BOC", "Bad outward call"),
    ("INRET", "Inward return"),
    ("CRT", "Invalid ring crossing"),
    ("RALR", "Ring alarm"),
    ("AME", "Associative memory error"),
    ("OOSB", "Out of segment bounds"),
];

impl AcvFaults {
    pub const NONE: AcvFaults = AcvFaults::empty();

    /// The number n of the single condition ACVn.
    fn condition_number(&self) -> u32 {
        15 - self.bits().trailing_zeros().min(15)
    }

    /// The numbers n of the conditions ACVn which are present, in
    /// increasing order.
    pub fn numbers(&self) -> impl Iterator<Item = u32> {
        self.iter().map(|acv| acv.condition_number())
    }

    /// The long-form description of condition ACVn, for example
    /// "Out of segment bounds (ACV15=OOSB)".
    pub fn describe(n: u32) -> Option<String> {
        let (short, long) = ACV_NAMES.get(usize::try_from(n).ok()?)?;
        Some(format!("{long} (ACV{n}={short})"))
    }
}

impl Display for AcvFaults {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut sep = "";
        for n in self.numbers() {
            let (short, _) = ACV_NAMES[n as usize];
            write!(f, "{sep}ACV{n}={short}")?;
            sep = "|";
        }
        Ok(())
    }
}

/// Describes the kinds of fault the appending unit (and the main
/// memory behind it) can raise.
///
/// These acronyms are upper case to follow the names in the DPS-8
/// documentation.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize)]
pub enum FaultKind {
    STR,
    DF0,
    DF1,
    DF2,
    DF3,
    ACV,
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(match self {
            FaultKind::STR => "STR",
            FaultKind::DF0 => "DF0",
            FaultKind::DF1 => "DF1",
            FaultKind::DF2 => "DF2",
            FaultKind::DF3 => "DF3",
            FaultKind::ACV => "ACV",
        })
    }
}

impl FaultKind {
    /// The fault number, which selects the fault vector.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            FaultKind::STR => 1,
            FaultKind::DF0 => 16,
            FaultKind::DF1 => 17,
            FaultKind::DF2 => 18,
            FaultKind::DF3 => 19,
            FaultKind::ACV => 20,
        }
    }

    /// The directed fault selected by the fault code (FC) field of a
    /// descriptor which is not present.
    #[must_use]
    pub fn directed(fault_code: Unsigned2Bit) -> FaultKind {
        match u8::from(fault_code) {
            0 => FaultKind::DF0,
            1 => FaultKind::DF1,
            2 => FaultKind::DF2,
            _ => FaultKind::DF3,
        }
    }

    #[must_use]
    pub const fn all_fault_kinds() -> [FaultKind; 6] {
        [
            FaultKind::STR,
            FaultKind::DF0,
            FaultKind::DF1,
            FaultKind::DF2,
            FaultKind::DF3,
            FaultKind::ACV,
        ]
    }
}

#[derive(Debug)]
pub struct UnknownFaultName(String);

impl Display for UnknownFaultName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "unknown fault name '{}'", self.0)
    }
}

impl Error for UnknownFaultName {}

impl TryFrom<&str> for FaultKind {
    type Error = UnknownFaultName;
    fn try_from(s: &str) -> Result<FaultKind, UnknownFaultName> {
        match s {
            "STR" => Ok(FaultKind::STR),
            "DF0" => Ok(FaultKind::DF0),
            "DF1" => Ok(FaultKind::DF1),
            "DF2" => Ok(FaultKind::DF2),
            "DF3" => Ok(FaultKind::DF3),
            "ACV" => Ok(FaultKind::ACV),
            _ => Err(UnknownFaultName(s.to_owned())),
        }
    }
}

/// `FaultDetails` carries the subtype of a fault together with a
/// message for the log.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultDetails {
    /// Store fault.  Main memory does not exist at `address`.
    STR {
        address: Unsigned24Bit,
        message: String,
    },

    /// Directed fault.  A segment or page descriptor was not
    /// present; `fault_code` is its FC field and selects DF0-DF3.
    DF {
        fault_code: Unsigned2Bit,
        message: String,
    },

    /// Access violation.  `subtype` holds every condition detected
    /// during the cycle.
    ACV {
        subtype: AcvFaults,
        message: String,
    },
}

/// Describes a fault which ended an append cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub details: FaultDetails,
}

impl Fault {
    pub fn access_violation(subtype: AcvFaults, message: impl Into<String>) -> Fault {
        Fault {
            details: FaultDetails::ACV {
                subtype,
                message: message.into(),
            },
        }
    }

    pub fn directed(fault_code: Unsigned2Bit, message: impl Into<String>) -> Fault {
        Fault {
            details: FaultDetails::DF {
                fault_code,
                message: message.into(),
            },
        }
    }

    pub fn nonexistent_address(address: Unsigned24Bit) -> Fault {
        Fault {
            details: FaultDetails::STR {
                address,
                message: "nonexistent address".to_string(),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.details.kind()
    }

    /// The access violation conditions of an ACV fault; empty for
    /// other kinds of fault.
    #[must_use]
    pub fn acv_subtype(&self) -> AcvFaults {
        match &self.details {
            FaultDetails::ACV { subtype, .. } => *subtype,
            _ => AcvFaults::NONE,
        }
    }
}

impl FaultDetails {
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        match self {
            FaultDetails::STR { .. } => FaultKind::STR,
            FaultDetails::DF { fault_code, .. } => FaultKind::directed(*fault_code),
            FaultDetails::ACV { .. } => FaultKind::ACV,
        }
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let kind = self.kind();
        write!(f, "{kind} (fault {}): ", kind.number())?;
        match &self.details {
            FaultDetails::STR { address, message } => {
                write!(f, "{message} {address:>08o}")
            }
            FaultDetails::DF { message, .. } => f.write_str(message),
            FaultDetails::ACV { subtype, message } => write!(f, "{message} [{subtype}]"),
        }
    }
}

impl Error for Fault {}

/// A trait for objects which implement the raising of faults.
///
/// The appending unit passes every fault which ends a cycle to
/// `do_fault` exactly once and then returns the value it gets back
/// as the `Err` result of the cycle.
pub trait FaultDispatcher {
    fn do_fault(&mut self, fault: Fault) -> Fault;
}

#[test]
fn test_fault_kind_round_trip() {
    for orig_kind in FaultKind::all_fault_kinds() {
        let name = orig_kind.to_string();
        match FaultKind::try_from(name.as_str()) {
            Ok(k) => {
                assert_eq!(k, orig_kind);
            }
            Err(_) => {
                panic!("unable to round-trip fault kind {orig_kind:?}");
            }
        }
    }
    assert!(FaultKind::try_from("this is not a fault name").is_err());
}

#[test]
fn test_acv_bit_positions() {
    assert_eq!(AcvFaults::IRO.bits(), 0o100000);
    assert_eq!(AcvFaults::ORB.bits(), 1 << 12);
    assert_eq!(AcvFaults::OOSB.bits(), 1);
    let both = AcvFaults::ORB | AcvFaults::R_OFF;
    assert!(both.contains(AcvFaults::ORB));
    assert!(both.contains(AcvFaults::R_OFF));
    assert!(!both.contains(AcvFaults::OWB));
    assert_eq!(
        both.iter().collect::<Vec<_>>(),
        vec![AcvFaults::ORB, AcvFaults::R_OFF]
    );
    assert_eq!(both.numbers().collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn test_acv_display() {
    assert_eq!(AcvFaults::NONE.to_string(), "none");
    assert_eq!(
        (AcvFaults::IRO | AcvFaults::OOSB).to_string(),
        "ACV0=IRO|ACV15=OOSB"
    );
    assert_eq!(
        AcvFaults::describe(15).as_deref(),
        Some("Out of segment bounds (ACV15=OOSB)")
    );
    assert_eq!(AcvFaults::describe(16), None);
}

#[test]
fn test_fault_numbers() {
    assert_eq!(FaultKind::directed(u2!(0)).number(), 16);
    assert_eq!(FaultKind::directed(u2!(3)).number(), 19);
    assert_eq!(FaultKind::ACV.number(), 20);
    let f = Fault::directed(u2!(2), "PTW0.F == 0");
    assert_eq!(f.kind(), FaultKind::DF2);
    assert_eq!(f.acv_subtype(), AcvFaults::NONE);
    assert_eq!(f.to_string(), "DF2 (fault 18): PTW0.F == 0");
}
