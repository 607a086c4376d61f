//! The fault unit is the standard [`FaultDispatcher`].  It keeps a
//! record of the faults the appending unit has raised.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{Level, event};

use crate::fault::{Fault, FaultDispatcher, FaultKind};

#[derive(Debug, Serialize)]
pub struct FaultStatus {
    pub name: String,
    pub number: u8,
    pub count: u64,
    /// Text of the most recent fault of this kind.
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FaultUnit {
    counts: BTreeMap<FaultKind, u64>,
    latest: BTreeMap<FaultKind, Fault>,
    last: Option<Fault>,
    changes: BTreeSet<FaultKind>,
}

impl FaultUnit {
    pub fn new() -> FaultUnit {
        FaultUnit::default()
    }

    fn status_for_fault_kind(&self, kind: &FaultKind) -> FaultStatus {
        FaultStatus {
            name: kind.to_string(),
            number: kind.number(),
            count: self.counts.get(kind).copied().unwrap_or(0),
            message: match self.latest.get(kind) {
                Some(f) => f.to_string(),
                None => String::new(),
            },
        }
    }

    pub fn get_fault_statuses(&self) -> Vec<FaultStatus> {
        FaultKind::all_fault_kinds()
            .iter()
            .map(|kind| self.status_for_fault_kind(kind))
            .collect()
    }

    pub fn get_status_of_fault(&self, name: &str) -> Option<FaultStatus> {
        FaultKind::try_from(name)
            .map(|k| self.status_for_fault_kind(&k))
            .ok()
    }

    /// Statuses of the fault kinds raised since the last call.
    pub fn drain_fault_changes(&mut self) -> BTreeMap<FaultKind, FaultStatus> {
        std::mem::take(&mut self.changes)
            .into_iter()
            .map(|kind| (kind, self.status_for_fault_kind(&kind)))
            .collect()
    }

    /// The fault which ended the most recent faulting cycle.
    pub fn last_fault(&self) -> Option<&Fault> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        event!(Level::INFO, "clearing fault history");
        self.counts.clear();
        self.latest.clear();
        self.last = None;
        self.changes.clear();
    }
}

impl FaultDispatcher for FaultUnit {
    fn do_fault(&mut self, fault: Fault) -> Fault {
        let kind = fault.kind();
        event!(Level::DEBUG, "raising fault {}", fault);
        *self.counts.entry(kind).or_default() += 1;
        self.latest.insert(kind, fault.clone());
        self.changes.insert(kind);
        self.last = Some(fault.clone());
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::AcvFaults;
    use base::prelude::*;

    #[test]
    fn test_fault_counts() {
        let mut unit = FaultUnit::new();
        unit.do_fault(Fault::access_violation(AcvFaults::ORB, "ACV fault"));
        unit.do_fault(Fault::directed(u2!(1), "SDW.F == 0"));
        let f = unit.do_fault(Fault::access_violation(AcvFaults::OWB, "ACV fault"));
        assert_eq!(unit.last_fault(), Some(&f));

        let acv = unit.get_status_of_fault("ACV").expect("ACV is a fault kind");
        assert_eq!(acv.count, 2);
        assert_eq!(acv.number, 20);
        assert!(acv.message.contains("ACV5=OWB"), "message was {}", acv.message);
        let str_status = unit.get_status_of_fault("STR").expect("STR is a fault kind");
        assert_eq!(str_status.count, 0);
        assert!(unit.get_status_of_fault("XYZ").is_none());
    }

    #[test]
    fn test_drain_fault_changes() {
        let mut unit = FaultUnit::new();
        unit.do_fault(Fault::directed(u2!(2), "PTW.F == 0"));
        let changes = unit.drain_fault_changes();
        assert_eq!(changes.keys().copied().collect::<Vec<_>>(), vec![FaultKind::DF2]);
        assert!(unit.drain_fault_changes().is_empty());
        unit.clear();
        assert!(unit.last_fault().is_none());
        assert_eq!(unit.get_fault_statuses().len(), 6);
    }
}
