//! A processor, as far as address appending is concerned: one
//! appending unit together with the memory, associative memories and
//! fault unit it works with.  Separate `Processor` instances share
//! no state.
use tracing::{Level, event};

use base::prelude::*;

use crate::append::{AppendingUnit, ApuConfiguration};
use crate::backplane::StandardBackplane;
use crate::fault::Fault;
use crate::instruction::CurrentInstruction;
use crate::lookup::{LookupFailure, lookup_address};
use crate::memory::MemoryConfiguration;

#[derive(Default)]
pub struct ProcessorConfiguration {
    pub memory: MemoryConfiguration,
    pub apu: ApuConfiguration,
}

#[derive(Debug)]
pub struct Processor {
    pub apu: AppendingUnit,
    pub backplane: StandardBackplane,
}

impl Processor {
    pub fn new(config: &ProcessorConfiguration) -> Processor {
        event!(
            Level::DEBUG,
            "new processor: {} words of memory, WAM {}",
            config.memory.size_words,
            if config.apu.enable_wam {
                "enabled"
            } else {
                "disabled"
            }
        );
        Processor {
            apu: AppendingUnit::new(&config.apu),
            backplane: StandardBackplane::new(&config.memory, config.apu.wam_model),
        }
    }

    pub fn read(
        &mut self,
        inst: &CurrentInstruction,
        buf: &mut [Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.apu.operand_read(inst, &mut self.backplane, buf)
    }

    pub fn store(
        &mut self,
        inst: &CurrentInstruction,
        data: &[Unsigned36Bit],
    ) -> Result<Unsigned24Bit, Fault> {
        self.apu.operand_store(inst, &mut self.backplane, data)
    }

    pub fn absa(&mut self, inst: &CurrentInstruction) -> Result<Unsigned24Bit, Fault> {
        self.apu.absa(inst, &mut self.backplane)
    }

    pub fn load_dsbr(&mut self, y: &[Unsigned36Bit; 2]) {
        self.apu.load_dsbr(&mut self.backplane, y);
    }

    /// Translate `segno:offset` using the current DSBR, without side
    /// effects.
    pub fn lookup_address(
        &self,
        segno: Unsigned15Bit,
        offset: Unsigned18Bit,
    ) -> Result<Unsigned24Bit, LookupFailure> {
        lookup_address(&self.backplane.mem, &self.apu.dsbr, segno, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Sdw;
    use crate::fault::FaultKind;
    use crate::registers::Dsbr;
    use crate::wam::WamModel;

    fn processor() -> Processor {
        let mut p = Processor::new(&ProcessorConfiguration {
            memory: MemoryConfiguration {
                size_words: 0o100000,
            },
            apu: ApuConfiguration {
                enable_wam: true,
                wam_model: WamModel::L68,
            },
        });
        let dsbr = Dsbr {
            addr: u24!(0o1000),
            bnd: u14!(1),
            unpaged: true,
            stack: u12!(0),
        };
        p.load_dsbr(&dsbr.to_y_pair());
        let sdw = Sdw {
            addr: u24!(0o40000),
            r1: u3!(4),
            r2: u3!(4),
            r3: u3!(4),
            bound: u14!(0o77),
            r: true,
            w: true,
            u: true,
            df: true,
            ..Sdw::default()
        };
        let (even, odd) = sdw.to_words();
        p.backplane
            .mem
            .load(u24!(0o1002), &[even, odd])
            .expect("in range");
        p.apu.ppr.prr = u3!(4);
        p.apu.tpr.trr = u3!(4);
        p.apu.tpr.tsr = u15!(1);
        p
    }

    #[test]
    fn test_processors_are_independent() {
        let lda = CurrentInstruction::new(u9!(0o235), false);
        let mut first = processor();
        let mut second = processor();

        first.apu.tpr.ca = u18!(0o17);
        assert_eq!(first.store(&lda, &[u36!(0o525252)]), Ok(u24!(0o40017)));
        assert!(!first.backplane.wam.sdwam.is_empty());

        assert!(second.backplane.wam.sdwam.is_empty());
        assert_eq!(second.backplane.mem.peek(u24!(0o40017)), Some(Unsigned36Bit::ZERO));
        assert_eq!(second.apu.last_cycle(), crate::cycle::ProcessorCycle::Unknown);

        second.apu.tpr.ca = u18!(0o2000);
        let fault = second.absa(&lda).expect_err("CA is out of bounds");
        assert_eq!(fault.kind(), FaultKind::ACV);
        assert_eq!(second.backplane.faults.get_status_of_fault("ACV").map(|s| s.count), Some(1));
        assert_eq!(first.backplane.faults.get_status_of_fault("ACV").map(|s| s.count), Some(0));
    }

    #[test]
    fn test_read_back() {
        let lda = CurrentInstruction::new(u9!(0o235), false);
        let mut p = processor();
        p.apu.tpr.ca = u18!(3);
        p.store(&lda, &[u36!(0o1234)]).expect("store should succeed");
        let mut buf = [Unsigned36Bit::ZERO];
        assert_eq!(p.read(&lda, &mut buf), Ok(u24!(0o40003)));
        assert_eq!(buf, [u36!(0o1234)]);
        assert_eq!(p.lookup_address(u15!(1), u18!(3)), Ok(u24!(0o40003)));
    }
}
