use super::{Timer, DEFAULT_FREQUENCY, DIVIDER_FREQUENCY};
use crate::machine::{InterruptHandle, Peripheral};
use crate::{Access, EmulatorError};

const DIV: u16 = 0xFF04;
const TIMA: u16 = 0xFF05;
const TMA: u16 = 0xFF06;
const TAC: u16 = 0xFF07;

impl Timer {
    /// Any write clears DIV; its phase keeps running.
    fn write_div(&mut self) {
        self.divider.value = 0;
    }

    fn write_tac(&mut self, value: u8) {
        let frequency = value & 0x03;
        if frequency != self.main.frequency() {
            self.main.set_frequency(frequency);
            log::debug!(
                "GBC timer: TIMA now every {} cycles",
                self.main.cycles_per_tick()
            );
        }
        self.tac = value & 0x07;
    }
}

impl Peripheral for Timer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, addr: u16) -> Result<u8, EmulatorError> {
        match addr {
            DIV => Ok(self.divider.value),
            TIMA => Ok(self.main.value),
            TMA => Ok(self.tma),
            TAC => Ok(self.tac | 0b1111_1000),
            _ => Err(EmulatorError::UnhandledRegister {
                peripheral: Self::NAME,
                address: addr,
                access: Access::Read,
            }),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError> {
        match addr {
            DIV => self.write_div(),
            TIMA => self.main.value = value,
            TMA => self.tma = value,
            TAC => self.write_tac(value),
            _ => {
                return Err(EmulatorError::UnhandledRegister {
                    peripheral: Self::NAME,
                    address: addr,
                    access: Access::Write,
                })
            }
        }
        Ok(())
    }

    fn link_interrupt_router(&mut self, router: InterruptHandle) {
        self.interrupts = router;
        log::debug!("GBC timer: linked interrupt router");
    }

    fn reset(&mut self) {
        self.divider.reset(DIVIDER_FREQUENCY);
        self.main.reset(DEFAULT_FREQUENCY);
        self.tac = 0;
        self.tma = 0;
        log::debug!("GBC timer: reset");
    }
}
