use super::Peripheral;
use crate::{Access, EmulatorError};

const FIRST: u16 = 0xFF10;
const LAST: u16 = 0xFF3F;

/// Sound registers without sound: every byte written reads back as is.
pub struct Apu {
    registers: [u8; (LAST - FIRST + 1) as usize],
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub const NAME: &'static str = "APU";

    pub fn new() -> Self {
        Self {
            registers: [0; (LAST - FIRST + 1) as usize],
        }
    }

    fn slot(addr: u16, access: Access) -> Result<usize, EmulatorError> {
        match addr {
            FIRST..=LAST => Ok((addr - FIRST) as usize),
            _ => Err(EmulatorError::UnhandledRegister {
                peripheral: Self::NAME,
                address: addr,
                access,
            }),
        }
    }
}

impl Peripheral for Apu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, addr: u16) -> Result<u8, EmulatorError> {
        Ok(self.registers[Self::slot(addr, Access::Read)?])
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError> {
        self.registers[Self::slot(addr, Access::Write)?] = value;
        Ok(())
    }

    fn reset(&mut self) {
        self.registers = [0; (LAST - FIRST + 1) as usize];
    }
}
