use crate::machine::{Bus, Peripheral};
use crate::{Access, EmulatorError};

const DMA_REG: u16 = 0xFF46;
const OAM_START: u16 = 0xFE00;
const TRANSFER_LEN: u16 = 0xA0;
/// Speed-scaled cycles between the trigger write and the copy.
pub const TRANSFER_DELAY: u32 = 648;

/// Sprite-table DMA (FF46).
///
/// The copy itself is atomic: nothing lands in OAM until the delay has
/// elapsed, then all 160 bytes are written at once.
#[derive(Default)]
pub struct OamDma {
    source: u16,
    cycles: u32,
    running: bool,
    /// Last value written to FF46, which reads back unchanged.
    register: u8,
}

impl OamDma {
    pub const NAME: &'static str = "OAM-DMA";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn step(&mut self, cycles: u32, bus: &mut Bus) {
        if !self.running {
            return;
        }
        self.cycles += cycles;
        if self.cycles < TRANSFER_DELAY {
            return;
        }

        self.running = false;
        self.cycles = 0;
        for offset in 0..TRANSFER_LEN {
            let value = bus.read(self.source.wrapping_add(offset));
            bus.write(OAM_START + offset, value);
        }
        log::debug!("GBC OAM DMA: copied 0x{:04X} -> 0x{:04X}", self.source, OAM_START);
    }
}

impl Peripheral for OamDma {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, addr: u16) -> Result<u8, EmulatorError> {
        if addr != DMA_REG {
            return Err(EmulatorError::UnhandledRegister {
                peripheral: Self::NAME,
                address: addr,
                access: Access::Read,
            });
        }
        Ok(self.register)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError> {
        if addr != DMA_REG {
            return Err(EmulatorError::UnhandledRegister {
                peripheral: Self::NAME,
                address: addr,
                access: Access::Write,
            });
        }
        self.register = value;
        self.source = u16::from(value) << 8;
        self.running = true;
        self.cycles = 0;
        log::debug!("GBC OAM DMA: armed from 0x{:04X}", self.source);
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
