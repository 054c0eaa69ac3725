use super::{Bus, InterruptFlags};

/// Boot status register; any non-zero write leaves boot mode for good.
pub(crate) const BOOT_STATUS_REG: u16 = 0xFF50;
pub(crate) const INTERRUPT_FLAG_REG: u16 = 0xFF0F;
pub(crate) const INTERRUPT_ENABLE_REG: u16 = 0xFFFF;
pub(crate) const SPEED_PREP_REG: u16 = 0xFF4D;
pub(crate) const WRAM_BANK_REG: u16 = 0xFF70;

/// Value returned for addresses nothing answers to.
const UNMAPPED_READ: u8 = 0x00;
/// Value returned when the owning peripheral is busy (re-entrant access).
const BUSY_READ: u8 = 0xFF;

impl Bus {
    pub fn read(&mut self, addr: u16) -> u8 {
        if addr == BOOT_STATUS_REG {
            return self.boot_status;
        }
        if let Some(index) = self.io_map[addr as usize] {
            return self.read_peripheral(index, addr);
        }

        match addr {
            0x0000..=0x00FF if self.in_boot_mode => self.boot[addr as usize],
            0x0000..=0x7FFF => self.rom[addr as usize],
            0xA000..=0xBFFF => self.external_ram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram_read(addr),
            0xE000..=0xFDFF => self.shadow_read(addr),
            INTERRUPT_FLAG_REG => self.interrupts.flags().bits() | 0xE0,
            SPEED_PREP_REG if self.color_mode() => self.speed_prep,
            WRAM_BANK_REG if self.color_mode() => self.wram_bank | 0xF8,
            0xFF80..=0xFFFF => self.zero_page[(addr - 0xFF80) as usize],
            _ => {
                self.report_unmapped(addr, "read");
                UNMAPPED_READ
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if addr == BOOT_STATUS_REG {
            self.write_boot_status(value);
            return;
        }
        if let Some(index) = self.io_map[addr as usize] {
            self.write_peripheral(index, addr, value);
            return;
        }

        match addr {
            0x0000..=0x7FFF => {
                // No bank controller: the ROM ignores writes.
                log::trace!("GBC bus: discarded ROM write 0x{value:02X} -> 0x{addr:04X}");
            }
            0xA000..=0xBFFF => self.external_ram[(addr - 0xA000) as usize] = value,
            0xC000..=0xDFFF => self.wram_write(addr, value),
            0xE000..=0xFDFF => self.shadow_write(addr, value),
            INTERRUPT_FLAG_REG => self
                .interrupts
                .set_flags(InterruptFlags::from_bits_truncate(value)),
            SPEED_PREP_REG if self.color_mode() => self.speed_prep = value,
            WRAM_BANK_REG if self.color_mode() => self.wram_bank = value & 0x07,
            0xFF80..=0xFFFF => self.zero_page[(addr - 0xFF80) as usize] = value,
            _ => self.report_unmapped(addr, "write"),
        }
    }

    /// Little-endian word read composed of two byte reads, low byte first.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let low = self.read(addr);
        let high = self.read(addr.wrapping_add(1));
        u16::from(high) << 8 | u16::from(low)
    }

    /// Word write decomposed into two byte writes, low byte first.
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.write(addr, low);
        self.write(addr.wrapping_add(1), high);
    }

    /// Interrupt enable register (0xFFFF).
    pub fn interrupt_enable(&self) -> InterruptFlags {
        InterruptFlags::from_bits_truncate(self.zero_page[ZERO_PAGE_IE])
    }

    fn write_boot_status(&mut self, value: u8) {
        self.boot_status = value;
        if self.in_boot_mode && value != 0x00 {
            self.in_boot_mode = false;
            log::info!("GBC bus: boot status 0x{value:02X} written, leaving boot mode");
        }
    }

    fn read_peripheral(&mut self, index: usize, addr: u16) -> u8 {
        let result = match self.peripherals[index].try_borrow() {
            Ok(peripheral) => Some(peripheral.read(addr)),
            Err(_) => None,
        };
        match result {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                self.latch_fault(err);
                UNMAPPED_READ
            }
            None => {
                log::warn!("GBC bus: re-entrant read of 0x{addr:04X} while its owner is busy");
                BUSY_READ
            }
        }
    }

    fn write_peripheral(&mut self, index: usize, addr: u16, value: u8) {
        let result = match self.peripherals[index].try_borrow_mut() {
            Ok(mut peripheral) => Some(peripheral.write(addr, value)),
            Err(_) => None,
        };
        match result {
            Some(Ok(())) => {}
            Some(Err(err)) => self.latch_fault(err),
            None => {
                log::warn!("GBC bus: re-entrant write to 0x{addr:04X} while its owner is busy")
            }
        }
    }

    /// First access to an unmapped address is reported at `warn`, repeats at
    /// `trace`.
    fn report_unmapped(&mut self, addr: u16, access: &str) {
        let word = addr as usize / 64;
        let bit = 1u64 << (addr as usize % 64);
        if self.reported[word] & bit == 0 {
            self.reported[word] |= bit;
            log::warn!("GBC bus: {access} of unmapped address 0x{addr:04X}");
        } else {
            log::trace!("GBC bus: {access} of unmapped address 0x{addr:04X}");
        }
    }
}

const ZERO_PAGE_IE: usize = (INTERRUPT_ENABLE_REG - 0xFF80) as usize;
