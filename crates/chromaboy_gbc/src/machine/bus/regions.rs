use std::fmt;

use super::{Bus, BOOT_SIZE, ROM_SIZE, WRAM_BANK_SIZE};
use crate::EmulatorError;

/// Load targets for `Bus::load_region`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegionKind {
    /// Boot code overlaying 0x0000..=0x00FF while boot mode is active.
    Boot,
    /// Cartridge ROM, 0x0000..=0x7FFF without bank switching.
    Rom,
}

impl RegionKind {
    pub const fn capacity(self) -> usize {
        match self {
            RegionKind::Boot => BOOT_SIZE,
            RegionKind::Rom => ROM_SIZE,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Boot => f.write_str("boot"),
            RegionKind::Rom => f.write_str("cartridge ROM"),
        }
    }
}

impl Bus {
    /// Copy `data` into `kind` starting at `offset`.
    ///
    /// Nothing is written unless the whole image fits.
    pub fn load_region(
        &mut self,
        kind: RegionKind,
        offset: usize,
        data: &[u8],
    ) -> Result<(), EmulatorError> {
        let capacity = kind.capacity();
        if data.len() > capacity {
            return Err(EmulatorError::RomTooLarge {
                region: kind,
                len: data.len(),
                capacity,
            });
        }
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= capacity)
            .ok_or(EmulatorError::RomOverflowsRegion {
                region: kind,
                offset,
                len: data.len(),
                capacity,
            })?;

        let target: &mut [u8] = match kind {
            RegionKind::Boot => &mut self.boot[..],
            RegionKind::Rom => &mut self.rom[..],
        };
        target[offset..end].copy_from_slice(data);
        log::info!(
            "GBC bus: loaded {} byte(s) into {} at offset 0x{:04X}",
            data.len(),
            kind,
            offset
        );
        Ok(())
    }

    /// Working RAM bank visible at 0xD000..=0xDFFF. Bank 0 is always at
    /// 0xC000; in Color mode SVBK picks 1..=7 (0 selects 1).
    #[inline]
    pub(super) fn switchable_wram_bank(&self) -> usize {
        if self.color_mode() {
            (self.wram_bank & 0x07).max(1) as usize
        } else {
            1
        }
    }

    #[inline]
    pub(super) fn wram_read(&self, addr: u16) -> u8 {
        let offset = (addr as usize) & (WRAM_BANK_SIZE - 1);
        if addr < 0xD000 {
            self.internal_ram[0][offset]
        } else {
            self.internal_ram[self.switchable_wram_bank()][offset]
        }
    }

    #[inline]
    pub(super) fn wram_write(&mut self, addr: u16, value: u8) {
        let offset = (addr as usize) & (WRAM_BANK_SIZE - 1);
        if addr < 0xD000 {
            self.internal_ram[0][offset] = value;
        } else {
            let bank = self.switchable_wram_bank();
            self.internal_ram[bank][offset] = value;
        }
    }

    /// 0xE000..=0xFDFF mirrors 0xC000..=0xDDFF through the bank selected
    /// at the time of the access.
    #[inline]
    pub(super) fn shadow_read(&self, addr: u16) -> u8 {
        self.wram_read(addr - 0x2000)
    }

    #[inline]
    pub(super) fn shadow_write(&mut self, addr: u16, value: u8) {
        self.wram_write(addr - 0x2000, value);
    }
}
