use crate::machine::{Bus, LcdMode, Peripheral};
use crate::{Access, EmulatorError};

const SOURCE_HIGH: u16 = 0xFF51;
const SOURCE_LOW: u16 = 0xFF52;
const DEST_HIGH: u16 = 0xFF53;
const DEST_LOW: u16 = 0xFF54;
const CONTROL: u16 = 0xFF55;

/// Bytes moved per block.
const BLOCK_SIZE: u16 = 0x10;
/// Cycles one block occupies at normal speed.
pub const BLOCK_CYCLES: u32 = 32;
/// Remaining-length value reported when no transfer is pending.
const IDLE_LENGTH: u8 = 0x7F;

/// Color-mode VRAM DMA (FF51-FF55).
///
/// A general-purpose transfer copies every block back to back; an H-blank
/// transfer copies one block per H-blank, or freely while the display is
/// off.
pub struct Hdma {
    source_high: u8,
    source_low: u8,
    dest_high: u8,
    dest_low: u8,

    source: u16,
    destination: u16,
    /// Blocks left in the current transfer, `IDLE_LENGTH` when idle.
    remaining: u8,
    running: bool,
    hblank_transfer: bool,
    /// Last mode reported by the graphics engine. Cleared once a block has
    /// been copied in the current H-blank so the next block waits for the
    /// following one.
    gpu_mode: Option<LcdMode>,
    display_on: bool,
}

impl Default for Hdma {
    fn default() -> Self {
        Self::new()
    }
}

impl Hdma {
    pub const NAME: &'static str = "HDMA";

    pub fn new() -> Self {
        Self {
            source_high: 0,
            source_low: 0,
            dest_high: 0,
            dest_low: 0,
            source: 0,
            destination: 0x8000,
            remaining: IDLE_LENGTH,
            running: false,
            hblank_transfer: false,
            gpu_mode: None,
            display_on: false,
        }
    }

    /// True when the engine wants the next tick instead of the instruction
    /// unit.
    pub fn is_running(&self) -> bool {
        if !self.running {
            return false;
        }
        if !self.hblank_transfer {
            return true;
        }
        self.gpu_mode == Some(LcdMode::HBlank) || !self.display_on
    }

    /// Copy one 16-byte block and return the cycles it took.
    pub fn step(&mut self, bus: &mut Bus) -> u32 {
        if !self.is_running() {
            return 0;
        }

        for offset in 0..BLOCK_SIZE {
            let value = bus.read(self.source.wrapping_add(offset));
            bus.write(self.destination.wrapping_add(offset), value);
        }
        self.source = self.source.wrapping_add(BLOCK_SIZE);
        self.destination = 0x8000 | (self.destination.wrapping_add(BLOCK_SIZE) & 0x1FFF);

        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            self.remaining = IDLE_LENGTH;
            log::debug!("GBC HDMA: transfer complete");
        } else if self.gpu_mode == Some(LcdMode::HBlank) {
            self.gpu_mode = None;
        }
        BLOCK_CYCLES
    }

    pub fn on_mode_change(&mut self, mode: LcdMode) {
        self.gpu_mode = Some(mode);
    }

    pub fn on_display_change(&mut self, on: bool) {
        self.display_on = on;
    }

    pub fn source(&self) -> u16 {
        self.source
    }

    pub fn destination(&self) -> u16 {
        self.destination
    }

    fn write_control(&mut self, value: u8) {
        if self.running && value & 0x80 == 0 {
            self.running = false;
            log::debug!(
                "GBC HDMA: transfer stopped with {} block(s) left",
                self.remaining
            );
            return;
        }

        self.source = u16::from_be_bytes([self.source_high, self.source_low]);
        self.destination = 0x8000 | u16::from_be_bytes([self.dest_high, self.dest_low]);
        self.remaining = (value & 0x7F) + 1;
        self.hblank_transfer = value & 0x80 != 0;
        self.running = true;
        log::debug!(
            "GBC HDMA: {} transfer of {} block(s) 0x{:04X} -> 0x{:04X}",
            if self.hblank_transfer { "H-blank" } else { "general" },
            self.remaining,
            self.source,
            self.destination
        );
    }
}

impl Peripheral for Hdma {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, addr: u16) -> Result<u8, EmulatorError> {
        match addr {
            SOURCE_HIGH..=DEST_LOW => Ok(0xFF),
            CONTROL if self.running => Ok(0x00),
            CONTROL => Ok(0x80 | (self.remaining & 0x7F)),
            _ => Err(EmulatorError::UnhandledRegister {
                peripheral: Self::NAME,
                address: addr,
                access: Access::Read,
            }),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError> {
        match addr {
            SOURCE_HIGH => self.source_high = value,
            SOURCE_LOW => self.source_low = value & 0xF0,
            DEST_HIGH => self.dest_high = value & 0x1F,
            DEST_LOW => self.dest_low = value & 0xF0,
            CONTROL => self.write_control(value),
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

    fn reset(&mut self) {
        *self = Self::new();
    }
}
