use chromaboy_common::FrameBuffer;

use super::palette::decode_dmg_palette;
use super::{Gpu, LcdMode, TILEMAP_0, TILEMAP_1};
use crate::error::Access;
use crate::machine::{InterruptHandle, Peripheral};
use crate::EmulatorError;

const LCDC: u16 = 0xFF40;
const STAT: u16 = 0xFF41;
const SCY: u16 = 0xFF42;
const SCX: u16 = 0xFF43;
const LY: u16 = 0xFF44;
const LYC: u16 = 0xFF45;
const BGP: u16 = 0xFF47;
const OBP0: u16 = 0xFF48;
const OBP1: u16 = 0xFF49;
const WY: u16 = 0xFF4A;
const WX: u16 = 0xFF4B;
const BCPS: u16 = 0xFF68;
const BCPD: u16 = 0xFF69;
const OCPS: u16 = 0xFF6A;
const OCPD: u16 = 0xFF6B;

impl Gpu {
    /// Decode LCDC into the cached layer/bank flags.
    ///
    /// Pandocs: LCDC bit 7 display enable, 6 window map, 5 window enable,
    /// 4 tile data bank, 3 background map, 2 sprite size, 1 sprites, 0 BG.
    pub(super) fn write_lcdc(&mut self, value: u8) {
        let was_on = self.display_on;
        self.lcdc = value;
        self.display_on = value & 0x80 != 0;
        self.window_tilemap = if value & 0x40 != 0 { TILEMAP_1 } else { TILEMAP_0 };
        self.window_on = value & 0x20 != 0;
        self.unsigned_tile_data = value & 0x10 != 0;
        self.bg_tilemap = if value & 0x08 != 0 { TILEMAP_1 } else { TILEMAP_0 };
        self.sprite_height = if value & 0x04 != 0 { 16 } else { 8 };
        self.sprites_on = value & 0x02 != 0;
        self.background_on = value & 0x01 != 0;

        if was_on != self.display_on {
            self.ly = 0;
            self.clock = 0;
            self.window_line = 0;
            if self.display_on {
                self.set_mode(LcdMode::OamScan);
                log::debug!("GBC GPU: display on (LCDC=0x{:02X})", value);
            } else {
                self.set_mode(LcdMode::HBlank);
                log::debug!("GBC GPU: display off");
            }
        }
    }

    fn read_stat(&self) -> u8 {
        0x80 | (self.stat & 0x78) | (u8::from(self.coincidence) << 2) | self.mode as u8
    }

    fn unhandled(&self, address: u16, access: Access) -> EmulatorError {
        EmulatorError::UnhandledRegister {
            peripheral: Self::NAME,
            address,
            access,
        }
    }
}

impl Peripheral for Gpu {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, addr: u16) -> Result<u8, EmulatorError> {
        let value = match addr {
            0x8000..=0x9FFF => self.vram[(addr & 0x1FFF) as usize],
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],
            LCDC => self.lcdc,
            STAT => self.read_stat(),
            SCY => self.scroll_y,
            SCX => self.scroll_x,
            LY => self.ly,
            LYC => self.lyc,
            BGP => self.bgp,
            OBP0 => self.obp0,
            OBP1 => self.obp1,
            WY => self.window_y,
            WX => self.window_x,
            BCPS | BCPD | OCPS | OCPD if !self.color_mode => 0xFF,
            BCPS => self.bg_color_palettes.read_index(),
            BCPD => self.bg_color_palettes.read_data(),
            OCPS => self.obj_color_palettes.read_index(),
            OCPD => self.obj_color_palettes.read_data(),
            _ => return Err(self.unhandled(addr, Access::Read)),
        };
        Ok(value)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError> {
        match addr {
            0x8000..=0x9FFF => self.write_vram(addr, value),
            0xFE00..=0xFE9F => self.write_oam(addr, value),
            LCDC => self.write_lcdc(value),
            STAT => self.stat = value & 0x78,
            SCY => self.scroll_y = value,
            SCX => self.scroll_x = value,
            // Writing LY restarts the line counter.
            LY => {
                self.ly = 0;
                self.clock = 0;
            }
            LYC => self.lyc = value,
            BGP => {
                self.bgp = value;
                self.bg_palette = decode_dmg_palette(value);
            }
            OBP0 => {
                self.obp0 = value;
                self.obj_palettes[0] = decode_dmg_palette(value);
            }
            OBP1 => {
                self.obp1 = value;
                self.obj_palettes[1] = decode_dmg_palette(value);
            }
            WY => self.window_y = value,
            WX => self.window_x = value,
            BCPS | BCPD | OCPS | OCPD if !self.color_mode => {
                log::trace!("GBC GPU: palette write 0x{:04X} ignored outside color mode", addr);
            }
            BCPS => self.bg_color_palettes.write_index(value),
            BCPD => self.bg_color_palettes.write_data(value),
            OCPS => self.obj_color_palettes.write_index(value),
            OCPD => self.obj_color_palettes.write_data(value),
            _ => return Err(self.unhandled(addr, Access::Write)),
        }
        Ok(())
    }

    fn link_interrupt_router(&mut self, router: InterruptHandle) {
        self.interrupts = router;
    }

    fn reset(&mut self) {
        self.write_lcdc(0x00);
        self.frame = FrameBuffer::default();
        self.mode = LcdMode::HBlank;
        self.mode_changed = false;
        self.ly = 0;
        self.clock = 0;
        self.window_line = 0;
        self.coincidence = false;
        log::debug!("GBC GPU: reset");
    }
}
