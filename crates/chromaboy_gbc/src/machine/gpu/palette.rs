use chromaboy_common::Color;

/// Split a DMG palette register into its four 2-bit shades, index 0 first.
#[inline]
pub(super) fn decode_dmg_palette(value: u8) -> [u8; 4] {
    [
        value & 0x03,
        (value >> 2) & 0x03,
        (value >> 4) & 0x03,
        (value >> 6) & 0x03,
    ]
}

/// Color-mode palette memory: 8 palettes of 4 BGR555 colors, reached
/// through an index register (bit 7 = auto-increment) and a data register.
#[derive(Clone, Debug)]
pub(crate) struct PaletteRam {
    data: [u8; 64],
    index: u8,
    auto_increment: bool,
}

impl Default for PaletteRam {
    fn default() -> Self {
        // Power-on Color palettes are white.
        Self {
            data: [0xFF; 64],
            index: 0,
            auto_increment: false,
        }
    }
}

impl PaletteRam {
    pub(crate) fn read_index(&self) -> u8 {
        self.index | 0x40 | if self.auto_increment { 0x80 } else { 0x00 }
    }

    pub(crate) fn write_index(&mut self, value: u8) {
        self.index = value & 0x3F;
        self.auto_increment = value & 0x80 != 0;
    }

    pub(crate) fn read_data(&self) -> u8 {
        self.data[self.index as usize]
    }

    pub(crate) fn write_data(&mut self, value: u8) {
        self.data[self.index as usize] = value;
        if self.auto_increment {
            self.index = (self.index + 1) & 0x3F;
        }
    }

    pub(crate) fn color(&self, palette: u8, index: u8) -> Color {
        let base = (palette as usize & 0x07) * 8 + (index as usize & 0x03) * 2;
        Color::from_bgr555(u16::from_le_bytes([self.data[base], self.data[base + 1]]))
    }
}
