/// One decoded 8x8 tile: `pixels[y][x]` is the 2-bit color index.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Tile {
    pub pixels: [[u8; 8]; 8],
}

impl Tile {
    /// Decode 16 raw bytes (two bit-planes per row, low plane first).
    pub fn decode(raw: &[u8; 16]) -> Self {
        let mut tile = Tile::default();
        for (y, row) in tile.pixels.iter_mut().enumerate() {
            let lo = raw[y * 2];
            let hi = raw[y * 2 + 1];
            for (x, pixel) in row.iter_mut().enumerate() {
                let bit = 7 - x;
                *pixel = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
            }
        }
        tile
    }
}

/// One decoded sprite table entry.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Sprite {
    /// Screen Y + 16.
    pub y: u8,
    /// Screen X + 8.
    pub x: u8,
    pub tile: u8,
    pub behind_background: bool,
    pub flip_y: bool,
    pub flip_x: bool,
    /// DMG palette select (OBP0/OBP1).
    pub palette: u8,
    /// Color-mode palette number.
    pub color_palette: u8,
}

impl Sprite {
    pub(super) fn update(&mut self, field: usize, value: u8) {
        match field {
            0 => self.y = value,
            1 => self.x = value,
            2 => self.tile = value,
            _ => {
                self.behind_background = value & 0x80 != 0;
                self.flip_y = value & 0x40 != 0;
                self.flip_x = value & 0x20 != 0;
                self.palette = (value >> 4) & 0x01;
                self.color_palette = value & 0x07;
            }
        }
    }
}

impl super::Gpu {
    /// Store a VRAM byte and re-decode the tile it belongs to, if any.
    pub(super) fn write_vram(&mut self, addr: u16, value: u8) {
        let offset = (addr & 0x1FFF) as usize;
        self.vram[offset] = value;
        if offset < super::TILE_COUNT * 16 {
            let id = offset / 16;
            self.raw_tiles[id][offset % 16] = value;
            self.tiles[id] = Tile::decode(&self.raw_tiles[id]);
        }
    }

    pub(super) fn write_oam(&mut self, addr: u16, value: u8) {
        let offset = (addr - 0xFE00) as usize;
        self.oam[offset] = value;
        self.sprites[offset / 4].update(offset % 4, value);
    }

    /// Map a tile-map entry to a tile cache index under the current tile
    /// data bank. The signed bank places entries 0..=127 at 0x9000.
    #[inline]
    pub(super) fn tile_index(&self, entry: u8) -> usize {
        if self.unsigned_tile_data || entry >= 0x80 {
            entry as usize
        } else {
            entry as usize + 256
        }
    }
}
