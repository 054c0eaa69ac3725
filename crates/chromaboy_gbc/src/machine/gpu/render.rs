use chromaboy_common::{Color, SCREEN_WIDTH};

use super::{Gpu, SPRITE_COUNT};

/// Hardware limit on sprites drawn per line.
const SPRITES_PER_LINE: usize = 10;

impl Gpu {
    /// Rasterise the current scan line into the frame buffer.
    pub(super) fn render_line(&mut self) {
        let y = self.ly as usize;
        if self.background_on || self.color_mode {
            self.render_background_line();
        } else {
            self.line_indices = [0; SCREEN_WIDTH];
            for x in 0..SCREEN_WIDTH {
                self.frame.set_pixel(x, y, Color::DMG_SHADES[0]);
            }
        }
        if self.window_on {
            self.render_window_line();
        }
        if self.sprites_on {
            self.render_sprite_line();
        }
    }

    /// Background: walk 160 pixels across the selected tile map, starting
    /// at the scrolled tile and wrapping after 32 map columns.
    fn render_background_line(&mut self) {
        let y = self.ly as usize;
        let bg_y = self.ly.wrapping_add(self.scroll_y);
        let map_offset = self.bg_tilemap + (u16::from(bg_y >> 3) << 5);
        let mut line_offset = u16::from(self.scroll_x >> 3) % 32;
        let tile_y = (bg_y & 7) as usize;
        let mut tile_x = (self.scroll_x & 7) as usize;

        let mut tile = self.tile_index(self.map_entry(map_offset + line_offset));
        for x in 0..SCREEN_WIDTH {
            let index = self.tiles[tile].pixels[tile_y][tile_x];
            self.line_indices[x] = index;
            let color = self.background_color(index);
            self.frame.set_pixel(x, y, color);

            tile_x += 1;
            if tile_x == 8 {
                tile_x = 0;
                line_offset = (line_offset + 1) % 32;
                tile = self.tile_index(self.map_entry(map_offset + line_offset));
            }
        }
    }

    fn render_window_line(&mut self) {
        if self.ly < self.window_y || self.window_x > 166 {
            return;
        }
        let y = self.ly as usize;
        let start = i16::from(self.window_x) - 7;
        let map_offset = self.window_tilemap + (u16::from(self.window_line >> 3) << 5);
        let tile_y = (self.window_line & 7) as usize;

        for x in start.max(0) as usize..SCREEN_WIDTH {
            let win_x = (x as i16 - start) as u16;
            let tile = self.tile_index(self.map_entry(map_offset + (win_x >> 3)));
            let index = self.tiles[tile].pixels[tile_y][(win_x & 7) as usize];
            self.line_indices[x] = index;
            let color = self.background_color(index);
            self.frame.set_pixel(x, y, color);
        }
        self.window_line = self.window_line.wrapping_add(1);
    }

    fn render_sprite_line(&mut self) {
        let ly = i16::from(self.ly);
        let height = i16::from(self.sprite_height);

        let mut visible = [0usize; SPRITES_PER_LINE];
        let mut count = 0;
        for id in 0..SPRITE_COUNT {
            let top = i16::from(self.sprites[id].y) - 16;
            if ly >= top && ly < top + height {
                visible[count] = id;
                count += 1;
                if count == SPRITES_PER_LINE {
                    break;
                }
            }
        }

        // Lowest X wins, then lowest table index; draw the winners last.
        let sprites = &self.sprites;
        visible[..count].sort_by(|&a, &b| (sprites[b].x, b).cmp(&(sprites[a].x, a)));

        for &id in &visible[..count] {
            let sprite = self.sprites[id];
            let mut row = ly - (i16::from(sprite.y) - 16);
            if sprite.flip_y {
                row = height - 1 - row;
            }
            let tile = if height == 16 {
                (sprite.tile & 0xFE) as usize + ((row as usize) >> 3)
            } else {
                sprite.tile as usize
            };
            let row = (row & 7) as usize;

            for col in 0..8i16 {
                let x = i16::from(sprite.x) - 8 + col;
                if !(0..SCREEN_WIDTH as i16).contains(&x) {
                    continue;
                }
                let src_x = (if sprite.flip_x { 7 - col } else { col }) as usize;
                let index = self.tiles[tile].pixels[row][src_x];
                // Color 0 is transparent for sprites.
                if index == 0 {
                    continue;
                }
                let x = x as usize;
                if sprite.behind_background && self.line_indices[x] != 0 {
                    continue;
                }
                let color = if self.color_mode {
                    self.obj_color_palettes.color(sprite.color_palette, index)
                } else {
                    let shade = self.obj_palettes[sprite.palette as usize][index as usize];
                    Color::DMG_SHADES[shade as usize]
                };
                self.frame.set_pixel(x, self.ly as usize, color);
            }
        }
    }

    #[inline]
    fn map_entry(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    #[inline]
    fn background_color(&self, index: u8) -> Color {
        if self.color_mode {
            self.bg_color_palettes.color(0, index)
        } else {
            Color::DMG_SHADES[self.bg_palette[index as usize] as usize]
        }
    }
}
