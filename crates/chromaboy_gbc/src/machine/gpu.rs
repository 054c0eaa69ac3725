//! Graphics timing engine.
//!
//! Advances a four-mode state machine purely from the elapsed cycle count it
//! is fed, rasterises one background/window/sprite line each time a visible
//! line completes, and hands the finished frame to the linked [`Screen`] when
//! the vertical blank wraps back to line 0.

use chromaboy_common::{FrameBuffer, NullScreen, Screen, SCREEN_HEIGHT, SCREEN_WIDTH};

use super::{InterruptHandle, InterruptKind};

mod mmio;
mod palette;
mod render;
mod tiles;

use palette::PaletteRam;
pub use tiles::{Sprite, Tile};

/// Cycle at which the visible-line OAM scan hands over to pixel transfer.
pub const PIXEL_TRANSFER_START: u32 = 172;
/// Cycle at which pixel transfer hands over to H-blank.
pub const HBLANK_START: u32 = 204;
/// Cycles per scan line.
pub const LINE_CYCLES: u32 = 456;
/// First line of the vertical blank.
pub const VBLANK_LINE: u8 = SCREEN_HEIGHT as u8;
/// Lines per frame including the vertical blank.
pub const LINES_PER_FRAME: u8 = 154;

pub(crate) const TILE_COUNT: usize = 384;
pub(crate) const SPRITE_COUNT: usize = 40;
pub(crate) const TILEMAP_0: u16 = 0x9800;
pub(crate) const TILEMAP_1: u16 = 0x9C00;

/// Mode reported in STAT bits 0-1.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LcdMode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    PixelTransfer = 3,
}

pub struct Gpu {
    vram: Box<[u8]>,
    oam: [u8; 0xA0],
    sprites: [Sprite; SPRITE_COUNT],
    raw_tiles: Box<[[u8; 16]; TILE_COUNT]>,
    tiles: Box<[Tile; TILE_COUNT]>,

    mode: LcdMode,
    /// Set whenever `mode` changes; consumed by `take_mode_change`.
    mode_changed: bool,
    clock: u32,
    ly: u8,
    /// Internal line counter of the window layer.
    window_line: u8,

    lcdc: u8,
    stat: u8,
    scroll_y: u8,
    scroll_x: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    window_y: u8,
    window_x: u8,
    coincidence: bool,

    // LCDC, decoded once per write.
    display_on: bool,
    window_tilemap: u16,
    window_on: bool,
    unsigned_tile_data: bool,
    bg_tilemap: u16,
    sprite_height: u8,
    sprites_on: bool,
    background_on: bool,

    bg_palette: [u8; 4],
    obj_palettes: [[u8; 4]; 2],
    color_mode: bool,
    bg_color_palettes: PaletteRam,
    obj_color_palettes: PaletteRam,

    /// Raw background color indices of the line being rasterised, used for
    /// sprite-behind-background priority.
    line_indices: [u8; SCREEN_WIDTH],
    frame: FrameBuffer,
    frames_delivered: u64,
    screen: Box<dyn Screen>,
    interrupts: InterruptHandle,
}

impl Default for Gpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpu {
    pub const NAME: &'static str = "GPU";

    pub fn new() -> Self {
        let mut gpu = Self {
            vram: vec![0; 0x2000].into_boxed_slice(),
            oam: [0; 0xA0],
            sprites: [Sprite::default(); SPRITE_COUNT],
            raw_tiles: Box::new([[0; 16]; TILE_COUNT]),
            tiles: Box::new([Tile::default(); TILE_COUNT]),
            mode: LcdMode::HBlank,
            mode_changed: false,
            clock: 0,
            ly: 0,
            window_line: 0,
            lcdc: 0,
            stat: 0,
            scroll_y: 0,
            scroll_x: 0,
            lyc: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            window_y: 0,
            window_x: 0,
            coincidence: false,
            display_on: false,
            window_tilemap: TILEMAP_0,
            window_on: false,
            unsigned_tile_data: false,
            bg_tilemap: TILEMAP_0,
            sprite_height: 8,
            sprites_on: false,
            background_on: false,
            bg_palette: [0, 1, 2, 3],
            obj_palettes: [[0, 1, 2, 3]; 2],
            color_mode: false,
            bg_color_palettes: PaletteRam::default(),
            obj_color_palettes: PaletteRam::default(),
            line_indices: [0; SCREEN_WIDTH],
            frame: FrameBuffer::default(),
            frames_delivered: 0,
            screen: Box::new(NullScreen),
            interrupts: InterruptHandle::default(),
        };
        gpu.write_lcdc(0x00);
        gpu
    }

    /// Attach the presentation sink that receives every completed frame.
    pub fn link_screen(&mut self, screen: Box<dyn Screen>) {
        self.screen = screen;
        log::info!("GBC GPU: linked screen");
    }

    pub fn set_color_mode(&mut self, on: bool) {
        self.color_mode = on;
    }

    /// Advance the mode state machine by `cycles`.
    pub fn step(&mut self, cycles: u32) {
        if !self.display_on {
            return;
        }
        self.clock += cycles;

        if self.ly < VBLANK_LINE {
            if self.clock >= HBLANK_START {
                self.set_mode(LcdMode::HBlank);
                if self.clock >= LINE_CYCLES {
                    self.render_line();
                    self.clock = 0;
                    self.ly += 1;
                    if self.ly == VBLANK_LINE {
                        self.set_mode(LcdMode::VBlank);
                        self.interrupts.request(InterruptKind::VBlank);
                        log::trace!("GBC GPU: entering V-blank");
                    } else {
                        self.set_mode(LcdMode::OamScan);
                    }
                }
            } else if self.clock >= PIXEL_TRANSFER_START {
                self.set_mode(LcdMode::PixelTransfer);
            } else {
                self.set_mode(LcdMode::OamScan);
            }
        } else {
            self.set_mode(LcdMode::VBlank);
            if self.clock >= LINE_CYCLES {
                self.clock = 0;
                self.ly += 1;
                if self.ly == LINES_PER_FRAME {
                    self.deliver_frame();
                    self.ly = 0;
                    self.window_line = 0;
                    self.set_mode(LcdMode::OamScan);
                }
            }
        }

        self.update_coincidence();
    }

    fn deliver_frame(&mut self) {
        self.screen.draw_frame(&self.frame);
        self.frames_delivered = self.frames_delivered.wrapping_add(1);
        log::debug!("GBC GPU: frame {} delivered", self.frames_delivered);
    }

    fn set_mode(&mut self, mode: LcdMode) {
        if self.mode != mode {
            self.mode = mode;
            self.mode_changed = true;
        }
    }

    /// Recompute the LY=LYC flag; a rising edge raises the LCD status
    /// interrupt.
    fn update_coincidence(&mut self) {
        let was = self.coincidence;
        self.coincidence = self.ly == self.lyc && (self.stat & 0x40) != 0;
        if self.coincidence && !was {
            self.interrupts.request(InterruptKind::LcdStat);
        }
    }

    pub fn mode(&self) -> LcdMode {
        self.mode
    }

    /// The mode the engine switched to since the previous call, if any.
    pub fn take_mode_change(&mut self) -> Option<LcdMode> {
        if std::mem::take(&mut self.mode_changed) {
            Some(self.mode)
        } else {
            None
        }
    }

    pub fn display_on(&self) -> bool {
        self.display_on
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn line_clock(&self) -> u32 {
        self.clock
    }

    pub fn coincidence(&self) -> bool {
        self.coincidence
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn tile(&self, id: usize) -> &Tile {
        &self.tiles[id]
    }

    pub fn sprite(&self, id: usize) -> &Sprite {
        &self.sprites[id]
    }
}

#[cfg(test)]
mod tests;
