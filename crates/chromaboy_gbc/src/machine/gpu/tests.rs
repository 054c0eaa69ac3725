use std::cell::Cell;
use std::rc::Rc;

use chromaboy_common::{Color, FrameBuffer, Screen};

use super::{Gpu, LcdMode, LINE_CYCLES};
use crate::machine::interrupts::InterruptLatch;
use crate::machine::{InterruptFlags, InterruptHandle, Peripheral};
use crate::{Access, EmulatorError};

struct CountingScreen(Rc<Cell<usize>>);

impl Screen for CountingScreen {
    fn draw_frame(&mut self, _frame: &FrameBuffer) {
        self.0.set(self.0.get() + 1);
    }
}

fn linked_gpu() -> (Gpu, Rc<InterruptLatch>) {
    let latch = Rc::new(InterruptLatch::default());
    let mut gpu = Gpu::new();
    gpu.link_interrupt_router(InterruptHandle::new(&latch));
    (gpu, latch)
}

fn write(gpu: &mut Gpu, addr: u16, value: u8) {
    gpu.write(addr, value).unwrap();
}

#[test]
fn mode_follows_line_clock() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF40, 0x80);
    assert_eq!(gpu.mode(), LcdMode::OamScan);

    let steps = [
        (171, LcdMode::OamScan, 0),
        (1, LcdMode::PixelTransfer, 0),
        (31, LcdMode::PixelTransfer, 0),
        (1, LcdMode::HBlank, 0),
        (251, LcdMode::HBlank, 0),
        (1, LcdMode::OamScan, 1),
    ];
    for (cycles, mode, ly) in steps {
        gpu.step(cycles);
        assert_eq!(gpu.mode(), mode, "after +{cycles} cycles");
        assert_eq!(gpu.ly(), ly);
    }
    assert_eq!(gpu.line_clock(), 0);
}

#[test]
fn mode_changes_are_reported_once() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF40, 0x80);
    assert_eq!(gpu.take_mode_change(), Some(LcdMode::OamScan));
    assert_eq!(gpu.take_mode_change(), None);

    gpu.step(204);
    assert_eq!(gpu.take_mode_change(), Some(LcdMode::HBlank));
    gpu.step(4);
    assert_eq!(gpu.take_mode_change(), None);
}

#[test]
fn full_frame_delivers_once_and_wraps_ly() {
    let (mut gpu, latch) = linked_gpu();
    let frames = Rc::new(Cell::new(0));
    gpu.link_screen(Box::new(CountingScreen(frames.clone())));
    write(&mut gpu, 0xFF40, 0x80);

    for _ in 0..144 {
        gpu.step(LINE_CYCLES);
    }
    assert_eq!(gpu.ly(), 144);
    assert_eq!(gpu.mode(), LcdMode::VBlank);
    assert!(latch.flags().contains(InterruptFlags::VBLANK));
    assert_eq!(frames.get(), 0);

    for _ in 144..154 {
        gpu.step(LINE_CYCLES);
    }
    assert_eq!(frames.get(), 1);
    assert_eq!(gpu.frames_delivered(), 1);
    assert_eq!(gpu.ly(), 0);
    assert_eq!(gpu.mode(), LcdMode::OamScan);
}

#[test]
fn display_off_holds_the_engine() {
    let mut gpu = Gpu::new();
    gpu.step(10_000);
    assert_eq!(gpu.ly(), 0);
    assert_eq!(gpu.line_clock(), 0);
    assert_eq!(gpu.mode(), LcdMode::HBlank);
}

#[test]
fn vram_write_decodes_tile() {
    let mut gpu = Gpu::new();
    let base = 0x8000 + 5 * 16;
    let rows: [(u8, u8); 3] = [(0xFF, 0x00), (0x00, 0xFF), (0xF0, 0x0F)];
    for (row, (lo, hi)) in rows.iter().enumerate() {
        write(&mut gpu, base + row as u16 * 2, *lo);
        write(&mut gpu, base + row as u16 * 2 + 1, *hi);
    }

    let tile = gpu.tile(5);
    assert_eq!(tile.pixels[0], [1; 8]);
    assert_eq!(tile.pixels[1], [2; 8]);
    assert_eq!(tile.pixels[2], [1, 1, 1, 1, 2, 2, 2, 2]);
    assert_eq!(tile.pixels[3], [0; 8]);
    assert_eq!(gpu.read(base + 4).unwrap(), 0xF0);
}

#[test]
fn lcdc_write_updates_cached_flags() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF40, 0xFF);
    assert!(gpu.display_on);
    assert_eq!(gpu.window_tilemap, 0x9C00);
    assert!(gpu.window_on);
    assert!(gpu.unsigned_tile_data);
    assert_eq!(gpu.bg_tilemap, 0x9C00);
    assert_eq!(gpu.sprite_height, 16);
    assert!(gpu.sprites_on);
    assert!(gpu.background_on);

    write(&mut gpu, 0xFF40, 0x80);
    assert_eq!(gpu.window_tilemap, 0x9800);
    assert_eq!(gpu.bg_tilemap, 0x9800);
    assert_eq!(gpu.sprite_height, 8);
    assert!(!gpu.unsigned_tile_data);
    assert_eq!(gpu.read(0xFF40).unwrap(), 0x80);
}

#[test]
fn signed_tile_bank_maps_low_entries_high() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF40, 0x80);
    assert_eq!(gpu.tile_index(0x00), 256);
    assert_eq!(gpu.tile_index(0x7F), 383);
    assert_eq!(gpu.tile_index(0x80), 128);

    write(&mut gpu, 0xFF40, 0x90);
    assert_eq!(gpu.tile_index(0x00), 0);
}

#[test]
fn bgp_write_decodes_shades() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF47, 0xE4);
    assert_eq!(gpu.bg_palette, [0, 1, 2, 3]);
    write(&mut gpu, 0xFF47, 0x1B);
    assert_eq!(gpu.bg_palette, [3, 2, 1, 0]);
    assert_eq!(gpu.read(0xFF47).unwrap(), 0x1B);
}

#[test]
fn coincidence_raises_lcd_stat_on_rising_edge() {
    let (mut gpu, latch) = linked_gpu();
    write(&mut gpu, 0xFF45, 2);
    write(&mut gpu, 0xFF41, 0x40);
    write(&mut gpu, 0xFF40, 0x80);

    gpu.step(LINE_CYCLES);
    assert!(!gpu.coincidence());
    gpu.step(LINE_CYCLES);
    assert!(gpu.coincidence());
    assert!(latch.flags().contains(InterruptFlags::LCD_STAT));
    // 0x80 | enable bit | coincidence | OAM scan
    assert_eq!(gpu.read(0xFF41).unwrap(), 0x80 | 0x40 | 0x04 | 0x02);

    latch.set_flags(InterruptFlags::empty());
    gpu.step(4);
    assert!(!latch.flags().contains(InterruptFlags::LCD_STAT));
}

#[test]
fn ly_write_restarts_line_counter() {
    let mut gpu = Gpu::new();
    write(&mut gpu, 0xFF40, 0x80);
    for _ in 0..3 {
        gpu.step(LINE_CYCLES);
    }
    assert_eq!(gpu.read(0xFF44).unwrap(), 3);
    write(&mut gpu, 0xFF44, 0x99);
    assert_eq!(gpu.ly(), 0);
}

#[test]
fn background_line_uses_map_and_palette() {
    let mut gpu = Gpu::new();
    // Tile 1 is solid color 3.
    for offset in 0..16 {
        write(&mut gpu, 0x8010 + offset, 0xFF);
    }
    write(&mut gpu, 0x9800, 0x01);
    write(&mut gpu, 0xFF47, 0xE4);
    write(&mut gpu, 0xFF40, 0x91);

    gpu.step(LINE_CYCLES);
    let frame = gpu.frame();
    assert_eq!(frame.pixel(0, 0), Color::DMG_SHADES[3]);
    assert_eq!(frame.pixel(7, 0), Color::DMG_SHADES[3]);
    assert_eq!(frame.pixel(8, 0), Color::DMG_SHADES[0]);

    // Scrolling by 4 pulls the edge of tile 1 in from the left.
    write(&mut gpu, 0xFF43, 4);
    gpu.step(LINE_CYCLES);
    let frame = gpu.frame();
    assert_eq!(frame.pixel(3, 1), Color::DMG_SHADES[3]);
    assert_eq!(frame.pixel(4, 1), Color::DMG_SHADES[0]);
}

#[test]
fn sprite_draws_over_background_and_skips_color_zero() {
    let mut gpu = Gpu::new();
    // Tile 2: left half color 1, right half transparent.
    for row in 0..8 {
        write(&mut gpu, 0x8020 + row * 2, 0xF0);
    }
    write(&mut gpu, 0xFE00, 16);
    write(&mut gpu, 0xFE01, 8);
    write(&mut gpu, 0xFE02, 2);
    write(&mut gpu, 0xFE03, 0x00);
    write(&mut gpu, 0xFF47, 0xE4);
    write(&mut gpu, 0xFF48, 0xE4);
    write(&mut gpu, 0xFF40, 0x93);

    assert_eq!(gpu.sprite(0).tile, 2);
    gpu.step(LINE_CYCLES);
    let frame = gpu.frame();
    assert_eq!(frame.pixel(0, 0), Color::DMG_SHADES[1]);
    assert_eq!(frame.pixel(3, 0), Color::DMG_SHADES[1]);
    assert_eq!(frame.pixel(4, 0), Color::DMG_SHADES[0]);

    // Flipped horizontally, the opaque half moves to the right.
    write(&mut gpu, 0xFE03, 0x20);
    assert!(gpu.sprite(0).flip_x);
    gpu.step(LINE_CYCLES);
    let frame = gpu.frame();
    assert_eq!(frame.pixel(0, 1), Color::DMG_SHADES[0]);
    assert_eq!(frame.pixel(4, 1), Color::DMG_SHADES[1]);
}

#[test]
fn color_palette_data_auto_increments() {
    let mut gpu = Gpu::new();
    assert_eq!(gpu.read(0xFF68).unwrap(), 0xFF);

    gpu.set_color_mode(true);
    write(&mut gpu, 0xFF68, 0x80);
    write(&mut gpu, 0xFF69, 0x1F);
    write(&mut gpu, 0xFF69, 0x00);
    assert_eq!(gpu.read(0xFF68).unwrap(), 0xC2);
    assert_eq!(gpu.bg_color_palettes.color(0, 0).rgb(), (0xFF, 0x00, 0x00));

    write(&mut gpu, 0xFF68, 0x01);
    assert_eq!(gpu.read(0xFF69).unwrap(), 0x00);
}

#[test]
fn unknown_register_is_reported() {
    let mut gpu = Gpu::new();
    assert_eq!(
        gpu.read(0xFF46),
        Err(EmulatorError::UnhandledRegister {
            peripheral: "GPU",
            address: 0xFF46,
            access: Access::Read,
        })
    );
    assert!(matches!(
        gpu.write(0xFF4C, 0),
        Err(EmulatorError::UnhandledRegister {
            access: Access::Write,
            ..
        })
    ));
}
