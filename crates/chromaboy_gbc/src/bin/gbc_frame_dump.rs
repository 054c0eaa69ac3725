use std::path::PathBuf;

use anyhow::{Context, Result};
use chromaboy_gbc::{
    EmulatorConfig, GameBoyColor, InstructionUnit, NopCore, SCREEN_HEIGHT, SCREEN_WIDTH,
};

const USAGE: &str = "Usage: gbc_frame_dump <rom_path> <out_rgb24_path> [frames] [--color]";

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let rom_path: PathBuf = args.next().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{USAGE}");
        std::process::exit(2);
    });
    let out_path: PathBuf = args.next().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{USAGE}");
        std::process::exit(2);
    });

    let mut frames = 120u64;
    let mut color_mode = false;
    for arg in args {
        match arg.as_str() {
            "--color" => color_mode = true,
            other => {
                frames = other
                    .parse()
                    .with_context(|| format!("invalid frame count '{other}'"))?
            }
        }
    }

    let rom = std::fs::read(&rom_path)
        .with_context(|| format!("failed to read ROM '{}'", rom_path.display()))?;

    let config = EmulatorConfig::builder()
        .color_mode(color_mode)
        .max_frames(frames)
        .build();
    let mut gbc = GameBoyColor::new(config, NopCore::new());
    gbc.load_cartridge(&rom)
        .with_context(|| format!("failed to load '{}'", rom_path.display()))?;

    for frame in 0..frames {
        gbc.step_frame().with_context(|| {
            format!("frame {frame} failed at pc=0x{:04X}", gbc.cpu().pc())
        })?;
    }

    let buffer = gbc.gpu().frame().to_rgb24();
    std::fs::write(&out_path, &buffer)
        .with_context(|| format!("failed to write '{}'", out_path.display()))?;

    println!(
        "Wrote {} bytes ({}x{} rgb24) after {} frames to '{}'",
        buffer.len(),
        SCREEN_WIDTH,
        SCREEN_HEIGHT,
        frames,
        out_path.display()
    );
    Ok(())
}
