pub mod config;
pub mod cpu;
mod error;
pub mod machine;

pub use chromaboy_common::{FrameBuffer, Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use config::EmulatorConfig;
pub use cpu::{InstructionUnit, NopCore};
pub use error::{Access, EmulatorError};
pub use machine::{
    Bus, CartridgeHeader, GameBoyColor, InterruptFlags, InterruptHandle, InterruptKind,
    InterruptRouter, Peripheral, PeripheralHandle, RegionKind,
};

/// Machine cycles in one full frame (154 lines of 456 cycles).
pub const CYCLES_PER_FRAME: u32 = 70_224;
