mod apu;
mod bus;
mod cartridge;
mod dma;
mod gameboy;
pub mod gpu;
pub(crate) mod interrupts;
mod peripheral;
pub mod timer;

pub use apu::Apu;
pub use bus::{Bus, RegionKind};
pub use cartridge::CartridgeHeader;
pub use dma::{Hdma, OamDma};
pub use gameboy::GameBoyColor;
pub use gpu::{Gpu, LcdMode};
pub use interrupts::{InterruptFlags, InterruptHandle, InterruptKind, InterruptRouter};
pub use peripheral::{Peripheral, PeripheralHandle};
pub use timer::Timer;
