//! The seam to the instruction execution unit.
//!
//! Decoding and executing opcodes lives outside this crate; the Stepper only
//! needs to advance it, read its cycle count and patch its program counter.
use crate::machine::Bus;

pub trait InstructionUnit {
    /// Execute one instruction (or service one interrupt) and return the
    /// cycles it consumed.
    fn step(&mut self, bus: &mut Bus) -> u32;
    fn pc(&self) -> u16;
    fn set_pc(&mut self, pc: u16);
    fn halted(&self) -> bool;
    /// Clock multiplier: 1 at normal speed, 2 in Color double-speed mode.
    fn speed(&self) -> u32 {
        1
    }
    fn reset(&mut self);
    /// Load the register file the boot image leaves behind. `color_mode`
    /// selects the Color hardware values (A=0x11).
    fn load_post_boot_registers(&mut self, _color_mode: bool) {}
}

/// Stand-in core for headless runs: fetches one byte per step and moves on.
#[derive(Clone, Debug, Default)]
pub struct NopCore {
    pc: u16,
}

impl NopCore {
    pub const CYCLES_PER_STEP: u32 = 4;

    pub fn new() -> Self {
        Self::default()
    }
}

impl InstructionUnit for NopCore {
    fn step(&mut self, bus: &mut Bus) -> u32 {
        bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        Self::CYCLES_PER_STEP
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn halted(&self) -> bool {
        false
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
