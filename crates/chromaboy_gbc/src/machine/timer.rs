//! Divider and programmable timer (FF04-FF07).
//!
//! Two [`Counter`]s share one decrement algorithm: the divider runs at a
//! fixed rate with nobody listening for its overflow, the main counter
//! (TIMA) runs only while TAC bit 2 is set and raises the timer interrupt
//! when it wraps, reloading from TMA.
mod counter;
mod io;

pub use counter::{Counter, FREQUENCY_CYCLES};

use super::{InterruptHandle, InterruptKind};

/// Selector the divider always runs at.
const DIVIDER_FREQUENCY: u8 = 3;
/// Selector the main counter starts at.
const DEFAULT_FREQUENCY: u8 = 0;

pub struct Timer {
    divider: Counter,
    main: Counter,
    /// TAC (FF07), lower 3 bits meaningful.
    tac: u8,
    /// TMA (FF06).
    tma: u8,
    interrupts: InterruptHandle,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub const NAME: &'static str = "TIMER";

    pub fn new() -> Self {
        Self {
            divider: Counter::new(DIVIDER_FREQUENCY),
            main: Counter::new(DEFAULT_FREQUENCY),
            tac: 0,
            tma: 0,
            interrupts: InterruptHandle::default(),
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.tac & 0x04 != 0
    }

    /// Advance both counters by `cycles` speed-scaled cycles.
    pub fn step(&mut self, cycles: u32) {
        let cycles = cycles as i32;
        if self.enabled() && self.main.step(cycles) {
            self.interrupts.request(InterruptKind::Timer);
            self.main.value = self.tma;
            log::trace!("GBC timer: overflow, reloaded 0x{:02X}", self.tma);
        }
        self.divider.step(cycles);
    }

    pub fn divider(&self) -> &Counter {
        &self.divider
    }

    pub fn counter(&self) -> &Counter {
        &self.main
    }
}
