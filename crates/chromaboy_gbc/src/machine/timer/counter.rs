/// Cycles per increment for each frequency selector (TAC bits 0-1).
pub const FREQUENCY_CYCLES: [i32; 4] = [256, 4, 16, 64];

/// An 8-bit up-counter clocked every `FREQUENCY_CYCLES[frequency]` cycles.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Counter {
    frequency: u8,
    /// Cycles left until the next increment.
    clock_counter: i32,
    pub value: u8,
}

impl Counter {
    pub fn new(frequency: u8) -> Self {
        let mut counter = Self {
            frequency: 0,
            clock_counter: 0,
            value: 0,
        };
        counter.set_frequency(frequency);
        counter
    }

    pub fn frequency(&self) -> u8 {
        self.frequency
    }

    pub fn cycles_per_tick(&self) -> i32 {
        FREQUENCY_CYCLES[self.frequency as usize]
    }

    /// Select a new rate; the phase restarts, the value is kept.
    pub fn set_frequency(&mut self, frequency: u8) {
        self.frequency = frequency & 0x03;
        self.clock_counter = self.cycles_per_tick();
    }

    /// Consume `cycles` and return true if the value wrapped to zero.
    ///
    /// Counting stops at the wrap so the owner can reload before the next
    /// increment; leftover cycles are kept in the phase.
    pub fn step(&mut self, cycles: i32) -> bool {
        self.clock_counter -= cycles;
        while self.clock_counter <= 0 {
            self.value = self.value.wrapping_add(1);
            self.clock_counter += self.cycles_per_tick();
            if self.value == 0x00 {
                return true;
            }
        }
        false
    }

    pub fn reset(&mut self, frequency: u8) {
        self.set_frequency(frequency);
        self.value = 0;
    }
}
