//! The two DMA engines.
//!
//! Both copy through the [`Bus`](super::Bus) so that source and destination
//! accesses take the same routing as processor accesses. The Stepper owns
//! the timing: the block engine runs in place of the instruction unit, the
//! instant engine is fed speed-scaled cycles.

mod hdma;
mod oam;

pub use hdma::Hdma;
pub use oam::OamDma;
