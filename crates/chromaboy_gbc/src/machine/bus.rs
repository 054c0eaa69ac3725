use std::rc::Rc;

use super::interrupts::InterruptLatch;
use super::{InterruptFlags, InterruptHandle, InterruptKind, InterruptRouter, PeripheralHandle};
use crate::EmulatorError;

mod mmio;
mod regions;

pub use regions::RegionKind;

const ADDRESS_SPACE: usize = 0x1_0000;

pub(crate) const BOOT_SIZE: usize = 0x100;
pub(crate) const ROM_SIZE: usize = 0x8000;
pub(crate) const EXTERNAL_RAM_SIZE: usize = 0x2000;
pub(crate) const WRAM_BANK_SIZE: usize = 0x1000;
pub(crate) const WRAM_BANKS: usize = 8;
/// 0xFF80..=0xFFFF, the last byte being the interrupt enable register.
pub(crate) const ZERO_PAGE_SIZE: usize = 0x80;

/// Address-space router.
///
/// Owns the directly addressable memories and a flat table mapping every
/// 16-bit address to at most one registered peripheral. Peripheral lookup
/// takes precedence over raw memory; the boot status register (0xFF50) is
/// intercepted before either.
pub struct Bus {
    pub(crate) boot: [u8; BOOT_SIZE],
    pub(crate) rom: Box<[u8]>,
    pub(crate) external_ram: Box<[u8]>,
    pub(crate) internal_ram: Box<[[u8; WRAM_BANK_SIZE]; WRAM_BANKS]>,
    pub(crate) zero_page: [u8; ZERO_PAGE_SIZE],
    in_boot_mode: bool,
    boot_status: u8,
    color_mode: bool,
    /// SVBK (0xFF70), Color mode only.
    wram_bank: u8,
    /// KEY1 (0xFF4D), Color mode only.
    speed_prep: u8,
    interrupts: Rc<InterruptLatch>,
    peripherals: Vec<PeripheralHandle>,
    /// Index into `peripherals` for every address, `None` for raw memory.
    io_map: Box<[Option<usize>]>,
    /// One bit per address that has already produced an unmapped-access
    /// diagnostic.
    reported: Box<[u64]>,
    fault: Option<EmulatorError>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            boot: [0; BOOT_SIZE],
            rom: vec![0; ROM_SIZE].into_boxed_slice(),
            external_ram: vec![0; EXTERNAL_RAM_SIZE].into_boxed_slice(),
            internal_ram: Box::new([[0; WRAM_BANK_SIZE]; WRAM_BANKS]),
            zero_page: [0; ZERO_PAGE_SIZE],
            in_boot_mode: true,
            boot_status: 0x00,
            color_mode: false,
            wram_bank: 0,
            speed_prep: 0,
            interrupts: Rc::new(InterruptLatch::default()),
            peripherals: Vec::new(),
            io_map: vec![None; ADDRESS_SPACE].into_boxed_slice(),
            reported: vec![0; ADDRESS_SPACE / 64].into_boxed_slice(),
            fault: None,
        }
    }

    /// Claim every address in `start..=end` for `peripheral`.
    ///
    /// An address that already belongs to another peripheral is silently
    /// handed over: the last registration wins.
    pub fn register_peripheral(&mut self, peripheral: PeripheralHandle, start: u16, end: u16) {
        let index = self.peripheral_index(peripheral);
        log::info!(
            "GBC bus: connecting {} on 0x{:04X}..=0x{:04X}",
            self.peripherals[index].borrow().name(),
            start,
            end
        );
        for addr in start..=end {
            self.io_map[addr as usize] = Some(index);
        }
    }

    /// Claim a scattered set of register addresses for `peripheral`.
    pub fn register_peripheral_on(&mut self, peripheral: PeripheralHandle, addrs: &[u16]) {
        let index = self.peripheral_index(peripheral);
        log::info!(
            "GBC bus: connecting {} on {} register(s)",
            self.peripherals[index].borrow().name(),
            addrs.len()
        );
        for &addr in addrs {
            self.io_map[addr as usize] = Some(index);
        }
    }

    /// Find or insert `peripheral`, linking it to the interrupt router the
    /// first time it is seen.
    fn peripheral_index(&mut self, peripheral: PeripheralHandle) -> usize {
        if let Some(index) = self
            .peripherals
            .iter()
            .position(|known| Rc::ptr_eq(known, &peripheral))
        {
            return index;
        }
        peripheral
            .borrow_mut()
            .link_interrupt_router(self.interrupt_handle());
        self.peripherals.push(peripheral);
        self.peripherals.len() - 1
    }

    /// Every claimed address together with the name of its owner, in address
    /// order.
    pub fn peripheral_map(&self) -> Vec<(u16, &'static str)> {
        self.io_map
            .iter()
            .enumerate()
            .filter_map(|(addr, slot)| {
                slot.map(|index| (addr as u16, self.peripherals[index].borrow().name()))
            })
            .collect()
    }

    /// Non-owning router handle for peripherals.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(&self.interrupts)
    }

    pub fn interrupt_flags(&self) -> InterruptFlags {
        self.interrupts.flags()
    }

    pub fn in_boot_mode(&self) -> bool {
        self.in_boot_mode
    }

    pub fn set_in_boot_mode(&mut self, mode: bool) {
        self.in_boot_mode = mode;
    }

    pub fn color_mode(&self) -> bool {
        self.color_mode
    }

    pub fn set_color_mode(&mut self, on: bool) {
        self.color_mode = on;
    }

    /// Take the first fatal dispatch error raised since the last call.
    pub fn take_fault(&mut self) -> Option<EmulatorError> {
        self.fault.take()
    }

    pub(crate) fn latch_fault(&mut self, err: EmulatorError) {
        log::error!("GBC bus: {err}");
        if self.fault.is_none() {
            self.fault = Some(err);
        }
    }

    /// Return to the power-on state: boot mode, no pending interrupts, and
    /// every registered peripheral reset once. Loaded images are kept.
    pub fn reset(&mut self) {
        log::info!("GBC bus: resetting");
        self.in_boot_mode = true;
        self.boot_status = 0x00;
        self.wram_bank = 0;
        self.speed_prep = 0;
        self.interrupts.set_flags(InterruptFlags::empty());
        self.fault = None;
        for peripheral in &self.peripherals {
            match peripheral.try_borrow_mut() {
                Ok(mut p) => p.reset(),
                Err(_) => log::warn!("GBC bus: peripheral busy during reset"),
            }
        }
    }
}

impl InterruptRouter for Bus {
    fn request_interrupt(&self, kind: InterruptKind) {
        self.interrupts.request_interrupt(kind);
    }
}
