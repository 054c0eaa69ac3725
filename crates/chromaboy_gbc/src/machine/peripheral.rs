use std::cell::RefCell;
use std::rc::Rc;

use super::InterruptHandle;
use crate::EmulatorError;

/// A memory-mapped device the bus routes register accesses to.
///
/// `read`/`write` only see addresses the peripheral was registered for.
/// Returning `EmulatorError::UnhandledRegister` means the device was routed
/// an address its dispatch does not cover; the bus treats that as fatal.
pub trait Peripheral {
    fn name(&self) -> &'static str;
    fn read(&self, addr: u16) -> Result<u8, EmulatorError>;
    fn write(&mut self, addr: u16, value: u8) -> Result<(), EmulatorError>;
    /// Devices that never raise interrupts can ignore the router.
    fn link_interrupt_router(&mut self, _router: InterruptHandle) {}
    fn reset(&mut self);
}

/// Shared ownership handle under which peripherals are registered.
pub type PeripheralHandle = Rc<RefCell<dyn Peripheral>>;
