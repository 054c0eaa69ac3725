use std::cell::Cell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

bitflags! {
    /// Bits of the interrupt flag (0xFF0F) and interrupt enable (0xFFFF)
    /// registers.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 0x01;
        const LCD_STAT = 0x02;
        const TIMER = 0x04;
        const SERIAL = 0x08;
        const JOYPAD = 0x10;
    }
}

/// Named interrupt sources a peripheral can raise.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InterruptKind {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl InterruptKind {
    pub const fn flag(self) -> InterruptFlags {
        match self {
            InterruptKind::VBlank => InterruptFlags::VBLANK,
            InterruptKind::LcdStat => InterruptFlags::LCD_STAT,
            InterruptKind::Timer => InterruptFlags::TIMER,
            InterruptKind::Serial => InterruptFlags::SERIAL,
            InterruptKind::Joypad => InterruptFlags::JOYPAD,
        }
    }
}

/// Capability for signalling a pending interrupt.
pub trait InterruptRouter {
    fn request_interrupt(&self, kind: InterruptKind);
}

/// Pending-interrupt storage shared between the bus (which exposes it as
/// IF) and the peripherals' router handles.
#[derive(Default, Debug)]
pub(crate) struct InterruptLatch {
    pending: Cell<InterruptFlags>,
}

impl InterruptLatch {
    pub(crate) fn flags(&self) -> InterruptFlags {
        self.pending.get()
    }

    pub(crate) fn set_flags(&self, flags: InterruptFlags) {
        self.pending.set(flags);
    }
}

impl InterruptRouter for InterruptLatch {
    fn request_interrupt(&self, kind: InterruptKind) {
        self.pending.set(self.pending.get() | kind.flag());
    }
}

/// Non-owning router reference handed to peripherals.
///
/// A handle whose router has been dropped (or a default handle that was
/// never linked) silently ignores requests.
#[derive(Clone, Default)]
pub struct InterruptHandle {
    router: Option<Weak<dyn InterruptRouter>>,
}

impl InterruptHandle {
    pub fn new<R: InterruptRouter + 'static>(router: &Rc<R>) -> Self {
        let router: Rc<dyn InterruptRouter> = router.clone();
        Self {
            router: Some(Rc::downgrade(&router)),
        }
    }

    pub fn request(&self, kind: InterruptKind) {
        match self.router.as_ref().and_then(Weak::upgrade) {
            Some(router) => router.request_interrupt(kind),
            None => log::trace!("interrupt {kind:?} requested with no router linked"),
        }
    }
}
