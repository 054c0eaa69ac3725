use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use chromaboy_common::Screen;

use super::{Apu, Bus, CartridgeHeader, Gpu, Hdma, OamDma, RegionKind, Timer};
use crate::{EmulatorConfig, EmulatorError, InstructionUnit, CYCLES_PER_FRAME};

/// Where execution starts once the boot image is done (or skipped).
const ENTRY_POINT: u16 = 0x0100;

/// I/O state the boot image leaves behind, written through the bus when it
/// is skipped.
const POST_BOOT_IO: &[(u16, u8)] = &[
    (0xFF05, 0x00),
    (0xFF06, 0x00),
    (0xFF07, 0x00),
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
    (0xFF40, 0x91),
    (0xFF42, 0x00),
    (0xFF43, 0x00),
    (0xFF45, 0x00),
    (0xFF47, 0xFC),
    (0xFF48, 0xFF),
    (0xFF49, 0xFF),
    (0xFF4A, 0x00),
    (0xFF4B, 0x00),
    (0xFF50, 0x00),
    (0xFFFF, 0x00),
];

/// The Stepper: one instruction unit, the bus, and the cycle-driven
/// peripherals it feeds in a fixed order each tick.
///
/// The bus owns every peripheral through its registry; the typed handles
/// kept here are clones used to drive timing.
pub struct GameBoyColor<C: InstructionUnit> {
    config: EmulatorConfig,
    cpu: C,
    bus: Bus,
    gpu: Rc<RefCell<Gpu>>,
    hdma: Rc<RefCell<Hdma>>,
    oam_dma: Rc<RefCell<OamDma>>,
    timer: Rc<RefCell<Timer>>,
    cartridge: Option<CartridgeHeader>,
    in_boot_mode: bool,
    /// Cycles carried into the current frame.
    frame_cycles: u32,
    ticks: u64,
    frames: u64,
}

impl<C: InstructionUnit> GameBoyColor<C> {
    pub fn new(config: EmulatorConfig, cpu: C) -> Self {
        let mut bus = Bus::new();
        let gpu = Rc::new(RefCell::new(Gpu::new()));
        let hdma = Rc::new(RefCell::new(Hdma::new()));
        let oam_dma = Rc::new(RefCell::new(OamDma::new()));
        let timer = Rc::new(RefCell::new(Timer::new()));
        let apu = Rc::new(RefCell::new(Apu::new()));

        bus.register_peripheral(apu, 0xFF10, 0xFF3F);
        bus.register_peripheral(gpu.clone(), 0x8000, 0x9FFF);
        bus.register_peripheral(gpu.clone(), 0xFE00, 0xFE9F);
        bus.register_peripheral(gpu.clone(), 0xFF68, 0xFF6B);
        bus.register_peripheral_on(
            gpu.clone(),
            &[
                0xFF40, 0xFF41, 0xFF42, 0xFF43, 0xFF44, 0xFF45, 0xFF47, 0xFF48, 0xFF49, 0xFF4A,
                0xFF4B,
            ],
        );
        bus.register_peripheral_on(oam_dma.clone(), &[0xFF46]);
        bus.register_peripheral(hdma.clone(), 0xFF51, 0xFF55);
        bus.register_peripheral(timer.clone(), 0xFF04, 0xFF07);

        let mut gbc = Self {
            config,
            cpu,
            bus,
            gpu,
            hdma,
            oam_dma,
            timer,
            cartridge: None,
            in_boot_mode: true,
            frame_cycles: 0,
            ticks: 0,
            frames: 0,
        };
        gbc.setup_boot();
        gbc
    }

    /// Load the boot image that runs before the cartridge when
    /// `skip_boot` is off.
    pub fn load_boot(&mut self, image: &[u8]) -> Result<(), EmulatorError> {
        self.bus.load_region(RegionKind::Boot, 0, image)?;
        log::info!("GBC: loaded {} byte boot image", image.len());
        Ok(())
    }

    /// Check the cartridge header and copy the image into cartridge ROM.
    pub fn load_cartridge(&mut self, rom: &[u8]) -> Result<&CartridgeHeader, EmulatorError> {
        let header = CartridgeHeader::parse(rom)?;
        self.bus.load_region(RegionKind::Rom, 0, rom)?;
        log::info!(
            "GBC: loaded \"{}\" (type 0x{:02X}, color={})",
            header.title,
            header.kind,
            header.color
        );
        let header = self.cartridge.insert(header);
        if !self.in_boot_mode {
            // Color rendering depends on the cartridge flag.
            self.gpu
                .borrow_mut()
                .set_color_mode(self.config.color_mode && header.color);
        }
        Ok(header)
    }

    pub fn link_screen(&mut self, screen: Box<dyn Screen>) {
        self.gpu.borrow_mut().link_screen(screen);
    }

    /// Advance one instruction, or one DMA block while the block engine
    /// holds the bus, and feed the elapsed cycles to the peripherals.
    pub fn step(&mut self) -> Result<u32, EmulatorError> {
        let speed = self.cpu.speed().max(1);
        let hdma_active = self.hdma.borrow().is_running();
        let cycles = if hdma_active {
            self.hdma.borrow_mut().step(&mut self.bus) * speed
        } else {
            if self.config.dump_state {
                log::trace!(
                    "GBC: pc=0x{:04X} halted={}",
                    self.cpu.pc(),
                    self.cpu.halted()
                );
            }
            self.cpu.step(&mut self.bus)
        };

        // Graphics see raw cycles and go first.
        {
            let mut gpu = self.gpu.borrow_mut();
            gpu.step(cycles);
            let mut hdma = self.hdma.borrow_mut();
            if let Some(mode) = gpu.take_mode_change() {
                hdma.on_mode_change(mode);
            }
            hdma.on_display_change(gpu.display_on());
        }

        let scaled = cycles / speed;
        self.oam_dma.borrow_mut().step(scaled, &mut self.bus);
        self.timer.borrow_mut().step(scaled);
        self.ticks += 1;

        if let Some(err) = self.bus.take_fault() {
            log::error!(
                "GBC: stopping at tick {} (pc=0x{:04X}): {}",
                self.ticks,
                self.cpu.pc(),
                err
            );
            return Err(err);
        }
        self.check_boot_mode_exit();
        Ok(cycles)
    }

    /// Step until a frame's worth of cycles has elapsed. Overshoot carries
    /// into the next frame.
    pub fn step_frame(&mut self) -> Result<(), EmulatorError> {
        while self.frame_cycles < CYCLES_PER_FRAME {
            let cycles = self.step()?;
            if cycles == 0 {
                log::warn!("GBC: instruction unit made no progress at pc=0x{:04X}", self.cpu.pc());
                break;
            }
            self.frame_cycles += cycles;
        }
        self.frame_cycles = self.frame_cycles.saturating_sub(CYCLES_PER_FRAME);
        self.frames += 1;
        Ok(())
    }

    /// Run frames until `stop` is raised or `max_frames` is reached, and
    /// return the number of frames run by this call.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<u64, EmulatorError> {
        let start = self.frames;
        loop {
            if stop.load(Ordering::Relaxed) {
                log::info!("GBC: stop requested after {} frame(s)", self.frames);
                break;
            }
            if let Some(max) = self.config.max_frames {
                if self.frames >= max {
                    break;
                }
            }
            self.step_frame()?;
        }
        Ok(self.frames - start)
    }

    /// Power-cycle: processor, bus and peripherals back to their initial
    /// state. Loaded images are kept.
    pub fn reset(&mut self) {
        log::info!("GBC: resetting system");
        self.cpu.reset();
        self.bus.reset();
        self.frame_cycles = 0;
        self.ticks = 0;
        self.frames = 0;
        self.setup_boot();
    }

    fn setup_boot(&mut self) {
        if self.config.skip_boot {
            log::info!("GBC: boot image skipped");
            self.in_boot_mode = false;
            self.bus.set_in_boot_mode(false);
            self.cpu.set_pc(ENTRY_POINT);
            self.apply_hardware_mode();
            for &(addr, value) in POST_BOOT_IO {
                self.bus.write(addr, value);
            }
        } else {
            log::info!("GBC: running boot image");
            self.in_boot_mode = true;
            self.bus.set_in_boot_mode(true);
            self.cpu.set_pc(0x0000);
        }
    }

    fn check_boot_mode_exit(&mut self) {
        if self.in_boot_mode && !self.bus.in_boot_mode() {
            self.in_boot_mode = false;
            self.cpu.set_pc(ENTRY_POINT);
            self.apply_hardware_mode();
            log::info!("GBC: boot image finished, jumping to 0x{:04X}", ENTRY_POINT);
        }
    }

    fn apply_hardware_mode(&mut self) {
        let color = self.config.color_mode;
        let cartridge_color = self.cartridge.as_ref().is_some_and(|c| c.color);
        self.bus.set_color_mode(color);
        self.gpu.borrow_mut().set_color_mode(color && cartridge_color);
        self.cpu.load_post_boot_registers(color);
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn gpu(&self) -> Ref<'_, Gpu> {
        self.gpu.borrow()
    }

    pub fn cartridge(&self) -> Option<&CartridgeHeader> {
        self.cartridge.as_ref()
    }

    pub fn in_boot_mode(&self) -> bool {
        self.in_boot_mode
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
