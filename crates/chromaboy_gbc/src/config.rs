use typed_builder::TypedBuilder;

/// Options fixed for the lifetime of a [`GameBoyColor`](crate::GameBoyColor).
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct EmulatorConfig {
    /// Run Color hardware: palette RAM, WRAM banking, KEY1.
    #[builder(default = false)]
    pub color_mode: bool,
    /// Start at 0x0100 with the post-boot register state instead of running
    /// a boot image.
    #[builder(default = true)]
    pub skip_boot: bool,
    /// Stop `run` after this many frames.
    #[builder(default, setter(strip_option))]
    pub max_frames: Option<u64>,
    /// Trace PC and halt state before every instruction.
    #[builder(default = false)]
    pub dump_state: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
