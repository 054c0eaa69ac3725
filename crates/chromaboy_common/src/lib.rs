pub mod frame;

pub use frame::{
    frame_channel, FrameBuffer, FrameReceiver, FrameSender, NullScreen, Screen, TryRecvError,
};

/// Visible screen width in pixels.
pub const SCREEN_WIDTH: usize = 160;
/// Visible screen height in pixels.
pub const SCREEN_HEIGHT: usize = 144;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new_rgb(0, 0, 0);
    pub const WHITE: Color = Color::new_rgb(255, 255, 255);

    /// The four DMG shades, indexed by the 2-bit value a palette register
    /// assigns to a pixel (0 = lightest).
    pub const DMG_SHADES: [Color; 4] = [
        Color::new_rgb(0xFF, 0xFF, 0xFF),
        Color::new_rgb(0xAA, 0xAA, 0xAA),
        Color::new_rgb(0x55, 0x55, 0x55),
        Color::new_rgb(0x00, 0x00, 0x00),
    ];

    #[inline]
    pub const fn new_rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 0xff }
    }

    /// Expand a 15-bit BGR555 value as stored in Color-mode palette RAM.
    #[inline]
    pub const fn from_bgr555(value: u16) -> Color {
        let r = (value & 0x1F) as u8;
        let g = ((value >> 5) & 0x1F) as u8;
        let b = ((value >> 10) & 0x1F) as u8;
        Color::new_rgb(r << 3 | r >> 2, g << 3 | g >> 2, b << 3 | b >> 2)
    }

    #[inline]
    pub const fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn bgr555_expands_full_scale_channels() {
        assert_eq!(Color::from_bgr555(0x7FFF), Color::WHITE);
        assert_eq!(Color::from_bgr555(0x0000), Color::BLACK);
        assert_eq!(Color::from_bgr555(0x001F).rgb(), (0xFF, 0x00, 0x00));
        assert_eq!(Color::from_bgr555(0x7C00).rgb(), (0x00, 0x00, 0xFF));
    }
}
