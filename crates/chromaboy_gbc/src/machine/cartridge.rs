use crate::EmulatorError;

const TITLE_START: usize = 0x0134;
const COLOR_FLAG: usize = 0x0143;
const KIND: usize = 0x0147;
const HEADER_END: usize = 0x0150;

/// Controller kinds that need no bank switching.
const ROM_ONLY: u8 = 0x00;
const ROM_RAM: u8 = 0x08;
const ROM_RAM_BATTERY: u8 = 0x09;

/// The fields of the cartridge header (0x0100-0x014F) the machine acts on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CartridgeHeader {
    pub title: String,
    /// Declares Color support (0x80 compatible, 0xC0 Color only).
    pub color: bool,
    pub kind: u8,
}

impl CartridgeHeader {
    pub fn parse(rom: &[u8]) -> Result<Self, EmulatorError> {
        if rom.len() < HEADER_END {
            return Err(EmulatorError::MissingHeader { len: rom.len() });
        }

        let kind = rom[KIND];
        if !matches!(kind, ROM_ONLY | ROM_RAM | ROM_RAM_BATTERY) {
            return Err(EmulatorError::UnsupportedCartridge { kind });
        }

        let color = matches!(rom[COLOR_FLAG], 0x80 | 0xC0);
        // On Color cartridges the last title byte is the flag itself.
        let title_end = if color { COLOR_FLAG } else { COLOR_FLAG + 1 };
        let title = rom[TITLE_START..title_end]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>()
            .trim()
            .to_string();

        Ok(Self { title, color, kind })
    }
}
