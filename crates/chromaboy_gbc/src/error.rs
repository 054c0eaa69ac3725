use std::fmt;

use crate::machine::RegionKind;

/// Direction of a register access, used when reporting dispatch gaps.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read"),
            Access::Write => f.write_str("write"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EmulatorError {
    /// The image is larger than the whole target region.
    RomTooLarge {
        region: RegionKind,
        len: usize,
        capacity: usize,
    },
    /// The image fits the region but not at the requested offset.
    RomOverflowsRegion {
        region: RegionKind,
        offset: usize,
        len: usize,
        capacity: usize,
    },
    /// A peripheral was routed an address its register dispatch does not
    /// cover. This is a gap in the emulation model, not a hardware condition.
    UnhandledRegister {
        peripheral: &'static str,
        address: u16,
        access: Access,
    },
    /// The cartridge header names a memory bank controller we do not model.
    UnsupportedCartridge { kind: u8 },
    /// The image is too short to contain a cartridge header.
    MissingHeader { len: usize },
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RomTooLarge {
                region,
                len,
                capacity,
            } => write!(
                f,
                "{len} byte image is bigger than the {region} region ({capacity} bytes)"
            ),
            Self::RomOverflowsRegion {
                region,
                offset,
                len,
                capacity,
            } => write!(
                f,
                "{len} byte image at offset 0x{offset:04X} overruns the {region} region ({capacity} bytes)"
            ),
            Self::UnhandledRegister {
                peripheral,
                address,
                access,
            } => write!(
                f,
                "{peripheral} has no {access} handler for register 0x{address:04X}"
            ),
            Self::UnsupportedCartridge { kind } => {
                write!(f, "cartridge type 0x{kind:02X} needs a bank controller that is not supported")
            }
            Self::MissingHeader { len } => {
                write!(f, "{len} byte image is too short to hold a cartridge header")
            }
        }
    }
}

impl std::error::Error for EmulatorError {}
