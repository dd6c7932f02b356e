use crate::error::FrameError;

/// The 4-bit frame opcode.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    Cont = 0x0,
    Text = 0x1,
    Bin = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl TryFrom<u8> for Opcode {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Cont),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Bin),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            _ => Err(FrameError::MalformedHeader("reserved opcode")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_opcodes_round_trip() {
        for op in [
            Opcode::Cont,
            Opcode::Text,
            Opcode::Bin,
            Opcode::Close,
            Opcode::Ping,
            Opcode::Pong,
        ] {
            assert_eq!(Opcode::try_from(op as u8), Ok(op));
        }
    }

    #[test]
    fn reserved_opcodes_rejected() {
        for raw in (0x3..=0x7).chain(0xB..=0xF) {
            assert!(matches!(
                Opcode::try_from(raw),
                Err(FrameError::MalformedHeader(_))
            ));
        }
    }
}
