use bytes::{BufMut, BytesMut};

use crate::error::FrameError;

const FIN: u8 = 0b1000_0000;
const RSV1: u8 = 0b0100_0000;
const RSV2: u8 = 0b0010_0000;
const RSV3: u8 = 0b0001_0000;
const OPCODE: u8 = 0b0000_1111;
const MASK: u8 = 0b1000_0000;
const LEN: u8 = 0b0111_1111;

const LEN_16: u8 = 126;
const LEN_64: u8 = 127;

/// The two fixed bytes that start every frame.
///
/// ```text
///  byte 0                          byte 1
///  7   | 6    5    4    | 3 2 1 0  7    | 6 5 4 3 2 1 0
///  FIN | RSV1 RSV2 RSV3 | Opcode   Mask | Payload len
/// ```
///
/// The opcode is kept raw here; [`Opcode`](super::Opcode) validation
/// happens in the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode: u8,
    pub mask: bool,
    pub len: u8,
}

impl FrameHeader {
    pub fn parse(bytes: [u8; 2]) -> Self {
        let [b0, b1] = bytes;
        Self {
            fin: b0 & FIN != 0,
            rsv1: b0 & RSV1 != 0,
            rsv2: b0 & RSV2 != 0,
            rsv3: b0 & RSV3 != 0,
            opcode: b0 & OPCODE,
            mask: b1 & MASK != 0,
            len: b1 & LEN,
        }
    }

    pub fn to_bytes(self) -> [u8; 2] {
        let mut b0 = self.opcode & OPCODE;
        if self.fin {
            b0 |= FIN;
        }
        if self.rsv1 {
            b0 |= RSV1;
        }
        if self.rsv2 {
            b0 |= RSV2;
        }
        if self.rsv3 {
            b0 |= RSV3;
        }

        let mut b1 = self.len & LEN;
        if self.mask {
            b1 |= MASK;
        }
        [b0, b1]
    }

    pub fn has_reserved_bits(self) -> bool { self.rsv1 || self.rsv2 || self.rsv3 }
}

/// The optional big-endian length field that follows the fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedLength {
    None,
    Sixteen(u16),
    SixtyFour(u64),
}

impl ExtendedLength {
    /// Picks the 7-bit length indicator and extension for a payload of `len` bytes.
    #[allow(clippy::cast_possible_truncation)]
    pub fn for_payload(len: usize) -> (u8, Self) {
        match len {
            0..=125 => (len as u8, Self::None),
            126..=65535 => (LEN_16, Self::Sixteen(len as u16)),
            _ => (LEN_64, Self::SixtyFour(len as u64)),
        }
    }

    /// Reads the extension selected by `indicator` from `buf`, which starts
    /// right after the fixed header.
    pub fn parse(indicator: u8, buf: &[u8]) -> Result<Self, FrameError> {
        let truncated = |size: u64| FrameError::TruncatedFrame {
            needed: 2 + size,
            available: 2 + buf.len(),
        };
        match indicator {
            LEN_16 => {
                let bytes = buf.first_chunk::<2>().ok_or_else(|| truncated(2))?;
                Ok(Self::Sixteen(u16::from_be_bytes(*bytes)))
            }
            LEN_64 => {
                let bytes = buf.first_chunk::<8>().ok_or_else(|| truncated(8))?;
                Ok(Self::SixtyFour(u64::from_be_bytes(*bytes)))
            }
            _ => Ok(Self::None),
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::None => 0,
            Self::Sixteen(_) => 2,
            Self::SixtyFour(_) => 8,
        }
    }

    /// Payload length, using `indicator` when there is no extension.
    pub fn payload_len(self, indicator: u8) -> u64 {
        match self {
            Self::None => u64::from(indicator),
            Self::Sixteen(len) => u64::from(len),
            Self::SixtyFour(len) => len,
        }
    }

    pub(crate) fn put(self, buf: &mut BytesMut) {
        match self {
            Self::None => {}
            Self::Sixteen(len) => buf.put_u16(len),
            Self::SixtyFour(len) => buf.put_u64(len),
        }
    }
}

/// Four-byte key used to mask client payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskKey(pub [u8; 4]);

impl MaskKey {
    pub fn random() -> Self {
        let mut key = [0; 4];
        rand::fill(&mut key);
        Self(key)
    }

    /// Masks or unmasks `payload` in place.
    pub fn apply(self, payload: &mut [u8]) { crate::protocol::mask(payload, self.0); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_masked_text_header() {
        let h = FrameHeader::parse([0x81, 0x85]);
        assert!(h.fin);
        assert!(!h.has_reserved_bits());
        assert_eq!(h.opcode, 0x1);
        assert!(h.mask);
        assert_eq!(h.len, 5);
    }

    #[test]
    fn reserved_bits_are_individually_visible() {
        let h = FrameHeader::parse([0b0101_0010, 0x00]);
        assert!(!h.fin);
        assert!(h.rsv1);
        assert!(!h.rsv2);
        assert!(h.rsv3);
        assert_eq!(h.opcode, 0x2);
        assert!(h.has_reserved_bits());
    }

    #[test]
    fn header_bytes_round_trip() {
        for bytes in [[0x81, 0x7e], [0x82, 0xff], [0x00, 0x00], [0xf9, 0x7d]] {
            assert_eq!(FrameHeader::parse(bytes).to_bytes(), bytes);
        }
    }

    #[test]
    fn indicator_selection() {
        assert_eq!(ExtendedLength::for_payload(0), (0, ExtendedLength::None));
        assert_eq!(ExtendedLength::for_payload(125), (125, ExtendedLength::None));
        assert_eq!(
            ExtendedLength::for_payload(126),
            (126, ExtendedLength::Sixteen(126))
        );
        assert_eq!(
            ExtendedLength::for_payload(65535),
            (126, ExtendedLength::Sixteen(65535))
        );
        assert_eq!(
            ExtendedLength::for_payload(65536),
            (127, ExtendedLength::SixtyFour(65536))
        );
    }

    #[test]
    fn parse_extension_checks_bounds() {
        assert_eq!(
            ExtendedLength::parse(126, &[0x03]),
            Err(FrameError::TruncatedFrame {
                needed: 4,
                available: 3
            })
        );
        assert_eq!(
            ExtendedLength::parse(127, &[0; 7]),
            Err(FrameError::TruncatedFrame {
                needed: 10,
                available: 9
            })
        );
        assert_eq!(
            ExtendedLength::parse(126, &[0x03, 0xe8]),
            Ok(ExtendedLength::Sixteen(1000))
        );
        assert_eq!(ExtendedLength::parse(42, &[]), Ok(ExtendedLength::None));
    }

    #[test]
    fn put_writes_big_endian() {
        let mut buf = BytesMut::new();
        ExtendedLength::Sixteen(0x0102).put(&mut buf);
        ExtendedLength::SixtyFour(0x0304).put(&mut buf);
        ExtendedLength::None.put(&mut buf);
        assert_eq!(&buf[..], &[1, 2, 0, 0, 0, 0, 0, 0, 3, 4]);
    }
}
