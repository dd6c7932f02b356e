mod decode;
mod encode;
mod header;
mod opcode;

pub use decode::{Frame, decode, decode_prefix};
pub use encode::{FrameEncoder, encode};
pub use header::{ExtendedLength, FrameHeader, MaskKey};
pub use opcode::Opcode;
