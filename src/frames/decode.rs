use bytes::Bytes;

use super::{ExtendedLength, FrameHeader, MaskKey, Opcode};
use crate::error::FrameError;

type Result<T> = std::result::Result<T, FrameError>;

/// A single decoded frame with its payload unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: Opcode,
    pub fin: bool,
    pub payload: Bytes,
}

impl Frame {
    /// The payload as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> { String::from_utf8_lossy(&self.payload) }
}

/// Decodes the frame at the start of `buf`.
///
/// `buf` is expected to hold one complete frame; anything after it is
/// ignored. Every length field is checked against the bytes actually
/// present before it is used, so a lying header yields
/// [`FrameError::TruncatedFrame`] rather than an over-read.
pub fn decode(buf: &[u8]) -> Result<Frame> { decode_prefix(buf).map(|(frame, _)| frame) }

/// Like [`decode`], also returning how many bytes of `buf` the frame used.
pub fn decode_prefix(buf: &[u8]) -> Result<(Frame, usize)> {
    let Some(&head) = buf.first_chunk::<2>() else {
        return Err(FrameError::TruncatedFrame {
            needed: 2,
            available: buf.len(),
        });
    };
    let header = FrameHeader::parse(head);

    // 0   | 1 2 3 | 4 5 6 7
    // Fin | Rsv   | Opcode
    if header.has_reserved_bits() {
        tracing::warn!("invalid RSV bits");
        return Err(FrameError::MalformedHeader("reserved bits set"));
    }
    let opcode = Opcode::try_from(header.opcode).inspect_err(|_| {
        tracing::warn!(opcode = header.opcode, "invalid opcode");
    })?;

    // 0    | 1 2 3 4 5 6 7
    // Mask | Payload len
    let ext = ExtendedLength::parse(header.len, &buf[2..])?;
    let mut offset = 2 + ext.size();
    let payload_len = ext.payload_len(header.len);

    let mask_key = if header.mask {
        let key = buf[offset..]
            .first_chunk::<4>()
            .ok_or(FrameError::TruncatedFrame {
                needed: offset as u64 + 4,
                available: buf.len(),
            })?;
        offset += 4;
        Some(MaskKey(*key))
    } else {
        tracing::trace!("unmasked frame from client");
        None
    };

    let available = buf.len() - offset;
    let truncated = FrameError::TruncatedFrame {
        needed: (offset as u64).saturating_add(payload_len),
        available: buf.len(),
    };
    let len = usize::try_from(payload_len).map_err(|_| truncated.clone())?;
    if len > available {
        return Err(truncated);
    }

    let mut payload = buf[offset..offset + len].to_vec();
    if let Some(key) = mask_key {
        key.apply(&mut payload);
    }

    tracing::trace!(
        opcode = ?opcode,
        fin = header.fin,
        payload_len = len,
        masked = header.mask,
        "frame decoded"
    );

    let frame = Frame {
        opcode,
        fin: header.fin,
        payload: payload.into(),
    };
    Ok((frame, offset + len))
}
