use std::marker::PhantomData;

use bytes::{BufMut, Bytes, BytesMut};

use super::{ExtendedLength, FrameHeader, MaskKey, Opcode};
use crate::role::{EncodePolicy, Server};

/// Serializes one outbound frame.
///
/// The role decides masking: [`Server`] frames go out as-is, [`Client`](crate::role::Client)
/// frames get the mask bit, a key and a masked payload.
pub struct FrameEncoder<'a, P: EncodePolicy> {
    opcode: Opcode,
    fin: bool,
    payload: &'a [u8],
    mask_key: Option<MaskKey>,
    _p: PhantomData<P>,
}

impl<'a, P: EncodePolicy> FrameEncoder<'a, P> {
    pub fn new(opcode: Opcode, payload: &'a [u8]) -> Self {
        Self {
            opcode,
            fin: true,
            payload,
            mask_key: None,
            _p: PhantomData,
        }
    }

    #[must_use]
    pub fn fin(mut self, fin: bool) -> Self {
        self.fin = fin;
        self
    }

    /// Uses `key` instead of a random one. Ignored for roles that do not mask.
    #[must_use]
    pub fn mask_key(mut self, key: MaskKey) -> Self {
        self.mask_key = Some(key);
        self
    }

    pub fn encode(self) -> Bytes {
        let (len, ext) = ExtendedLength::for_payload(self.payload.len());
        let key_len = if P::MASK_OUTGOING { 4 } else { 0 };

        tracing::trace!(
            opcode = ?self.opcode,
            fin = self.fin,
            len = self.payload.len(),
            "{} encoding frame",
            P::TAG
        );

        let mut buf = BytesMut::with_capacity(2 + ext.size() + key_len + self.payload.len());
        let header = FrameHeader {
            fin: self.fin,
            opcode: self.opcode as u8,
            mask: P::MASK_OUTGOING,
            len,
            ..FrameHeader::default()
        };
        buf.put_slice(&header.to_bytes());
        ext.put(&mut buf);

        // Clients must SEND masked
        if P::MASK_OUTGOING {
            let key = self.mask_key.unwrap_or_else(MaskKey::random);
            buf.put_slice(&key.0);

            let start = buf.len();
            buf.put_slice(self.payload);
            key.apply(&mut buf[start..]);
        } else {
            buf.put_slice(self.payload);
        }

        buf.freeze()
    }
}

/// Encodes a server frame: never masked, length picked from `payload`.
pub fn encode(opcode: Opcode, fin: bool, payload: &[u8]) -> Bytes {
    FrameEncoder::<Server>::new(opcode, payload).fin(fin).encode()
}
