//! Server side of the HTTP upgrade.

use base64::engine::{Engine, general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

use crate::error::HandshakeError;

/// Appended to the client key before hashing, see RFC 6455 §1.3.
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const KEY_HEADER: &str = "Sec-WebSocket-Key:";

/// Whether `buf` looks like an upgrade request carrying a key.
pub fn is_handshake(buf: &[u8]) -> bool {
    buf.windows(KEY_HEADER.len())
        .any(|w| w == KEY_HEADER.as_bytes())
}

/// Pulls the `Sec-WebSocket-Key` token out of a raw request.
///
/// The token starts after the single space that follows the colon and
/// runs to the end of the line.
pub fn extract_key(request: &str) -> Result<&str, HandshakeError> {
    let start = request.find(KEY_HEADER).ok_or(HandshakeError::MissingKey)? + KEY_HEADER.len();
    let rest = &request[start..];
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
    Ok(&rest[..end])
}

/// Derives the `Sec-WebSocket-Accept` value for `key`.
///
/// `sha1` already yields the digest in network byte order, so the bytes
/// go straight to the encoder.
pub fn accept_token(key: &str) -> String {
    let mut sha = Sha1::new();
    sha.update(key.as_bytes());
    sha.update(WS_GUID.as_bytes());
    BASE64.encode(sha.finalize())
}

/// Builds the `101 Switching Protocols` response for a raw upgrade request.
pub fn resolve(request: &str) -> Result<String, HandshakeError> {
    let key = extract_key(request)?;
    let accept_key = accept_token(key);
    tracing::debug!(key = %key, accept = %accept_key, "resolved handshake");

    Ok(format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept_key}\r\n\r\n",
    ))
}
