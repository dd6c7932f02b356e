use std::io;

use thiserror::Error;

/// Errors produced while resolving the opening HTTP upgrade request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The request carried no `Sec-WebSocket-Key` header.
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,
}

/// Errors produced while decoding a single frame from a received buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer holds fewer bytes than the frame declares.
    #[error("truncated frame: needed {needed} bytes, {available} available")]
    TruncatedFrame {
        /// Total bytes the frame requires, counted from the start of the buffer.
        needed: u64,
        /// Bytes actually present in the buffer.
        available: usize,
    },
    /// Reserved bits were set or the opcode is not one we understand.
    #[error("malformed frame header: {0}")]
    MalformedHeader(&'static str),
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer closed the TCP stream (zero-length read).
    #[error("transport closed by peer")]
    TransportClosed,
    /// An inbound frame declared more bytes than we are willing to buffer.
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: u64, max: usize },
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur when upgrading a TCP stream to a WebSocket as a client.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// Tried to connect to an invalid url.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Failed to establish TCP connection.
    #[error("failed to connect: {0}")]
    Connect(io::Error),
    /// Failed to read from the TCP stream.
    #[error("failed to read upgrade response: {0}")]
    Read(io::Error),
    /// Failed to write to the TCP stream.
    #[error("failed to write upgrade request: {0}")]
    Write(io::Error),
    /// Server returned an unexpected HTTP status line.
    #[error("unexpected status line: {0:?}")]
    StatusLine(String),
    /// A handshake header did not match expectations.
    #[error("header {field}: expected {expected:?}, got {got:?}")]
    Header {
        /// The name of the header field.
        field: &'static str,
        /// The expected value.
        expected: String,
        /// The actual value, if any.
        got: Option<String>,
    },
}
