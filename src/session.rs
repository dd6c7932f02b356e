use std::io::{self, Read, Write};

use crate::{
    error::{HandshakeError, SessionError},
    frames::{self, Frame, Opcode},
    handshake,
};

type Result<T> = std::result::Result<T, SessionError>;

const ECHO_PREFIX: &str = "Server Echo: ";

/// Application logic run for every decoded frame.
pub trait MessageHandler {
    /// Returns the payload of the text frame to send back, if any.
    fn on_frame(&mut self, frame: &Frame) -> Option<Vec<u8>>;

    fn on_close(&mut self) {}
}

/// Replies to every frame with `"Server Echo: "` followed by its payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl MessageHandler for EchoHandler {
    fn on_frame(&mut self, frame: &Frame) -> Option<Vec<u8>> {
        let text = frame.text();
        tracing::info!(opcode = ?frame.opcode, len = frame.payload.len(), "Client: {text}");
        Some(format!("{ECHO_PREFIX}{text}").into_bytes())
    }

    fn on_close(&mut self) { tracing::info!("client closed"); }
}

/// Drives one connection: the upgrade first, then one frame per read.
///
/// Each read is expected to carry exactly one complete frame. A frame split
/// across reads fails to decode and ends the session.
pub struct Session<T> {
    stream: T,
    buf: Vec<u8>,
    upgraded: bool,
}

impl<T: Read + Write> Session<T> {
    pub fn new(stream: T, read_buffer_size: usize) -> Self {
        Self {
            stream,
            buf: vec![0; read_buffer_size.max(1)],
            upgraded: false,
        }
    }

    pub fn is_upgraded(&self) -> bool { self.upgraded }

    /// Runs until the peer closes the stream or something fails.
    ///
    /// A zero-length read is the normal way for a session to end and
    /// returns `Ok`. Every other error is returned as-is; nothing is sent
    /// to the peer.
    pub fn run<H: MessageHandler>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            match self.step(handler) {
                Ok(()) => {}
                Err(SessionError::TransportClosed) => {
                    tracing::info!("TCP FIN");
                    handler.on_close();
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "terminating session");
                    return Err(e);
                }
            }
        }
    }

    /// Performs a single read and handles what it carried.
    pub fn step<H: MessageHandler>(&mut self, handler: &mut H) -> Result<()> {
        let n = self.read()?;
        if self.upgraded {
            self.handle_frame(n, handler)
        } else {
            self.upgrade(n)
        }
    }

    pub fn into_inner(self) -> T { self.stream }

    fn read(&mut self) -> Result<usize> {
        loop {
            match self.stream.read(&mut self.buf) {
                Ok(0) => return Err(SessionError::TransportClosed),
                Ok(n) => {
                    tracing::trace!(bytes = n, "read socket");
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn upgrade(&mut self, n: usize) -> Result<()> {
        let request = &self.buf[..n];
        if !handshake::is_handshake(request) {
            tracing::warn!("first message is not an upgrade request");
            return Err(HandshakeError::MissingKey.into());
        }

        let response = handshake::resolve(&String::from_utf8_lossy(request))?;
        self.write(response.as_bytes())?;
        self.upgraded = true;
        tracing::info!("connection upgraded");
        Ok(())
    }

    fn handle_frame<H: MessageHandler>(&mut self, n: usize, handler: &mut H) -> Result<()> {
        let frame = frames::decode(&self.buf[..n])?;
        if let Some(reply) = handler.on_frame(&frame) {
            let bytes = frames::encode(Opcode::Text, true, &reply);
            self.write(&bytes)?;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        tracing::trace!(bytes = bytes.len(), "wrote socket");
        Ok(())
    }
}
