use std::{
    collections::HashMap,
    io::{self, BufRead, BufReader, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
};

use base64::engine::{Engine, general_purpose::STANDARD as BASE64};
use bytes::{Buf, BytesMut};
use url::Url;

use crate::{
    config::DEFAULT_READ_BUFFER,
    error::{FrameError, SessionError, UpgradeError},
    frames::{self, Frame, FrameEncoder, Opcode},
    handshake,
    role::Client,
};

type Result<T> = std::result::Result<T, UpgradeError>;

const READ_CHUNK: usize = 4096;

/// Blocking WebSocket client, mainly used to talk to the echo server.
pub struct WebSocketClient {
    stream: TcpStream,
    addr: SocketAddr,
    buf: BytesMut,
    max_frame_size: usize,
}

impl WebSocketClient {
    /// Connects to a `ws://host[:port][/path]` url and upgrades the connection.
    pub fn connect(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| UpgradeError::InvalidUrl(e.to_string()))?;
        if url.scheme() != "ws" {
            return Err(UpgradeError::InvalidUrl(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| UpgradeError::InvalidUrl("missing host".into()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| UpgradeError::InvalidUrl("missing port".into()))?;

        let stream = TcpStream::connect((host, port)).map_err(UpgradeError::Connect)?;
        Self::try_upgrade(stream, &format!("{host}:{port}"), url.path())
    }

    fn try_upgrade(mut stream: TcpStream, host: &str, path: &str) -> Result<Self> {
        let addr = stream.peer_addr().map_err(UpgradeError::Connect)?;

        let sec_websocket_key = {
            let mut key_bytes = [0u8; 16];
            rand::fill(&mut key_bytes);
            BASE64.encode(key_bytes)
        };

        let req = format!(
            "GET {path} HTTP/1.1\r\n\
            Host: {host}\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Key: {sec_websocket_key}\r\n\
            Sec-WebSocket-Version: 13\r\n\r\n",
        );
        stream
            .write_all(req.as_bytes())
            .map_err(UpgradeError::Write)?;

        let mut reader = BufReader::new(stream);
        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .map_err(UpgradeError::Read)?;

        let mut status_parts = status_line.split_whitespace();
        if status_parts.next().is_none() || status_parts.next() != Some("101") {
            return Err(UpgradeError::StatusLine(status_line));
        }

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).map_err(UpgradeError::Read)?;
            let line = line.trim_end();
            if n == 0 || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
        }

        validate_header(&headers, "Upgrade", "websocket")?;
        validate_header(&headers, "Connection", "upgrade")?;

        let expected_accept = handshake::accept_token(&sec_websocket_key);
        match headers.get("Sec-WebSocket-Accept") {
            Some(x) if *x == expected_accept => {}
            r => {
                return Err(UpgradeError::Header {
                    field: "Sec-WebSocket-Accept",
                    expected: expected_accept,
                    got: r.cloned(),
                });
            }
        }

        // frames sent right after the 101 may already sit in the reader
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        buf.extend_from_slice(reader.buffer());

        tracing::info!(addr = ?addr, "successfully connected to peer");
        Ok(Self {
            stream: reader.into_inner(),
            addr,
            buf,
            max_frame_size: DEFAULT_READ_BUFFER,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr { self.addr }

    /// Caps the size of a single inbound frame, header included.
    #[must_use]
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Sends `text` as a single masked text frame.
    pub fn send_text(&mut self, text: &str) -> io::Result<()> {
        let frame = FrameEncoder::<Client>::new(Opcode::Text, text.as_bytes()).encode();
        self.stream.write_all(&frame)?;
        self.stream.flush()
    }

    /// Blocks until one whole frame has arrived, buffering partial reads.
    pub fn recv(&mut self) -> std::result::Result<Frame, SessionError> {
        let mut chunk = [0; READ_CHUNK];
        loop {
            match frames::decode_prefix(&self.buf) {
                Ok((frame, used)) => {
                    self.buf.advance(used);
                    return Ok(frame);
                }
                Err(FrameError::TruncatedFrame { needed, .. }) => {
                    if needed > self.max_frame_size as u64 {
                        tracing::warn!(size = needed, "CLI frame exceeds maximum size");
                        return Err(SessionError::FrameTooLarge {
                            size: needed,
                            max: self.max_frame_size,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }

            let n = match self.stream.read(&mut chunk) {
                Ok(0) => return Err(SessionError::TransportClosed),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            tracing::trace!(bytes = n, "CLI read socket");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Shuts the TCP stream down; the server sees a zero-length read.
    pub fn close(self) -> io::Result<()> { self.stream.shutdown(Shutdown::Both) }
}

fn validate_header(
    headers: &HashMap<String, String>,
    field: &'static str,
    expected: &str,
) -> Result<()> {
    match headers.get(field).map(|c| c.to_lowercase()) {
        Some(x) if x == expected => Ok(()),
        got => Err(UpgradeError::Header {
            field,
            expected: expected.into(),
            got,
        }),
    }
}
