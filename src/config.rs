/// Default listening port, shared by the server and client binaries.
pub const DEFAULT_PORT: u16 = 9001;

/// Default size of the per-read receive buffer.
pub const DEFAULT_READ_BUFFER: usize = 64 * 1024;

/// Everything the echo server needs to know before it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
    /// One read must hold a whole frame, so this caps the inbound frame size.
    pub read_buffer_size: usize,
    /// Stop after the first client disconnects.
    pub once: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            read_buffer_size: DEFAULT_READ_BUFFER,
            once: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, "127.0.0.1");
        assert_eq!(config.port, 9001);
        assert_eq!(config.read_buffer_size, 65536);
        assert!(!config.once);
    }
}
