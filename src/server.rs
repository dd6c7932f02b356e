use std::{
    io::Result,
    net::{SocketAddr, TcpListener, TcpStream},
};

use crate::{
    config::ServerConfig,
    session::{MessageHandler, Session},
};

/// Accepts clients one after another and runs a [`Session`] for each.
pub struct WebSocketServer {
    listener: TcpListener,
    read_buffer_size: usize,
    once: bool,
}

impl WebSocketServer {
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.addr.as_str(), config.port))?;
        tracing::info!(addr = listener.local_addr()?.to_string(), "Listening on");
        Ok(Self {
            listener,
            read_buffer_size: config.read_buffer_size,
            once: config.once,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> { self.listener.local_addr() }

    /// Serves clients sequentially; returns after the first one when
    /// configured with `once`.
    pub fn run<H: MessageHandler>(&self, handler: &mut H) -> Result<()> {
        loop {
            self.serve_one(handler)?;
            if self.once {
                return Ok(());
            }
        }
    }

    /// Blocks for the next client and serves it until it goes away.
    ///
    /// Session failures only end that client's connection; only accept
    /// errors are returned.
    pub fn serve_one<H: MessageHandler>(&self, handler: &mut H) -> Result<()> {
        let (stream, peer) = self.listener.accept()?;
        let span = tracing::info_span!("conn", addr = %peer);
        let _enter = span.enter();
        tracing::info!("SRV: client connected");

        self.serve(stream, handler);
        Ok(())
    }

    fn serve<H: MessageHandler>(&self, stream: TcpStream, handler: &mut H) {
        let mut session = Session::new(stream, self.read_buffer_size);
        if let Err(e) = session.run(handler) {
            tracing::warn!(error = %e, "SRV: session ended with error");
        }
        // dropping the stream resets or closes the connection
    }
}
