#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::empty_docs,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

mod client;
mod config;
mod error;
pub mod frames;
pub mod handshake;
mod protocol;
pub mod role;
mod server;
mod session;

pub use client::WebSocketClient;
pub use config::{DEFAULT_PORT, DEFAULT_READ_BUFFER, ServerConfig};
pub use error::{FrameError, HandshakeError, SessionError, UpgradeError};
pub use frames::{Frame, Opcode};
pub use server::WebSocketServer;
pub use session::{EchoHandler, MessageHandler, Session};
