use std::io::Result;

use clap::Parser;
use echo_socket::{DEFAULT_PORT, DEFAULT_READ_BUFFER, EchoHandler, ServerConfig, WebSocketServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    addr: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Size of the receive buffer; one read must hold a whole frame
    #[arg(long, default_value_t = DEFAULT_READ_BUFFER)]
    buffer_size: usize,

    /// Exit after the first client disconnects
    #[arg(long)]
    once: bool,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            port: args.port,
            read_buffer_size: args.buffer_size,
            once: args.once,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("echo_socket=info".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = ServerConfig::from(Args::parse());
    WebSocketServer::bind(&config)?.run(&mut EchoHandler)
}
