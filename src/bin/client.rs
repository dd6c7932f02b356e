use std::process::ExitCode;

use clap::Parser;
use echo_socket::{SessionError, WebSocketClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Server url
    #[arg(short, long, default_value = "ws://127.0.0.1:9001/")]
    url: String,

    /// Messages to send, one frame each
    #[arg(default_value = "hello from echo-socket!")]
    messages: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("echo_socket=info".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let mut ws = match WebSocketClient::connect(&args.url) {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("CLI upgrade failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    for msg in &args.messages {
        let reply = ws
            .send_text(msg)
            .map_err(SessionError::from)
            .and_then(|()| ws.recv());
        match reply {
            Ok(frame) => println!("CLI MESSAGE: {}", frame.text()),
            Err(e) => {
                eprintln!("CLI ERR: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(e) = ws.close() {
        eprintln!("CLI ERR: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
