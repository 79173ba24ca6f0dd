//! Realtime presence and chat gateway for the Agora learning platform.
//!
//! Authenticates WebSocket connections with the platform's bearer tokens,
//! then relays chat messages, typing indicators, and presence between
//! cohort-mates.
//!
//! Run with:
//! ```not_rust
//! AGORA_JWT_SECRET=... cargo run --bin agora-server
//! AGORA_JWT_SECRET=... cargo run --bin agora-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use agora_server::{
    auth::{JWT_SECRET_ENV, TokenVerifier},
    hub::Hub,
    ui::Server,
};
use agora_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Realtime presence and chat gateway", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // The token signing secret is shared with the platform's auth service.
    let secret = match std::env::var(JWT_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::error!(
                "{} must be set to the platform's token signing secret",
                JWT_SECRET_ENV
            );
            std::process::exit(1);
        }
    };

    let hub = Arc::new(Hub::new(Arc::new(SystemClock)));
    let verifier = TokenVerifier::new(&secret);

    let server = Server::new(hub, verifier);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
