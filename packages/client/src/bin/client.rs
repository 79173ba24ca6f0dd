//! CLI chat client for the Agora realtime gateway.
//!
//! Connects to the gateway with a bearer token and sends messages from
//! stdin. Joining rooms, presence, and typing indicators are driven with
//! slash-commands; type /help at the prompt.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval); a rejected token exits immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-client -- --token <jwt>
//! cargo run --bin agora-client -- -t <jwt> -u ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use agora_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "agora-client")]
#[command(about = "CLI chat client for the Agora realtime gateway", long_about = None)]
struct Args {
    /// Bearer token issued by the platform's auth service
    #[arg(short = 't', long)]
    token: String,

    /// WebSocket gateway URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = agora_client::runner::run_client(args.url, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
