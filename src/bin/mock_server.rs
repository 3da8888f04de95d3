use std::net::SocketAddr;
use std::time::Duration;

use agentchat::logging::init_server_logging;
use agentchat::server::{self, DEFAULT_CHAT_LATENCY, DEFAULT_UPLOAD_LATENCY, MockServerState};
use anyhow::Result;
use clap::Parser;
use log::info;

/// Mock agent backend: canned chat replies, history, uploads and the agent endpoints.
#[derive(Parser, Debug)]
#[command(name = "mock-server", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,
    /// Artificial delay before chat and agent replies, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_CHAT_LATENCY.as_millis() as u64)]
    chat_latency_ms: u64,
    /// Artificial delay before upload replies, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_UPLOAD_LATENCY.as_millis() as u64)]
    upload_latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_server_logging();
    let args = Args::parse();
    info!(
        "Latency: chat {} ms, upload {} ms",
        args.chat_latency_ms, args.upload_latency_ms
    );
    let state = MockServerState::seeded(
        Duration::from_millis(args.chat_latency_ms),
        Duration::from_millis(args.upload_latency_ms),
    );
    server::serve(args.addr, state).await
}
