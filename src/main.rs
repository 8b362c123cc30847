mod clock;
mod config;
mod db;
mod demo_mode;
mod http;
mod pool;
mod seed;
mod status;
mod store;

use anyhow::anyhow;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // stdout carries machine-readable lines (listening address, seed summary).
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("serve") => http::start_server().await,
        Some("seed") => seed::run(&args[1..]),
        Some(other) => Err(anyhow!(
            "unknown command: {other} (expected `serve` or `seed`)"
        )),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
