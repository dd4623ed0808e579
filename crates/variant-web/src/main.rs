//! Thai copy variant relay server.
//!
//! Reads its settings from flags or the environment (a `.env` file in the
//! working directory is loaded first). `OPENAI_API_KEY` is required.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p variant-web
//! OPENAI_API_KEY=sk-... cargo run -p variant-web -- --port 8080 --model gpt-4o
//! RUST_LOG=variant_core=debug OPENAI_API_KEY=sk-... cargo run -p variant-web
//! ```
//!
//! ```bash
//! curl -s localhost:3000/generate -H 'content-type: application/json' -d '{
//!   "config": {"identity": "Friendly", "politeParticles": true},
//!   "nodes": [{"id": "1:2", "name": "CTA", "characters": "สมัครสมาชิก"}]
//! }'
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use variant_core::{CompletionClient, DEFAULT_MODEL, OPENAI_CHAT_URL, Relay, RelaySettings};
use variant_web::{DEFAULT_BODY_LIMIT, RateLimitConfig, WebConfig, build_router, serve};

/// Thai copy variant relay.
#[derive(Parser)]
#[command(name = "variant-web", about = "HTTP relay that generates Thai copy variants")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// API key for the completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model to use for completions.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions URL.
    #[arg(long, env = "OPENAI_ENDPOINT", default_value = OPENAI_CHAT_URL)]
    endpoint: String,

    /// Requests per caller per window on /generate (0 disables the ceiling).
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 100)]
    rate_limit: u32,

    /// Rate window length in seconds.
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 900)]
    rate_window_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Missing .env is fine; values may come from the real environment.
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let Some(api_key) = args.api_key.filter(|k| !k.is_empty()) else {
        error!("OPENAI_API_KEY is required");
        return Err("OPENAI_API_KEY is required".to_string());
    };

    let client = CompletionClient::with_endpoint(api_key, args.endpoint)?;
    let settings = RelaySettings::default().with_model(args.model);
    info!("using model {}", settings.model);
    let relay = Arc::new(Relay::new(client, settings));

    let config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        rate_limit: (args.rate_limit > 0).then(|| RateLimitConfig {
            max_requests: args.rate_limit,
            window: Duration::from_secs(args.rate_window_secs),
        }),
        body_limit: DEFAULT_BODY_LIMIT,
    };

    let router = build_router(relay, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", config.bind_addr))?;
    info!("Server running on http://{}", config.bind_addr);

    serve(listener, router, shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))
}
