//! HTTP relay for Thai copy variants.
//!
//! `variant-web` puts an axum server in front of [`variant_core::Relay`] so a
//! design-tool plugin can request rewritten copy without holding API
//! credentials.
//!
//! # Endpoints
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /health` | `{"status":"ok"}` |
//! | `POST /generate` | `{config, nodes}` → `{variants: [{nodeId, original, options}]}` |
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use variant_core::{CompletionClient, Relay, RelaySettings};
//! use variant_web::{WebConfig, spawn_web};
//!
//! let client = CompletionClient::new(api_key)?;
//! let relay = Arc::new(Relay::new(client, RelaySettings::default()));
//! let addr = spawn_web(relay, WebConfig::default()).await?;
//! println!("Relay: http://{addr}");
//! ```
//!
//! CORS, the request body limit, and the per-IP rate ceiling are applied
//! here as layers; the core crate knows nothing about them.

mod api;
pub mod error;
pub mod limit;
mod server;

pub use api::parse_generate_request;
pub use error::ApiError;
pub use limit::{RateLimitConfig, RateLimiter};
pub use server::{build_router, serve};

use std::net::SocketAddr;
use std::sync::Arc;

use variant_core::Relay;

/// Default maximum request body: 1 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `0.0.0.0:3000`.
    pub bind_addr: SocketAddr,
    /// Per-IP ceiling on `/generate`. `None` disables it.
    /// Default: 100 requests per 15 minutes.
    pub rate_limit: Option<RateLimitConfig>,
    /// Maximum request body size in bytes. Default: [`DEFAULT_BODY_LIMIT`].
    pub body_limit: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rate_limit: Some(RateLimitConfig::default()),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Spawn the web server on a Tokio task.
///
/// Returns the bound address. The server runs until the Tokio runtime shuts
/// down. Bind to port 0 to get a random free port.
pub async fn spawn_web(relay: Arc<Relay>, config: WebConfig) -> std::io::Result<SocketAddr> {
    let router = server::build_router(relay, &config);
    server::start_server(router, config.bind_addr).await
}
