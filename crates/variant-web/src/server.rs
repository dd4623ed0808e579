//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use variant_core::Relay;

use crate::WebConfig;
use crate::api::{self, AppState};
use crate::limit::{self, RateLimiter};

/// Build the full axum router.
///
/// The router serves:
/// - `GET /health`
/// - `POST /generate`, behind the optional rate ceiling
pub fn build_router(relay: Arc<Relay>, config: &WebConfig) -> Router {
    let app_state = AppState { relay };

    // Plugin iframes run on arbitrary origins; reflect whichever one asks.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let mut generate_routes = Router::new().route("/generate", post(api::post_generate));
    if let Some(limit_config) = config.rate_limit {
        let limiter = Arc::new(RateLimiter::new(limit_config));
        generate_routes =
            generate_routes.route_layer(middleware::from_fn_with_state(limiter, limit::enforce));
    }

    Router::new()
        .route("/health", get(api::get_health))
        .merge(generate_routes)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Start the axum server on a Tokio task and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("listening on http://{addr}");

    tokio::spawn(async move {
        if let Err(e) = serve(listener, router, std::future::pending()).await {
            error!("server stopped: {e}");
        }
    });

    Ok(addr)
}
