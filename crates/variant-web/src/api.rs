//! REST endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::Value;
use tracing::{debug, info};
use variant_core::trace::generate_request_id;
use variant_core::{GenerateRequest, GenerationConfig, GenerationResults, Relay, TextNode};

use crate::error::ApiError;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// GET /health — liveness check.
pub async fn get_health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /generate — rewrite a batch of text nodes.
///
/// Validates the body before any upstream call. Returns 400 for a bad
/// shape, 500 when the model call fails or replies with nothing, and 200
/// with one entry per node otherwise.
#[tracing::instrument(name = "generate", skip_all, fields(request_id = %generate_request_id()))]
pub async fn post_generate(
    State(app): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerationResults>, ApiError> {
    let Json(body) = body?;
    let request = parse_generate_request(body)?;
    debug!("{} node(s) accepted", request.nodes.len());

    let results = app.relay.generate(&request.config, &request.nodes).await?;
    info!("returning {} variant set(s)", results.variants.len());
    Ok(Json(results))
}

/// Check the body shape and deserialize it.
///
/// `config` must be present and non-null; `nodes` must be a non-empty array.
pub fn parse_generate_request(mut body: Value) -> Result<GenerateRequest, ApiError> {
    let config = match body.get_mut("config").map(Value::take) {
        None | Some(Value::Null) => return Err(ApiError::missing_fields()),
        Some(config) => config,
    };
    let nodes = match body.get_mut("nodes").map(Value::take) {
        Some(Value::Array(nodes)) if !nodes.is_empty() => nodes,
        _ => return Err(ApiError::missing_fields()),
    };

    let config: GenerationConfig = serde_json::from_value(config)
        .map_err(|e| ApiError::InvalidRequest(format!("config: {e}")))?;
    let nodes = nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| {
            serde_json::from_value::<TextNode>(node)
                .map_err(|e| ApiError::InvalidRequest(format!("nodes[{i}]: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GenerateRequest { config, nodes })
}
