//! Liveness endpoint for probes.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::AccessBridgeError;
use crate::router::PathParams;
use crate::AppState;

pub async fn health_check(
    state: AppState,
    _request: Request,
    _params: PathParams,
) -> Result<Response, AccessBridgeError> {
    Ok(Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}
