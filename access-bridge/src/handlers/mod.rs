//! Endpoint handlers: orchestration shims between the dispatcher and the
//! domain services.

pub mod access;
pub mod checkout;
pub mod health;
pub mod products;

use axum::{
    body::to_bytes,
    extract::Request,
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::AccessBridgeError;
use crate::router::PathParams;

/// Upper bound on inbound JSON bodies; the real payloads are tiny.
const BODY_LIMIT: usize = 64 * 1024;

/// Bearer token state of a request.
pub(crate) enum AuthToken {
    Absent,
    Bearer(String),
}

impl AuthToken {
    /// Read the `Authorization` header. A header that is present but not a
    /// bearer token is rejected rather than treated as anonymous.
    pub(crate) fn from_request(request: &Request) -> Result<Self, AccessBridgeError> {
        let Some(value) = request.headers().get(header::AUTHORIZATION) else {
            return Ok(Self::Absent);
        };
        value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .map(|token| Self::Bearer(token.to_string()))
            .ok_or_else(AccessBridgeError::unauthorized)
    }

    pub(crate) fn require(self) -> Result<String, AccessBridgeError> {
        match self {
            Self::Bearer(token) => Ok(token),
            Self::Absent => Err(AccessBridgeError::unauthorized()),
        }
    }

    pub(crate) fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Bearer(token) => Some(token),
            Self::Absent => None,
        }
    }
}

/// `site_id` is validated at every controller boundary, never trusted from
/// the route match alone.
pub(crate) fn require_site_id(params: &PathParams) -> Result<&str, AccessBridgeError> {
    let site_id = params
        .get("site_id")
        .ok_or_else(|| AccessBridgeError::parameter_missing("site_id"))?;
    let valid = site_id.len() == 8 && site_id.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(AccessBridgeError::parameter_invalid(
            "site_id",
            "Site ID must be 8 alphanumeric characters",
        ));
    }
    Ok(site_id)
}

/// Decode a JSON request body; malformed JSON is a plain `bad_request`.
pub(crate) async fn parse_json_body<T: DeserializeOwned>(
    request: Request,
) -> Result<T, AccessBridgeError> {
    let bytes = to_bytes(request.into_body(), BODY_LIMIT)
        .await
        .map_err(|_| AccessBridgeError::bad_request())?;
    serde_json::from_slice(&bytes).map_err(|_| AccessBridgeError::bad_request())
}
