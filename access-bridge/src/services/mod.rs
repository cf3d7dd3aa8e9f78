//! Clients for the three upstream providers.
//!
//! Each client translates provider failures into the local taxonomy before
//! returning; callers never see provider-specific error shapes.

pub mod identity;
pub mod passport;
pub mod plans;
pub mod stripe;

pub use identity::IdentityService;
pub use passport::PassportService;
pub use plans::PlansService;
pub use stripe::StripeService;

use serde::de::DeserializeOwned;

use crate::error::{parse_jw_error, AccessBridgeError, JwError};

/// Network-level failure talking to an upstream. The client never learns
/// more than "internal error".
pub(crate) fn transport_error(service: &'static str, error: reqwest::Error) -> AccessBridgeError {
    tracing::error!(service, error = %error, "upstream request failed");
    AccessBridgeError::InternalError
}

/// Decode a JW-style upstream response: success bodies parse into `T`,
/// failure bodies go through the per-call translation table. The FIRST
/// error in the provider envelope decides the local kind; bodies that are
/// not the recognized envelope shape are logged and become opaque 500s.
pub(crate) async fn read_json_or_error<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
    translate: fn(&JwError) -> AccessBridgeError,
) -> Result<T, AccessBridgeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| transport_error(service, error))?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|error| {
            tracing::error!(service, error = %error, "failed to decode upstream response");
            AccessBridgeError::InternalError
        });
    }

    match parse_jw_error(&body).and_then(|envelope| envelope.errors.into_iter().next()) {
        Some(first) => Err(translate(&first)),
        None => {
            tracing::error!(service, %status, body = %body, "unrecognized upstream error");
            Err(AccessBridgeError::InternalError)
        }
    }
}
