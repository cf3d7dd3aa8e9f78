//! Passport issuance against the access-control gateway.
//!
//! The gateway authorizes calls through short-lived signed URLs rather than
//! an API key: a JWT in the `token` query parameter covers the resource
//! path and an expiry, signed with the shared secret.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::dtos::PassportResponse;
use crate::error::{AccessBridgeError, JwError};
use crate::models::AccessControlPlan;

use super::{read_json_or_error, transport_error};

const URL_VALIDITY_SECS: i64 = 3600;
/// Expiries round up to this boundary so identical requests inside one
/// window produce identical URLs.
const EXPIRY_ROUND_SECS: i64 = 300;

#[derive(Clone)]
pub struct PassportService {
    client: reqwest::Client,
    base_url: String,
    signing_secret: Secret<String>,
}

/// The signed-URL token payload. Exactly these two claims; nothing is
/// injected automatically.
#[derive(Debug, Serialize)]
struct SignedUrlClaims<'a> {
    exp: i64,
    resource: &'a str,
}

#[derive(Debug, Serialize)]
struct GeneratePassportBody<'a> {
    subscriber_info: SubscriberInfo<'a>,
}

#[derive(Debug, Serialize)]
struct SubscriberInfo<'a> {
    email: &'a str,
    plans: &'a [AccessControlPlan],
}

#[derive(Debug, Serialize)]
struct RefreshPassportBody<'a> {
    refresh_token: &'a str,
}

impl PassportService {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        signing_secret: Secret<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            signing_secret,
        }
    }

    /// Mint a passport for a viewer covering the given plans. The gateway's
    /// token pair is returned unchanged.
    pub async fn generate_passport(
        &self,
        site_id: &str,
        viewer_id: &str,
        plans: &[AccessControlPlan],
    ) -> Result<PassportResponse, AccessBridgeError> {
        let path = format!("/v2/sites/{}/access/generate", site_id);
        let body = GeneratePassportBody {
            subscriber_info: SubscriberInfo {
                email: viewer_id,
                plans,
            },
        };
        self.signed_put(&path, &body, translate_generate_error)
            .await
    }

    /// Exchange a refresh token for a new passport pair.
    pub async fn refresh_passport(
        &self,
        site_id: &str,
        refresh_token: &str,
    ) -> Result<PassportResponse, AccessBridgeError> {
        let path = format!("/v2/sites/{}/access/refresh", site_id);
        let body = RefreshPassportBody { refresh_token };
        self.signed_put(&path, &body, translate_refresh_error).await
    }

    async fn signed_put<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        translate: fn(&JwError) -> AccessBridgeError,
    ) -> Result<PassportResponse, AccessBridgeError> {
        let url = self.signed_url(path)?;
        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| transport_error("access-control", error))?;

        read_json_or_error("access-control", response, translate).await
    }

    /// `{host}{path}?token={jwt}` authorizing exactly one resource path.
    fn signed_url(&self, path: &str) -> Result<String, AccessBridgeError> {
        let claims = SignedUrlClaims {
            exp: signed_url_expiry(Utc::now().timestamp()),
            resource: path,
        };
        let key = EncodingKey::from_secret(self.signing_secret.expose_secret().as_bytes());
        let token = encode(&Header::default(), &claims, &key).map_err(|error| {
            tracing::error!(error = %error, "failed to sign gateway URL");
            AccessBridgeError::InternalError
        })?;
        Ok(format!("{}{}?token={}", self.base_url, path, token))
    }
}

/// One hour out, rounded up to the next 300-second boundary. All values
/// are unix seconds.
fn signed_url_expiry(now: i64) -> i64 {
    let target = now + URL_VALIDITY_SECS;
    (target + EXPIRY_ROUND_SECS - 1) / EXPIRY_ROUND_SECS * EXPIRY_ROUND_SECS
}

fn translate_generate_error(error: &JwError) -> AccessBridgeError {
    match error.code.as_str() {
        "forbidden" => AccessBridgeError::forbidden_with(error.description.clone()),
        _ => AccessBridgeError::bad_request_with(error.description.clone()),
    }
}

fn translate_refresh_error(error: &JwError) -> AccessBridgeError {
    match error.code.as_str() {
        "forbidden" => AccessBridgeError::forbidden_with(error.description.clone()),
        "not_found" => AccessBridgeError::not_found_with(error.description.clone()),
        "parameter_missing" | "parameter_invalid" => {
            AccessBridgeError::parameter_invalid_with("refresh_token", error.description.clone())
        }
        _ => AccessBridgeError::bad_request_with(error.description.clone()),
    }
}
