//! Error taxonomy and wire envelope.
//!
//! The upstream services speak the same `{ errors: [{code, description}] }`
//! envelope this service produces, so most provider failures pass through
//! with the codes the bridge itself uses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed failure for every externally-visible error of the bridge.
///
/// One variant per wire code. Variants carrying a `description` accept a
/// call-site override; `None` renders the default template.
#[derive(Debug, Clone, Error)]
pub enum AccessBridgeError {
    #[error("The request was not constructed correctly.")]
    BadRequest { description: Option<String> },

    #[error("Required parameter {parameter} is missing.")]
    ParameterMissing {
        parameter: String,
        description: Option<String>,
    },

    #[error("Parameter {parameter} is invalid. {reason}.")]
    ParameterInvalid {
        parameter: String,
        reason: String,
        description: Option<String>,
    },

    #[error("Missing or invalid auth credentials.")]
    Unauthorized { description: Option<String> },

    #[error("Access to the requested resource is not allowed.")]
    Forbidden { description: Option<String> },

    #[error("The requested resource could not be found.")]
    NotFound { description: Option<String> },

    #[error("The requested resource only supports {} requests.", .allowed.join(", "))]
    MethodNotAllowed { allowed: Vec<String> },

    #[error("An error was encountered while processing the request. Please try again.")]
    InternalError,
}

impl AccessBridgeError {
    pub fn bad_request() -> Self {
        Self::BadRequest { description: None }
    }

    pub fn bad_request_with(description: impl Into<String>) -> Self {
        Self::BadRequest {
            description: Some(description.into()),
        }
    }

    pub fn parameter_missing(parameter: impl Into<String>) -> Self {
        Self::ParameterMissing {
            parameter: parameter.into(),
            description: None,
        }
    }

    pub fn parameter_invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParameterInvalid {
            parameter: parameter.into(),
            reason: reason.into(),
            description: None,
        }
    }

    /// Parameter error with the full description supplied by the caller,
    /// used when an upstream already produced a precise message.
    pub fn parameter_invalid_with(
        parameter: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::ParameterInvalid {
            parameter: parameter.into(),
            reason: String::new(),
            description: Some(description.into()),
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized { description: None }
    }

    pub fn unauthorized_with(description: impl Into<String>) -> Self {
        Self::Unauthorized {
            description: Some(description.into()),
        }
    }

    pub fn forbidden_with(description: impl Into<String>) -> Self {
        Self::Forbidden {
            description: Some(description.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound { description: None }
    }

    pub fn not_found_with(description: impl Into<String>) -> Self {
        Self::NotFound {
            description: Some(description.into()),
        }
    }

    /// 405 listing the methods that ARE supported. The list is sorted here
    /// so the `Allow` header and description are deterministic.
    pub fn method_not_allowed<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowed: Vec<String> = methods.into_iter().map(Into::into).collect();
        allowed.sort();
        Self::MethodNotAllowed { allowed }
    }

    /// Stable wire code clients branch on.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::ParameterMissing { .. } => "parameter_missing",
            Self::ParameterInvalid { .. } => "parameter_invalid",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::InternalError => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. }
            | Self::ParameterMissing { .. }
            | Self::ParameterInvalid { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Description for the wire envelope: the call-site override when one
    /// was given, the variant's default template otherwise.
    pub fn description(&self) -> String {
        let supplied = match self {
            Self::BadRequest { description, .. }
            | Self::ParameterMissing { description, .. }
            | Self::ParameterInvalid { description, .. }
            | Self::Unauthorized { description, .. }
            | Self::Forbidden { description, .. }
            | Self::NotFound { description, .. } => description.as_ref(),
            Self::MethodNotAllowed { .. } | Self::InternalError => None,
        };
        supplied
            .filter(|description| !description.is_empty())
            .cloned()
            .unwrap_or_else(|| self.to_string())
    }
}

#[derive(Serialize)]
struct WireError {
    code: &'static str,
    description: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    errors: Vec<WireError>,
}

/// Render one or more errors as the uniform `{ errors: [...] }` envelope.
///
/// All errors must share one status code; mixing statuses in a single
/// response is a programming error and fails fast.
pub fn error_response(errors: &[AccessBridgeError]) -> Response {
    assert!(!errors.is_empty(), "error_response requires at least one error");
    let status = errors[0].status();
    assert!(
        errors.iter().all(|error| error.status() == status),
        "all errors in one response must share a status code"
    );

    let envelope = ErrorEnvelope {
        errors: errors
            .iter()
            .map(|error| WireError {
                code: error.code(),
                description: error.description(),
            })
            .collect(),
    };

    let mut response = (status, Json(envelope)).into_response();
    for error in errors {
        if let AccessBridgeError::MethodNotAllowed { allowed } = error {
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
    }
    response
}

impl IntoResponse for AccessBridgeError {
    fn into_response(self) -> Response {
        error_response(&[self])
    }
}

/// Error envelope shape shared by the JW-style upstream services.
#[derive(Debug, Deserialize)]
pub struct JwErrorEnvelope {
    pub errors: Vec<JwError>,
}

#[derive(Debug, Deserialize)]
pub struct JwError {
    pub code: String,
    pub description: String,
}

/// Structural guard for the upstream envelope. `None` means the body is not
/// the recognized shape and the caller must treat the failure as opaque.
pub fn parse_jw_error(body: &str) -> Option<JwErrorEnvelope> {
    serde_json::from_str::<JwErrorEnvelope>(body)
        .ok()
        .filter(|envelope| !envelope.errors.is_empty())
}
