use serde::{Deserialize, Serialize};

use crate::error::AccessBridgeError;

/// Token pair minted by the access-control gateway, forwarded verbatim.
/// The passport itself is the only state; nothing is stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportResponse {
    pub passport: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPassportRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

/// Checkout parameters after presence validation.
#[derive(Debug)]
pub struct CheckoutParams {
    pub price_id: String,
    pub mode: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Check required fields in a fixed order so the error names the first
    /// absentee. Empty strings count as missing.
    pub fn validate(self) -> Result<CheckoutParams, AccessBridgeError> {
        Ok(CheckoutParams {
            price_id: required(self.price_id, "price_id")?,
            mode: required(self.mode, "mode")?,
            success_url: required(self.success_url, "success_url")?,
            cancel_url: required(self.cancel_url, "cancel_url")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BillingPortalRequest {
    #[serde(default)]
    pub return_url: Option<String>,
}

/// Response for the session-creating endpoints.
#[derive(Debug, Serialize)]
pub struct SessionUrlResponse {
    pub url: String,
}

pub(crate) fn required(
    value: Option<String>,
    parameter: &str,
) -> Result<String, AccessBridgeError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AccessBridgeError::parameter_missing(parameter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_validation_names_the_first_missing_field() {
        let request = CheckoutRequest {
            price_id: Some("price_123".to_string()),
            ..Default::default()
        };
        let error = request.validate().unwrap_err();
        assert_eq!(error.description(), "Required parameter mode is missing.");
    }

    #[test]
    fn checkout_validation_treats_empty_strings_as_missing() {
        let request = CheckoutRequest {
            price_id: Some(String::new()),
            mode: Some("payment".to_string()),
            success_url: Some("https://example.com/ok".to_string()),
            cancel_url: Some("https://example.com/no".to_string()),
        };
        let error = request.validate().unwrap_err();
        assert_eq!(
            error.description(),
            "Required parameter price_id is missing."
        );
    }

    #[test]
    fn complete_checkout_request_passes() {
        let request = CheckoutRequest {
            price_id: Some("price_123".to_string()),
            mode: Some("subscription".to_string()),
            success_url: Some("https://example.com/ok".to_string()),
            cancel_url: Some("https://example.com/no".to_string()),
        };
        let params = request.validate().unwrap();
        assert_eq!(params.price_id, "price_123");
        assert_eq!(params.mode, "subscription");
    }
}
