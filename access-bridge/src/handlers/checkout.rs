//! Checkout and billing-portal endpoints. Both require an authenticated
//! viewer; the anonymous sentinel never reaches these flows.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::{required, BillingPortalRequest, CheckoutRequest, SessionUrlResponse};
use crate::error::AccessBridgeError;
use crate::router::PathParams;
use crate::AppState;

use super::{parse_json_body, require_site_id, AuthToken};

/// `POST /v2/sites/:site_id/checkout`
pub async fn initiate_checkout(
    state: AppState,
    request: Request,
    params: PathParams,
) -> Result<Response, AccessBridgeError> {
    let site_id = require_site_id(&params)?.to_owned();
    let token = AuthToken::from_request(&request)?.require()?;

    let body: CheckoutRequest = parse_json_body(request).await?;
    let checkout = body.validate()?;

    let viewer = state.identity.get_viewer(&site_id, &token).await?;

    tracing::debug!(
        %site_id,
        viewer_id = %viewer.id,
        price_id = %checkout.price_id,
        mode = %checkout.mode,
        "creating checkout session"
    );

    let url = state
        .stripe
        .create_checkout_session(&viewer, &checkout)
        .await?;
    Ok(Json(SessionUrlResponse { url }).into_response())
}

/// `POST /v2/sites/:site_id/billing-portal`
///
/// Customer resolution precedes body validation: a viewer with no billing
/// history gets a 404 regardless of payload.
pub async fn generate_billing_portal_url(
    state: AppState,
    request: Request,
    params: PathParams,
) -> Result<Response, AccessBridgeError> {
    let site_id = require_site_id(&params)?.to_owned();
    let token = AuthToken::from_request(&request)?.require()?;

    let body: BillingPortalRequest = parse_json_body(request).await?;

    let viewer = state.identity.get_viewer(&site_id, &token).await?;
    let customer_id = state
        .stripe
        .get_customer_id_by_email(&viewer.email)
        .await?
        .ok_or_else(|| {
            AccessBridgeError::not_found_with(
                "No billing customer found for the authenticated viewer.",
            )
        })?;

    let return_url = required(body.return_url, "return_url")?;

    let url = state
        .stripe
        .create_billing_portal_session(&customer_id, &return_url)
        .await?;
    Ok(Json(SessionUrlResponse { url }).into_response())
}
