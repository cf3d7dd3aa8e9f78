//! Passport endpoints.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::{required, RefreshPassportRequest};
use crate::error::AccessBridgeError;
use crate::models::{AccessControlPlan, Viewer};
use crate::router::PathParams;
use crate::AppState;

use super::{parse_json_body, require_site_id, AuthToken};

/// `PUT /v2/sites/:site_id/access/generate`
///
/// Anonymous requests are allowed and produce a passport covering the
/// free-tier plans only; a token that is present but invalid is a 401.
pub async fn generate_passport(
    state: AppState,
    request: Request,
    params: PathParams,
) -> Result<Response, AccessBridgeError> {
    let site_id = require_site_id(&params)?.to_owned();
    let auth = AuthToken::from_request(&request)?;

    let viewer = match auth.as_deref() {
        Some(token) => state.identity.get_viewer(&site_id, token).await?,
        None => Viewer::anonymous(),
    };

    let plans = state
        .plans
        .get_entitled_plans(&site_id, auth.as_deref())
        .await?;
    let access_plans = AccessControlPlan::from_plans(&plans);

    tracing::debug!(
        %site_id,
        viewer_id = %viewer.id,
        plan_count = access_plans.len(),
        "generating passport"
    );

    let passport = state
        .passport
        .generate_passport(&site_id, &viewer.id, &access_plans)
        .await?;
    Ok(Json(passport).into_response())
}

/// `PUT /v2/sites/:site_id/access/refresh`
pub async fn refresh_passport(
    state: AppState,
    request: Request,
    params: PathParams,
) -> Result<Response, AccessBridgeError> {
    let site_id = require_site_id(&params)?.to_owned();

    let body: RefreshPassportRequest = parse_json_body(request).await?;
    let refresh_token = required(body.refresh_token, "refresh_token")?;

    let passport = state
        .passport
        .refresh_passport(&site_id, &refresh_token)
        .await?;
    Ok(Json(passport).into_response())
}
