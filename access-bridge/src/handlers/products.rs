//! Product catalog endpoint.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::AccessBridgeError;
use crate::router::PathParams;
use crate::AppState;

use super::require_site_id;

/// `GET /v2/sites/:site_id/products`
///
/// Plans without a Stripe linkage contribute nothing; an empty catalog is
/// a valid response.
pub async fn get_products(
    state: AppState,
    _request: Request,
    params: PathParams,
) -> Result<Response, AccessBridgeError> {
    let site_id = require_site_id(&params)?;

    let plans = state.plans.get_available_plans(site_id).await?;
    let product_ids: Vec<String> = plans
        .iter()
        .filter_map(|plan| plan.stripe_product_id().map(str::to_owned))
        .collect();

    let products = state.stripe.get_products_with_prices(&product_ids).await?;
    Ok(Json(products).into_response())
}
