//! Domain entities crossing the service boundaries.

use serde::{Deserialize, Serialize};

/// Viewer resolved from a bearer token, or the anonymous sentinel.
#[derive(Debug, Clone, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub email: String,
}

impl Viewer {
    /// Sentinel accepted by the passport generate flow when no token is
    /// sent; checkout and billing flows never see it.
    pub fn anonymous() -> Self {
        Self {
            id: "unauthorized".to_string(),
            email: "unauthorized".to_string(),
        }
    }
}

/// How a plan is gated upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessModel {
    Free,
    Freeauth,
    Svod,
}

/// Access-control plan as returned by the plans service. Catalog plans
/// carry the Stripe linkage; entitled plans carry an expiry.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub access_model: AccessModel,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub metadata: Option<PlanMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanMetadata {
    #[serde(default)]
    pub external_providers: Option<ExternalProviders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalProviders {
    #[serde(default)]
    pub stripe: Option<String>,
}

impl Plan {
    /// Stripe product linked to this plan, when the linkage exists.
    pub fn stripe_product_id(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .external_providers
            .as_ref()?
            .stripe
            .as_deref()
    }
}

/// The trimmed projection of a plan that crosses into the passport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPlan {
    pub id: String,
    pub exp: i64,
}

impl AccessControlPlan {
    /// Only `id`/`exp` cross into the passport; plans without an expiry are
    /// not projectable and contribute nothing.
    pub fn from_plans(plans: &[Plan]) -> Vec<Self> {
        plans
            .iter()
            .filter_map(|plan| {
                plan.exp.map(|exp| Self {
                    id: plan.id.clone(),
                    exp,
                })
            })
            .collect()
    }
}

/// Neutral catalog product exposed to clients, mapped 1:1 from the payment
/// provider's product/price objects.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub default_price: Option<String>,
    pub prices: Vec<Price>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Price {
    pub id: String,
    pub currency: String,
    pub unit_amount: Option<i64>,
    pub recurring: Option<Recurring>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recurring {
    pub interval: String,
    pub trial_period_days: Option<u32>,
}
