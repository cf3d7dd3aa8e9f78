pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod startup;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use config::Config;
use router::Route;
use services::{IdentityService, PassportService, PlansService, StripeService};

pub use startup::Application;

/// Outbound calls carry an explicit deadline; a hung provider must not pin
/// inbound requests open forever.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-process state shared by every request. Immutable after startup, so
/// request handling needs no locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub routes: Arc<Vec<Route>>,
    pub identity: IdentityService,
    pub plans: PlansService,
    pub passport: PassportService,
    pub stripe: StripeService,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build the outbound HTTP client")?;

        Ok(Self {
            identity: IdentityService::new(client.clone(), config.upstream.identity_url.clone()),
            plans: PlansService::new(client.clone(), config.upstream.plans_url.clone()),
            passport: PassportService::new(
                client.clone(),
                config.upstream.access_control_url.clone(),
                config.signing.secret.clone(),
            ),
            stripe: StripeService::new(client, config.stripe.clone()),
            routes: Arc::new(routes()),
            config,
        })
    }
}

/// Every endpoint the bridge serves. The dispatcher scans these in order
/// and the first matching pattern wins.
fn routes() -> Vec<Route> {
    vec![
        Route::new("/health").get(handlers::health::health_check),
        Route::new("/v2/sites/:site_id/access/generate").put(handlers::access::generate_passport),
        Route::new("/v2/sites/:site_id/access/refresh").put(handlers::access::refresh_passport),
        Route::new("/v2/sites/:site_id/products").get(handlers::products::get_products),
        Route::new("/v2/sites/:site_id/checkout").post(handlers::checkout::initiate_checkout),
        Route::new("/v2/sites/:site_id/billing-portal")
            .post(handlers::checkout::generate_billing_portal_url),
    ]
}
