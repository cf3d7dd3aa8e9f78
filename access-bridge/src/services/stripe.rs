//! Stripe catalog and session client.
//!
//! Talks to the Stripe REST API directly: form-encoded requests, bearer
//! auth with the secret key. Provider failures are classified into the
//! local taxonomy before they leave this module.

use futures::future::join_all;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::dtos::CheckoutParams;
use crate::error::AccessBridgeError;
use crate::models::{Price, Product, Recurring, Viewer};

use super::transport_error;

#[derive(Clone)]
pub struct StripeService {
    client: reqwest::Client,
    base_url: String,
    secret_key: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct StripeProduct {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    active: bool,
    #[serde(default)]
    default_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
    currency: String,
    #[serde(default)]
    unit_amount: Option<i64>,
    #[serde(default)]
    recurring: Option<StripeRecurring>,
}

#[derive(Debug, Deserialize)]
struct StripeRecurring {
    interval: String,
    #[serde(default)]
    trial_period_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl StripeService {
    pub fn new(client: reqwest::Client, config: StripeConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url,
            secret_key: config.secret_key,
        }
    }

    /// Resolve each product with its active prices, concurrently.
    ///
    /// Inactive products, products with zero prices, and individual lookup
    /// failures are skipped; one bad product never fails the batch. An
    /// empty id set short-circuits without touching the network.
    pub async fn get_products_with_prices(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<Product>, AccessBridgeError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lookups = product_ids.iter().map(|id| self.product_with_prices(id));
        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }

    async fn product_with_prices(&self, product_id: &str) -> Option<Product> {
        match self.fetch_product_with_prices(product_id).await {
            Ok(product) => product,
            Err(error) => {
                tracing::warn!(product_id, "skipping product: {}", error);
                None
            }
        }
    }

    async fn fetch_product_with_prices(
        &self,
        product_id: &str,
    ) -> Result<Option<Product>, AccessBridgeError> {
        let product: StripeProduct = self
            .get(&format!("/products/{}", product_id), &[])
            .await?;
        if !product.active {
            return Ok(None);
        }

        let prices: StripeList<StripePrice> = self
            .get("/prices", &[("product", product_id), ("active", "true")])
            .await?;
        if prices.data.is_empty() {
            return Ok(None);
        }

        Ok(Some(Product {
            id: product.id,
            name: product.name,
            description: product.description,
            default_price: product.default_price,
            prices: prices
                .data
                .into_iter()
                .map(|price| Price {
                    id: price.id,
                    currency: price.currency,
                    unit_amount: price.unit_amount,
                    recurring: price.recurring.map(|recurring| Recurring {
                        interval: recurring.interval,
                        trial_period_days: recurring.trial_period_days,
                    }),
                })
                .collect(),
        }))
    }

    /// Billing customer id for an email, if one exists. Raw customer ids
    /// stay inside the service boundary.
    pub async fn get_customer_id_by_email(
        &self,
        email: &str,
    ) -> Result<Option<String>, AccessBridgeError> {
        let customers: StripeList<StripeCustomer> = self
            .get("/customers", &[("email", email), ("limit", "1")])
            .await?;
        Ok(customers.data.into_iter().next().map(|customer| customer.id))
    }

    /// Hosted checkout session for a single quantity-1 line item.
    ///
    /// The viewer id is stamped into `metadata` (and `subscription_data`
    /// metadata for subscriptions) so webhook consumers can reconcile the
    /// session later.
    pub async fn create_checkout_session(
        &self,
        viewer: &Viewer,
        params: &CheckoutParams,
    ) -> Result<String, AccessBridgeError> {
        let mut form: Vec<(&str, String)> = vec![
            ("mode", params.mode.clone()),
            ("line_items[0][price]", params.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", params.success_url.clone()),
            ("cancel_url", params.cancel_url.clone()),
            ("customer_email", viewer.email.clone()),
            ("metadata[viewer_id]", viewer.id.clone()),
        ];
        if params.mode == "subscription" {
            form.push(("subscription_data[metadata][viewer_id]", viewer.id.clone()));
        }

        let session: StripeSession = self.post("/checkout/sessions", &form).await?;
        session.url.ok_or_else(|| {
            tracing::error!("checkout session response carried no hosted URL");
            AccessBridgeError::InternalError
        })
    }

    /// Billing-portal session scoped to an already-resolved customer.
    pub async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, AccessBridgeError> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        let session: StripeSession = self.post("/billing_portal/sessions", &form).await?;
        session.url.ok_or_else(|| {
            tracing::error!("billing portal session response carried no URL");
            AccessBridgeError::InternalError
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AccessBridgeError> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|error| transport_error("stripe", error))?;
        Self::read(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, AccessBridgeError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.secret_key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(|error| transport_error("stripe", error))?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AccessBridgeError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| transport_error("stripe", error))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|error| {
                tracing::error!(error = %error, "failed to decode Stripe response");
                AccessBridgeError::InternalError
            })
        } else {
            Err(classify_error(status, &body))
        }
    }
}

/// Map a Stripe failure onto the local taxonomy by error type, falling
/// back to the HTTP status. Unrecognized types are bad requests carrying
/// the provider message through.
fn classify_error(status: StatusCode, body: &str) -> AccessBridgeError {
    let detail = serde_json::from_str::<StripeErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);
    let message = detail.as_ref().and_then(|detail| detail.message.clone());
    let kind = detail.as_ref().and_then(|detail| detail.kind.as_deref());

    match (kind, status) {
        (Some("authentication_error"), _) | (_, StatusCode::UNAUTHORIZED) => {
            AccessBridgeError::Unauthorized {
                description: message,
            }
        }
        (_, StatusCode::FORBIDDEN) => AccessBridgeError::Forbidden {
            description: message,
        },
        _ => AccessBridgeError::BadRequest {
            description: message,
        },
    }
}
