//! Plans service client.

use serde::Deserialize;

use crate::error::{AccessBridgeError, JwError};
use crate::models::Plan;

use super::{read_json_or_error, transport_error};

#[derive(Clone)]
pub struct PlansService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PlansResponse {
    #[serde(default)]
    plans: Option<Vec<Plan>>,
}

impl PlansService {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Full published plan catalog for a site.
    pub async fn get_available_plans(
        &self,
        site_id: &str,
    ) -> Result<Vec<Plan>, AccessBridgeError> {
        let url = format!("{}/v3/sites/{}/plans", self.base_url, site_id);
        self.fetch(url, None).await
    }

    /// Plans the requesting viewer is entitled to, forwarding the caller's
    /// bearer token. Without a token the upstream returns free-tier plans
    /// only.
    pub async fn get_entitled_plans(
        &self,
        site_id: &str,
        token: Option<&str>,
    ) -> Result<Vec<Plan>, AccessBridgeError> {
        let url = format!("{}/v3/sites/{}/entitlements", self.base_url, site_id);
        self.fetch(url, token).await
    }

    async fn fetch(
        &self,
        url: String,
        token: Option<&str>,
    ) -> Result<Vec<Plan>, AccessBridgeError> {
        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| transport_error("plans", error))?;

        let body: PlansResponse = read_json_or_error("plans", response, translate_error).await?;
        // A site with no plans is an empty list, never an error.
        Ok(body.plans.unwrap_or_default())
    }
}

fn translate_error(error: &JwError) -> AccessBridgeError {
    match error.code.as_str() {
        "unauthorized" => AccessBridgeError::unauthorized_with(error.description.clone()),
        "forbidden" => AccessBridgeError::forbidden_with(error.description.clone()),
        "not_found" => AccessBridgeError::not_found_with(error.description.clone()),
        _ => AccessBridgeError::bad_request_with(error.description.clone()),
    }
}
