//! Identity service client (SIMS).

use crate::error::{AccessBridgeError, JwError};
use crate::models::Viewer;

use super::{read_json_or_error, transport_error};

#[derive(Clone)]
pub struct IdentityService {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityService {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Resolve the viewer behind a bearer token. An unrecognized or expired
    /// token surfaces as `unauthorized`, never as a 500.
    pub async fn get_viewer(
        &self,
        site_id: &str,
        token: &str,
    ) -> Result<Viewer, AccessBridgeError> {
        let url = format!("{}/v2/sites/{}/account", self.base_url, site_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| transport_error("identity", error))?;

        read_json_or_error("identity", response, translate_error).await
    }
}

fn translate_error(error: &JwError) -> AccessBridgeError {
    match error.code.as_str() {
        "unauthorized" => AccessBridgeError::unauthorized_with(error.description.clone()),
        "forbidden" => AccessBridgeError::forbidden_with(error.description.clone()),
        _ => AccessBridgeError::bad_request_with(error.description.clone()),
    }
}
