use access_bridge::config::{Config, ServerConfig, SigningConfig, StripeConfig, UpstreamConfig};
use access_bridge::Application;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_SITE_ID: &str = "AbCd1234";
pub const TEST_TOKEN: &str = "viewer-session-token";
pub const TEST_VIEWER_ID: &str = "viewer-1";
pub const TEST_VIEWER_EMAIL: &str = "viewer@example.com";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub identity: MockServer,
    pub plans: MockServer,
    pub access_control: MockServer,
    pub stripe: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let identity = MockServer::start().await;
        let plans = MockServer::start().await;
        let access_control = MockServer::start().await;
        let stripe = MockServer::start().await;

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            signing: SigningConfig {
                secret: Secret::new("test-signing-secret".to_string()),
            },
            stripe: StripeConfig {
                secret_key: Secret::new("sk_test_123".to_string()),
                api_base_url: format!("{}/v1", stripe.uri()),
            },
            upstream: UpstreamConfig {
                identity_url: identity.uri(),
                access_control_url: access_control.uri(),
                plans_url: plans.uri(),
            },
            service_name: "access-bridge-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
            identity,
            plans,
            access_control,
            stripe,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Identity resolves `TEST_TOKEN` to the test viewer.
    pub async fn mock_identity_viewer(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/sites/{}/account", TEST_SITE_ID)))
            .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": TEST_VIEWER_ID,
                "email": TEST_VIEWER_EMAIL,
            })))
            .mount(&self.identity)
            .await;
    }

    /// Identity rejects every token with the provider's envelope.
    pub async fn mock_identity_rejects(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/sites/{}/account", TEST_SITE_ID)))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errors": [{
                    "code": "unauthorized",
                    "description": "Invalid or expired session token.",
                }],
            })))
            .mount(&self.identity)
            .await;
    }

    /// Entitlements for the site answer with the given plans payload.
    pub async fn mock_entitled_plans(&self, plans: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v3/sites/{}/entitlements", TEST_SITE_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plans": plans })))
            .mount(&self.plans)
            .await;
    }

    /// The gateway mints a fixed token pair for generate calls.
    pub async fn mock_generate_passport(&self, passport: &str, refresh_token: &str) {
        Mock::given(method("PUT"))
            .and(path(format!("/v2/sites/{}/access/generate", TEST_SITE_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "passport": passport,
                "refresh_token": refresh_token,
            })))
            .mount(&self.access_control)
            .await;
    }
}
