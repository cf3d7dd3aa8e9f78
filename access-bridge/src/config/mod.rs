use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;

/// Process-wide configuration, loaded once at startup and immutable after.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub signing: SigningConfig,
    pub stripe: StripeConfig,
    pub upstream: UpstreamConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SigningConfig {
    pub secret: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub identity_url: String,
    pub access_control_url: String,
    pub plans_url: String,
}

impl Config {
    /// Read configuration from the environment (and `.env` when present).
    /// Every variable except the Stripe API base is required; a missing one
    /// aborts startup.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = require_var("ACCESS_BRIDGE_HOST")?;
        let port: u16 = require_var("ACCESS_BRIDGE_PORT")?
            .parse()
            .context("ACCESS_BRIDGE_PORT must be a number between 1 and 65535")?;
        if port == 0 {
            bail!("ACCESS_BRIDGE_PORT must be between 1 and 65535");
        }

        let signing_secret = require_var("API_SIGNING_SECRET")?;
        let stripe_secret_key = require_var("STRIPE_SECRET_KEY")?;
        let stripe_api_base_url = env::var("STRIPE_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.stripe.com/v1".to_string());

        let identity_url = require_var("SIMS_API_HOST")?;
        let access_control_url = require_var("ACCESS_CONTROL_API_HOST")?;
        let plans_url = require_var("PLANS_API_HOST")?;

        Ok(Self {
            server: ServerConfig { host, port },
            signing: SigningConfig {
                secret: Secret::new(signing_secret),
            },
            stripe: StripeConfig {
                secret_key: Secret::new(stripe_secret_key),
                api_base_url: stripe_api_base_url,
            },
            upstream: UpstreamConfig {
                identity_url,
                access_control_url,
                plans_url,
            },
            service_name: "access-bridge".to_string(),
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} must be set", name))?;
    if value.is_empty() {
        bail!("{} must not be empty", name);
    }
    Ok(value)
}
