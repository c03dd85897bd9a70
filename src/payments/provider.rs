use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::config::PaymentConfig;

const STRIPE_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";

/// Opaque handle the client-side payment flow completes against.
#[derive(Debug, Clone)]
pub struct PaymentHandle {
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(
        &self,
        amount_cents: i64,
        description: &str,
        certificate_id: i64,
    ) -> anyhow::Result<PaymentHandle>;
}

pub struct StripeProvider {
    client: reqwest::Client,
    secret_key: String,
    currency: String,
}

#[derive(Deserialize)]
struct IntentResponse {
    client_secret: String,
}

impl StripeProvider {
    pub fn new(secret_key: String, currency: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            currency,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_intent(
        &self,
        amount_cents: i64,
        description: &str,
        certificate_id: i64,
    ) -> anyhow::Result<PaymentHandle> {
        let amount = amount_cents.to_string();
        let cert = certificate_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.currency.as_str()),
            ("description", description),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[certificateId]", cert.as_str()),
        ];
        let intent: IntentResponse = self
            .client
            .post(STRIPE_INTENTS_URL)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&form)
            .send()
            .await
            .context("stripe create payment intent")?
            .error_for_status()
            .context("stripe rejected payment intent")?
            .json()
            .await
            .context("decode stripe payment intent")?;
        info!(certificate_id, amount_cents, "payment intent created");
        Ok(PaymentHandle {
            client_secret: intent.client_secret,
        })
    }
}

/// Used when no provider key is configured; every attempt fails loudly.
pub struct DisabledProvider;

#[async_trait]
impl PaymentProvider for DisabledProvider {
    async fn create_intent(
        &self,
        _amount_cents: i64,
        _description: &str,
        _certificate_id: i64,
    ) -> anyhow::Result<PaymentHandle> {
        anyhow::bail!("payment provider is not configured")
    }
}

pub fn from_config(cfg: &PaymentConfig) -> Arc<dyn PaymentProvider> {
    match &cfg.stripe_secret_key {
        Some(key) => Arc::new(StripeProvider::new(key.clone(), cfg.currency.clone())),
        None => Arc::new(DisabledProvider),
    }
}
