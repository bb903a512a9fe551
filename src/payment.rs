//! Hosted payment-intent boundary.
//!
//! The storefront never handles card data. It asks the processor for an
//! intent covering an amount, hands the opaque client secret to the front
//! end, and later asks the processor whether that intent succeeded.

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment processor request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Payment processor rejected the request: {0}")]
    Rejected(String),
    #[error("Payment did not succeed (status: {0})")]
    NotSucceeded(String),
    #[error("Unknown client secret")]
    UnknownSecret,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug {
    /// Requests an intent for `amount` in minor units of `currency`.
    async fn create_intent(&self, amount: i64, currency: &str)
        -> Result<PaymentIntent, PaymentError>;

    /// Resolves to the intent id once the payment behind `client_secret` has succeeded.
    async fn confirm(&self, client_secret: &str) -> Result<String, PaymentError>;
}

/// Converts a decimal amount to minor units (satang, cents).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Intent ids are the part of the client secret before `_secret_`.
pub fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| id.starts_with("pi_"))
}

/// Stripe PaymentIntents over its REST API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> StripeGateway {
        StripeGateway {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: "https://api.stripe.com/v1".to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = amount.to_string();
        let resp: serde_json::Value = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await?
            .json()
            .await?;

        match (resp["id"].as_str(), resp["client_secret"].as_str()) {
            (Some(id), Some(secret)) => Ok(PaymentIntent {
                id: id.to_string(),
                client_secret: secret.to_string(),
            }),
            _ => Err(PaymentError::Rejected(error_message(&resp))),
        }
    }

    async fn confirm(&self, client_secret: &str) -> Result<String, PaymentError> {
        let id = intent_id_from_secret(client_secret).ok_or(PaymentError::UnknownSecret)?;
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/payment_intents/{}", self.base_url, id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?
            .json()
            .await?;

        if resp["client_secret"].as_str() != Some(client_secret) {
            return Err(PaymentError::UnknownSecret);
        }
        match resp["status"].as_str() {
            Some("succeeded") => Ok(id.to_string()),
            Some(status) => Err(PaymentError::NotSucceeded(status.to_string())),
            None => Err(PaymentError::Rejected(error_message(&resp))),
        }
    }
}

fn error_message(resp: &serde_json::Value) -> String {
    resp["error"]["message"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| resp.to_string())
}

/// In-process gateway for development and tests. Every intent it created
/// confirms as succeeded unless it was built with [`FakeGateway::declining`].
#[derive(Debug, Default)]
pub struct FakeGateway {
    intents: Mutex<HashMap<String, (String, i64)>>,
    decline: bool,
}

impl FakeGateway {
    pub fn new() -> FakeGateway {
        FakeGateway::default()
    }

    pub fn declining() -> FakeGateway {
        FakeGateway {
            decline: true,
            ..FakeGateway::default()
        }
    }

    /// Amount recorded for the intent behind `client_secret`.
    pub fn amount_for(&self, client_secret: &str) -> Option<i64> {
        self.intents
            .lock()
            .ok()?
            .get(client_secret)
            .map(|(_, amount)| *amount)
    }
}

fn random_tail(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(
        &self,
        amount: i64,
        _currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::Rejected("Amount must be positive".into()));
        }
        let id = format!("pi_{}", random_tail(16));
        let client_secret = format!("{}_secret_{}", id, random_tail(16));
        self.intents
            .lock()
            .map_err(|_| PaymentError::Rejected("Gateway unavailable".into()))?
            .insert(client_secret.clone(), (id.clone(), amount));
        Ok(PaymentIntent { id, client_secret })
    }

    async fn confirm(&self, client_secret: &str) -> Result<String, PaymentError> {
        let id = self
            .intents
            .lock()
            .map_err(|_| PaymentError::Rejected("Gateway unavailable".into()))?
            .get(client_secret)
            .map(|(id, _)| id.clone())
            .ok_or(PaymentError::UnknownSecret)?;
        if self.decline {
            return Err(PaymentError::NotSucceeded("requires_payment_method".into()));
        }
        Ok(id)
    }
}
