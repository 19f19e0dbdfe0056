//! Payment gateway client.
//!
//! Creates payment intents against a Stripe-style HTTP API. The handlers
//! only ever see the resolved intent (id, client secret, amount); gateway
//! failures surface as upstream errors at this boundary.

use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;

/// How long a gateway call may take before it is abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Transport-level failure (connection, timeout, decode).
    #[error("payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("payment gateway error ({status}): {message}")]
    Gateway {
        /// HTTP status returned by the gateway.
        status: u16,
        /// Gateway-provided error body, verbatim.
        message: String,
    },
}

/// A created payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
}

/// Client for the payment gateway API.
#[derive(Clone)]
pub struct PaymentClient {
    http: Client,
    api_base: String,
    config: PaymentConfig,
}

impl PaymentClient {
    /// Create a new payment client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: &PaymentConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            config: config.clone(),
        })
    }

    /// The publishable key clients use to confirm intents in the browser.
    #[must_use]
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    /// Create a payment intent for an amount in the currency's minor unit.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` on transport failure and
    /// `PaymentError::Gateway` when the gateway refuses the intent.
    pub async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&[
                ("amount", amount.to_string()),
                ("currency", self.config.currency.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<PaymentIntent>().await?)
    }
}
