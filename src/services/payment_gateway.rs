use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::{PaymentProvider, Settings};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub(crate) enum GatewayError {
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
    #[error("payment gateway rejected the order with status {status}")]
    Rejected { status: u16 },
    #[error("payment gateway returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateOrderRequest {
    /// Amount in the currency's minor unit (paise for INR).
    pub(crate) amount: i64,
    pub(crate) currency: String,
    pub(crate) receipt: String,
    pub(crate) notes: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub(crate) struct GatewayOrder {
    pub(crate) id: String,
    pub(crate) amount: i64,
    pub(crate) currency: String,
}

#[async_trait]
pub(crate) trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Public key handed to the browser checkout widget.
    fn key_id(&self) -> &str;
}

pub(crate) type SharedGateway = Arc<dyn PaymentGateway>;

pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<SharedGateway> {
    let payment = settings.payment();
    match payment.provider {
        PaymentProvider::Razorpay => Ok(Arc::new(RazorpayGateway::new(
            payment.base_url.clone(),
            payment.key_id.clone(),
            payment.key_secret.clone(),
            Duration::from_secs(payment.request_timeout_seconds),
        )?)),
        PaymentProvider::Sandbox => {
            tracing::warn!("Using sandbox payment gateway; orders are not charged");
            Ok(Arc::new(SandboxGateway::new(payment.key_id.clone())))
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub(crate) fn new(
        base_url: String,
        key_id: String,
        key_secret: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("Failed to build payment HTTP client: {err}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::Unavailable(format!("status {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Payment gateway rejected order");
            return Err(GatewayError::Rejected { status: status.as_u16() });
        }

        let order = response
            .json::<GatewayOrder>()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

        if order.amount != request.amount {
            return Err(GatewayError::InvalidResponse(format!(
                "amount mismatch: requested {}, got {}",
                request.amount, order.amount
            )));
        }

        Ok(order)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Issues local order ids without contacting a gateway. Callbacks are still
/// verified with the configured signing secret.
#[derive(Debug, Clone)]
pub(crate) struct SandboxGateway {
    key_id: String,
}

impl SandboxGateway {
    pub(crate) fn new(key_id: String) -> Self {
        let key_id = if key_id.is_empty() { "sandbox".to_string() } else { key_id };
        Self { key_id }
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Hex HMAC-SHA256 of `order_id|payment_id`, the format the gateway signs callbacks with.
pub(crate) fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub(crate) fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let expected = sign_payment(secret, order_id, payment_id);
    if expected.is_empty() {
        return false;
    }
    let provided = signature.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
