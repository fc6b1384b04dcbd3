use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::credentials::GatewayCredentials;
use crate::utils::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { message, .. } => AppError::GatewayError(message),
            GatewayError::Transport(e) => AppError::GatewayError(format!(
                "Payment gateway is unavailable: {e}"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateGatewayOrder {
    /// Integer minor units (paise, cents).
    pub amount: i64,
    pub currency: String,
    /// Our reference, the checkout id.
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Server-side half of the gateway handshake: the order is created here, the
/// buyer pays in the gateway's widget, and the widget's `orderId|paymentId`
/// signature comes back for verification.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        request: &CreateGatewayOrder,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Deserialize)]
struct RazorpayErrorDetail {
    description: String,
}

pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
}

impl RazorpayGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        credentials: &GatewayCredentials,
        request: &CreateGatewayOrder,
    ) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RazorpayErrorBody>(&body)
                .map(|b| b.error.description)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), message = %message, "Gateway order creation failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}

/// In-process gateway that accepts every order; used by tests and local runs
/// without gateway credentials.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    declining: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent orders fail the way a gateway rejection would.
    pub fn decline_orders(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        _credentials: &GatewayCredentials,
        request: &CreateGatewayOrder,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.declining.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "Order creation declined".to_string(),
            });
        }

        let order = GatewayOrder {
            id: format!("order_mock_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency.clone(),
        };
        tracing::info!(gateway_order_id = %order.id, amount = order.amount, "Mock gateway order created");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> GatewayCredentials {
        GatewayCredentials {
            key_id: "rzp_test_key".to_string(),
            key_secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_gateway_echoes_amount() {
        let gateway = MockPaymentGateway::new();
        let request = CreateGatewayOrder {
            amount: 10815,
            currency: "INR".to_string(),
            receipt: Uuid::new_v4().to_string(),
        };

        let order = gateway.create_order(&credentials(), &request).await.unwrap();
        assert!(order.id.starts_with("order_mock_"));
        assert_eq!(order.amount, 10815);
        assert_eq!(order.currency, "INR");
    }

    #[tokio::test]
    async fn test_declined_order_maps_to_422() {
        let gateway = MockPaymentGateway::new();
        gateway.decline_orders(true);
        let request = CreateGatewayOrder {
            amount: 100,
            currency: "INR".to_string(),
            receipt: "r".to_string(),
        };

        let err: AppError = gateway
            .create_order(&credentials(), &request)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_razorpay_base_url_is_normalized() {
        let gateway = RazorpayGateway::new("https://api.razorpay.com/v1/").unwrap();
        assert_eq!(gateway.base_url, "https://api.razorpay.com/v1");
    }
}
