use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::error;
use url::Url;

use crate::domain::{
    repositories::payment_gateway::{GatewayError, GatewayResult, PaymentGateway},
    value_objects::payments::PaymentDetails,
};

/// Status assumed when the provider omits one.
const DEFAULT_PROVIDER_STATUS: &str = "pending";

/// Client for the payment provider's REST API built on reqwest.
pub struct PaymentApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    amount: i64,
    currency: &'a str,
    metadata: PaymentMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct PaymentMetadata<'a> {
    telegram_user_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderPaymentId {
    Text(String),
    Number(serde_json::Number),
}

impl ProviderPaymentId {
    fn into_reference(self) -> String {
        match self {
            ProviderPaymentId::Text(value) => value,
            ProviderPaymentId::Number(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    payment_id: ProviderPaymentId,
    status: Option<String>,
    payment_url: Option<String>,
    requisites: Option<String>,
}

impl From<PaymentResponse> for PaymentDetails {
    fn from(resp: PaymentResponse) -> Self {
        PaymentDetails {
            payment_reference: resp.payment_id.into_reference(),
            status: resp
                .status
                .unwrap_or_else(|| DEFAULT_PROVIDER_STATUS.to_string()),
            payment_url: resp.payment_url,
            instructions: resp.requisites,
        }
    }
}

fn unavailable(context: &str, err: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable {
        context: context.to_string(),
        message: err.to_string(),
    }
}

impl PaymentApiClient {
    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            bail!("payment API base URL {base_url} cannot carry a path");
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Unavailable {
                context: "build endpoint".to_string(),
                message: format!("{} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> GatewayResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "payment api request failed"
        );

        Err(GatewayError::Status {
            status: status.as_u16(),
            context: context.to_string(),
        })
    }

    async fn read_payment(
        resp: reqwest::Response,
        context: &str,
    ) -> GatewayResult<PaymentDetails> {
        let resp = Self::ensure_success(resp, context).await?;
        let parsed: PaymentResponse =
            resp.json().await.map_err(|err| GatewayError::InvalidResponse {
                context: context.to_string(),
                message: err.to_string(),
            })?;

        Ok(parsed.into())
    }

    /// Creates a payment for `amount` minor units, tagged with the buyer's chat user id.
    pub async fn create_payment(
        &self,
        amount: i64,
        currency: &str,
        telegram_user_id: &str,
    ) -> GatewayResult<PaymentDetails> {
        const CONTEXT: &str = "create payment";

        let body = CreatePaymentRequest {
            amount,
            currency,
            metadata: PaymentMetadata { telegram_user_id },
        };

        let resp = self
            .http
            .post(self.endpoint(&["payments"])?)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| unavailable(CONTEXT, err))?;

        Self::read_payment(resp, CONTEXT).await
    }

    pub async fn get_payment(&self, payment_id: &str) -> GatewayResult<PaymentDetails> {
        const CONTEXT: &str = "get payment";

        let resp = self
            .http
            .get(self.endpoint(&["payments", payment_id])?)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|err| unavailable(CONTEXT, err))?;

        Self::read_payment(resp, CONTEXT).await
    }
}

#[async_trait]
impl PaymentGateway for PaymentApiClient {
    async fn create_payment(
        &self,
        amount: i64,
        currency: &str,
        correlation_id: &str,
    ) -> GatewayResult<PaymentDetails> {
        self.create_payment(amount, currency, correlation_id).await
    }

    async fn get_payment(&self, payment_reference: &str) -> GatewayResult<PaymentDetails> {
        self.get_payment(payment_reference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    async fn spawn_provider(router: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/api/")).unwrap()
    }

    fn client(base_url: Url) -> PaymentApiClient {
        PaymentApiClient::new(base_url, "key".to_string(), Duration::from_secs(5)).unwrap()
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some("Bearer key")
    }

    #[tokio::test]
    async fn create_payment_parses_response() {
        let router = Router::new().route(
            "/api/payments",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let expected = json!({
                    "amount": 500,
                    "currency": "RUB",
                    "metadata": { "telegram_user_id": "123" },
                });
                if !authorized(&headers) || body != expected {
                    return StatusCode::BAD_REQUEST.into_response();
                }
                Json(json!({
                    "payment_id": "pay_1",
                    "status": "pending",
                    "payment_url": "https://pay/1",
                    "requisites": "card 1111",
                }))
                .into_response()
            }),
        );
        let client = client(spawn_provider(router).await);

        let payment = client.create_payment(500, "RUB", "123").await.unwrap();

        assert_eq!(payment.payment_reference, "pay_1");
        assert_eq!(payment.status, "pending");
        assert_eq!(payment.payment_url.as_deref(), Some("https://pay/1"));
        assert_eq!(payment.instructions.as_deref(), Some("card 1111"));
    }

    #[tokio::test]
    async fn get_payment_accepts_numeric_id_and_missing_status() {
        let router = Router::new().route(
            "/api/payments/:payment_id",
            get(|Path(payment_id): Path<String>, headers: HeaderMap| async move {
                if !authorized(&headers) || payment_id != "77" {
                    return StatusCode::NOT_FOUND.into_response();
                }
                Json(json!({ "payment_id": 77 })).into_response()
            }),
        );
        let client = client(spawn_provider(router).await);

        let payment = client.get_payment("77").await.unwrap();

        assert_eq!(payment.payment_reference, "77");
        assert_eq!(payment.status, "pending");
        assert_eq!(payment.payment_url, None);
        assert_eq!(payment.instructions, None);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new().route(
            "/api/payments/:payment_id",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let client = client(spawn_provider(router).await);

        let err = client.get_payment("pay_1").await.unwrap_err();

        assert!(matches!(err, GatewayError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let router = Router::new().route(
            "/api/payments",
            post(|| async { Json(json!({ "status": "pending" })) }),
        );
        let client = client(spawn_provider(router).await);

        let err = client.create_payment(500, "RUB", "1").await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn unreachable_provider_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client(Url::parse(&format!("http://{addr}")).unwrap());

        let err = client.get_payment("pay_1").await.unwrap_err();

        assert!(matches!(err, GatewayError::Unavailable { .. }));
    }
}
