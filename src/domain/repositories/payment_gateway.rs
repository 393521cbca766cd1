use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::domain::value_objects::payments::PaymentDetails;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider unreachable during {context}: {message}")]
    Unavailable { context: String, message: String },
    #[error("payment provider answered {status} during {context}")]
    Status { status: u16, context: String },
    #[error("payment provider sent an unreadable response during {context}: {message}")]
    InvalidResponse { context: String, message: String },
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `correlation_id` is attached to the payment as metadata so the provider side can be
    /// traced back to the buyer.
    async fn create_payment(
        &self,
        amount: i64,
        currency: &str,
        correlation_id: &str,
    ) -> GatewayResult<PaymentDetails>;

    async fn get_payment(&self, payment_reference: &str) -> GatewayResult<PaymentDetails>;
}
