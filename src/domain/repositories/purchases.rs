use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::domain::entities::purchases::PurchaseEntity;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("payment reference {0} is already recorded")]
    DuplicatePaymentReference(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable bookkeeping of purchases. Implementations are the only writers of purchase
/// rows and the only authority on ticket numbers.
#[automock]
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn create_purchase(
        &self,
        buyer_id: i64,
        buyer_name: &str,
        payment_reference: &str,
        amount: i64,
    ) -> StoreResult<()>;

    async fn find_latest_purchase_for_buyer(
        &self,
        buyer_id: i64,
    ) -> StoreResult<Option<PurchaseEntity>>;

    async fn find_purchase_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> StoreResult<Option<PurchaseEntity>>;

    /// Marks the purchase paid and hands out the next ticket number. Returns `None` for an
    /// unknown reference and the existing ticket for an already confirmed purchase.
    async fn confirm_payment_and_assign_ticket(
        &self,
        payment_reference: &str,
    ) -> StoreResult<Option<i64>>;
}
