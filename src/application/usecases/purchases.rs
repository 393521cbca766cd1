use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    repositories::{
        payment_gateway::PaymentGateway,
        purchases::{PurchaseRepository, StoreError},
    },
    value_objects::purchases::{
        CheckPurchaseOutcome, CreatedPayment, InitiatePurchaseOutcome, TicketPrice,
        UNKNOWN_BUYER_NAME,
    },
};

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("payment reference {0} is already recorded")]
    DuplicatePaymentReference(String),
    #[error(transparent)]
    Storage(anyhow::Error),
}

impl From<StoreError> for PurchaseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePaymentReference(reference) => {
                PurchaseError::DuplicatePaymentReference(reference)
            }
            StoreError::Storage(err) => PurchaseError::Storage(err),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PurchaseError>;

/// Drives a ticket purchase from payment creation to ticket assignment. Gateway failures
/// become outcomes the buyer can act on; store failures are returned as errors.
pub struct PurchaseUseCase<R, G>
where
    R: PurchaseRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    purchase_repo: Arc<R>,
    payment_gateway: Arc<G>,
    ticket_price: TicketPrice,
}

impl<R, G> PurchaseUseCase<R, G>
where
    R: PurchaseRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(purchase_repo: Arc<R>, payment_gateway: Arc<G>, ticket_price: TicketPrice) -> Self {
        Self {
            purchase_repo,
            payment_gateway,
            ticket_price,
        }
    }

    pub fn ticket_price(&self) -> &TicketPrice {
        &self.ticket_price
    }

    pub async fn initiate_purchase(
        &self,
        buyer_id: i64,
        buyer_name: Option<String>,
    ) -> UseCaseResult<InitiatePurchaseOutcome> {
        let buyer_name = buyer_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_BUYER_NAME.to_string());

        info!(
            buyer_id,
            amount = self.ticket_price.amount,
            currency = %self.ticket_price.currency,
            "purchases: creating payment"
        );

        let payment = match self
            .payment_gateway
            .create_payment(
                self.ticket_price.amount,
                &self.ticket_price.currency,
                &buyer_id.to_string(),
            )
            .await
        {
            Ok(payment) => payment,
            Err(err) => {
                warn!(buyer_id, error = %err, "purchases: payment creation failed");
                return Ok(InitiatePurchaseOutcome::CreationFailed);
            }
        };

        self.purchase_repo
            .create_purchase(
                buyer_id,
                &buyer_name,
                &payment.payment_reference,
                self.ticket_price.amount,
            )
            .await
            .map_err(|err| {
                error!(
                    buyer_id,
                    payment_reference = %payment.payment_reference,
                    db_error = ?err,
                    "purchases: failed to record pending purchase"
                );
                PurchaseError::from(err)
            })?;

        info!(
            buyer_id,
            payment_reference = %payment.payment_reference,
            "purchases: pending purchase recorded"
        );

        Ok(InitiatePurchaseOutcome::Created(CreatedPayment {
            payment_reference: payment.payment_reference,
            amount: self.ticket_price.amount,
            currency: self.ticket_price.currency.clone(),
            instructions: payment.instructions,
            payment_url: payment.payment_url,
        }))
    }

    pub async fn check_and_confirm_purchase(
        &self,
        buyer_id: i64,
    ) -> UseCaseResult<CheckPurchaseOutcome> {
        let purchase = match self
            .purchase_repo
            .find_latest_purchase_for_buyer(buyer_id)
            .await
            .map_err(|err| {
                error!(
                    buyer_id,
                    db_error = ?err,
                    "purchases: failed to load latest purchase"
                );
                PurchaseError::from(err)
            })? {
            Some(purchase) => purchase,
            None => {
                info!(buyer_id, "purchases: buyer has no purchase yet");
                return Ok(CheckPurchaseOutcome::NoPurchaseYet);
            }
        };

        let payment = match self
            .payment_gateway
            .get_payment(&purchase.payment_reference)
            .await
        {
            Ok(payment) => payment,
            Err(err) => {
                warn!(
                    buyer_id,
                    payment_reference = %purchase.payment_reference,
                    error = %err,
                    "purchases: payment status check failed"
                );
                return Ok(CheckPurchaseOutcome::CheckFailed);
            }
        };

        if !payment.is_paid() {
            info!(
                buyer_id,
                payment_reference = %purchase.payment_reference,
                status = %payment.status,
                "purchases: payment not settled yet"
            );
            return Ok(CheckPurchaseOutcome::NotYetPaid {
                status: payment.status,
            });
        }

        let ticket_number = self
            .purchase_repo
            .confirm_payment_and_assign_ticket(&purchase.payment_reference)
            .await
            .map_err(|err| {
                error!(
                    buyer_id,
                    payment_reference = %purchase.payment_reference,
                    db_error = ?err,
                    "purchases: failed to confirm payment"
                );
                PurchaseError::from(err)
            })?;

        match ticket_number {
            Some(ticket_number) => {
                info!(
                    buyer_id,
                    payment_reference = %purchase.payment_reference,
                    ticket_number,
                    "purchases: payment confirmed"
                );
                Ok(CheckPurchaseOutcome::Confirmed { ticket_number })
            }
            None => {
                warn!(
                    buyer_id,
                    payment_reference = %purchase.payment_reference,
                    "purchases: purchase vanished before confirmation"
                );
                Ok(CheckPurchaseOutcome::NoPurchaseYet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::purchases::PurchaseEntity,
        repositories::{
            payment_gateway::{GatewayError, MockPaymentGateway},
            purchases::MockPurchaseRepository,
        },
        value_objects::payments::PaymentDetails,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn ticket_price() -> TicketPrice {
        TicketPrice {
            amount: 500,
            currency: "RUB".to_string(),
        }
    }

    fn payment(reference: &str, status: &str) -> PaymentDetails {
        PaymentDetails {
            payment_reference: reference.to_string(),
            status: status.to_string(),
            payment_url: Some(format!("https://pay.example.com/{reference}")),
            instructions: Some("card 1111".to_string()),
        }
    }

    fn pending_purchase(buyer_id: i64, reference: &str) -> PurchaseEntity {
        let now = Utc::now().naive_utc();
        PurchaseEntity {
            id: 1,
            buyer_id,
            buyer_name: "user1".to_string(),
            payment_reference: reference.to_string(),
            amount: 500,
            status: "pending".to_string(),
            ticket_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        repo: MockPurchaseRepository,
        gateway: MockPaymentGateway,
    ) -> PurchaseUseCase<MockPurchaseRepository, MockPaymentGateway> {
        PurchaseUseCase::new(Arc::new(repo), Arc::new(gateway), ticket_price())
    }

    #[tokio::test]
    async fn initiate_records_pending_purchase() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_create_payment()
            .with(eq(500_i64), eq("RUB"), eq("42"))
            .times(1)
            .returning(|_, _, _| Ok(payment("pay_1", "pending")));
        repo.expect_create_purchase()
            .with(eq(42_i64), eq("alice"), eq("pay_1"), eq(500_i64))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = usecase(repo, gateway)
            .initiate_purchase(42, Some("alice".to_string()))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            InitiatePurchaseOutcome::Created(CreatedPayment {
                payment_reference: "pay_1".to_string(),
                amount: 500,
                currency: "RUB".to_string(),
                instructions: Some("card 1111".to_string()),
                payment_url: Some("https://pay.example.com/pay_1".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn initiate_uses_placeholder_for_missing_buyer_name() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_create_payment()
            .returning(|_, _, _| Ok(payment("pay_1", "pending")));
        repo.expect_create_purchase()
            .with(eq(42_i64), eq(UNKNOWN_BUYER_NAME), eq("pay_1"), eq(500_i64))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let outcome = usecase(repo, gateway)
            .initiate_purchase(42, None)
            .await
            .unwrap();

        assert!(matches!(outcome, InitiatePurchaseOutcome::Created(_)));
    }

    #[tokio::test]
    async fn initiate_reports_gateway_failure_without_touching_store() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_create_payment().returning(|_, _, _| {
            Err(GatewayError::Unavailable {
                context: "create payment".to_string(),
                message: "connection refused".to_string(),
            })
        });
        repo.expect_create_purchase().never();

        let outcome = usecase(repo, gateway)
            .initiate_purchase(42, Some("alice".to_string()))
            .await
            .unwrap();

        assert_eq!(outcome, InitiatePurchaseOutcome::CreationFailed);
    }

    #[tokio::test]
    async fn initiate_propagates_duplicate_reference() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        gateway
            .expect_create_payment()
            .returning(|_, _, _| Ok(payment("pay_1", "pending")));
        repo.expect_create_purchase().returning(|_, _, reference, _| {
            Err(StoreError::DuplicatePaymentReference(reference.to_string()))
        });

        let err = usecase(repo, gateway)
            .initiate_purchase(42, Some("alice".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PurchaseError::DuplicatePaymentReference(ref reference) if reference == "pay_1"
        ));
    }

    #[tokio::test]
    async fn check_without_purchase_skips_gateway() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .with(eq(42_i64))
            .returning(|_| Ok(None));
        repo.expect_confirm_payment_and_assign_ticket().never();
        gateway.expect_get_payment().never();

        let outcome = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap();

        assert_eq!(outcome, CheckPurchaseOutcome::NoPurchaseYet);
    }

    #[tokio::test]
    async fn check_reports_unsettled_status_verbatim() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .returning(|buyer_id| Ok(Some(pending_purchase(buyer_id, "pay_1"))));
        repo.expect_confirm_payment_and_assign_ticket().never();
        gateway
            .expect_get_payment()
            .with(eq("pay_1"))
            .returning(|reference| Ok(payment(reference, "pending")));

        let outcome = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CheckPurchaseOutcome::NotYetPaid {
                status: "pending".to_string()
            }
        );
    }

    #[tokio::test]
    async fn check_confirms_paid_purchase() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .returning(|buyer_id| Ok(Some(pending_purchase(buyer_id, "pay_7"))));
        gateway
            .expect_get_payment()
            .returning(|reference| Ok(payment(reference, "PAID")));
        repo.expect_confirm_payment_and_assign_ticket()
            .with(eq("pay_7"))
            .times(1)
            .returning(|_| Ok(Some(3)));

        let outcome = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap();

        assert_eq!(outcome, CheckPurchaseOutcome::Confirmed { ticket_number: 3 });
    }

    #[tokio::test]
    async fn check_failure_is_distinct_from_not_paid() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .returning(|buyer_id| Ok(Some(pending_purchase(buyer_id, "pay_1"))));
        repo.expect_confirm_payment_and_assign_ticket().never();
        gateway.expect_get_payment().returning(|_| {
            Err(GatewayError::Status {
                status: 503,
                context: "get payment".to_string(),
            })
        });

        let outcome = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap();

        assert_eq!(outcome, CheckPurchaseOutcome::CheckFailed);
    }

    #[tokio::test]
    async fn check_treats_vanished_purchase_as_missing() {
        let mut repo = MockPurchaseRepository::new();
        let mut gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .returning(|buyer_id| Ok(Some(pending_purchase(buyer_id, "pay_1"))));
        gateway
            .expect_get_payment()
            .returning(|reference| Ok(payment(reference, "paid")));
        repo.expect_confirm_payment_and_assign_ticket()
            .returning(|_| Ok(None));

        let outcome = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap();

        assert_eq!(outcome, CheckPurchaseOutcome::NoPurchaseYet);
    }

    #[tokio::test]
    async fn check_propagates_storage_failure() {
        let mut repo = MockPurchaseRepository::new();
        let gateway = MockPaymentGateway::new();

        repo.expect_find_latest_purchase_for_buyer()
            .returning(|_| Err(StoreError::Storage(anyhow::anyhow!("disk I/O error"))));

        let err = usecase(repo, gateway)
            .check_and_confirm_purchase(42)
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::Storage(_)));
    }
}
