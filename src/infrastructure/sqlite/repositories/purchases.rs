use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    OptionalExtension, RunQueryDsl, SqliteConnection,
    dsl::max,
    insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    update,
};
use std::sync::{Arc, Mutex};
use tokio::task;
use tracing::{debug, info};

use crate::{
    domain::{
        entities::purchases::{InsertPurchaseEntity, PurchaseEntity},
        repositories::purchases::{PurchaseRepository, StoreError, StoreResult},
        value_objects::enums::purchase_statuses::PurchaseStatus,
    },
    infrastructure::sqlite::{schema::purchases, sqlite_connection::SqlitePoolSquad},
};

pub struct PurchaseSqlite {
    db_pool: Arc<SqlitePoolSquad>,
    // Serializes ticket allocation inside this process; BEGIN IMMEDIATE covers other
    // processes sharing the same database file.
    allocation_lock: Arc<Mutex<()>>,
}

impl PurchaseSqlite {
    pub fn new(db_pool: Arc<SqlitePoolSquad>) -> Self {
        Self {
            db_pool,
            allocation_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Diesel is synchronous, so every query runs on the blocking thread pool.
    async fn run_blocking<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> StoreResult<T> + Send + 'static,
    {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> StoreResult<T> {
            let mut conn = db_pool.get().map_err(anyhow::Error::from)?;
            work(&mut conn)
        })
        .await
        .map_err(anyhow::Error::from)?
    }
}

fn find_by_reference(
    conn: &mut SqliteConnection,
    payment_reference: &str,
) -> StoreResult<Option<PurchaseEntity>> {
    let purchase = purchases::table
        .filter(purchases::payment_reference.eq(payment_reference))
        .select(PurchaseEntity::as_select())
        .first::<PurchaseEntity>(conn)
        .optional()?;

    Ok(purchase)
}

#[async_trait]
impl PurchaseRepository for PurchaseSqlite {
    async fn create_purchase(
        &self,
        buyer_id: i64,
        buyer_name: &str,
        payment_reference: &str,
        amount: i64,
    ) -> StoreResult<()> {
        let now = Utc::now().naive_utc();
        let insert_entity = InsertPurchaseEntity {
            buyer_id,
            buyer_name: buyer_name.to_string(),
            payment_reference: payment_reference.to_string(),
            amount,
            status: PurchaseStatus::Pending.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.run_blocking(move |conn| {
            let inserted = insert_into(purchases::table)
                .values(&insert_entity)
                .execute(conn);

            match inserted {
                Ok(_) => Ok(()),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
                    StoreError::DuplicatePaymentReference(insert_entity.payment_reference),
                ),
                Err(err) => Err(err.into()),
            }
        })
        .await?;

        debug!(buyer_id, %payment_reference, "purchases_sqlite: pending purchase stored");
        Ok(())
    }

    async fn find_latest_purchase_for_buyer(
        &self,
        buyer_id: i64,
    ) -> StoreResult<Option<PurchaseEntity>> {
        self.run_blocking(move |conn| {
            let purchase = purchases::table
                .filter(purchases::buyer_id.eq(buyer_id))
                .order(purchases::id.desc())
                .select(PurchaseEntity::as_select())
                .first::<PurchaseEntity>(conn)
                .optional()?;

            Ok(purchase)
        })
        .await
    }

    async fn find_purchase_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> StoreResult<Option<PurchaseEntity>> {
        let payment_reference = payment_reference.to_string();

        self.run_blocking(move |conn| find_by_reference(conn, &payment_reference))
            .await
    }

    async fn confirm_payment_and_assign_ticket(
        &self,
        payment_reference: &str,
    ) -> StoreResult<Option<i64>> {
        let allocation_lock = Arc::clone(&self.allocation_lock);
        let reference = payment_reference.to_string();

        let ticket_number = self
            .run_blocking(move |conn| {
                let _allocation = allocation_lock
                    .lock()
                    .map_err(|_| anyhow!("ticket allocation lock is poisoned"))?;

                conn.immediate_transaction::<_, StoreError, _>(|conn| {
                    let Some(purchase) = find_by_reference(conn, &reference)? else {
                        return Ok(None);
                    };

                    if let Some(existing) = purchase.assigned_ticket() {
                        return Ok(Some(existing));
                    }

                    let last_ticket = purchases::table
                        .select(max(purchases::ticket_number))
                        .first::<Option<i64>>(conn)?;
                    let next_ticket = last_ticket.unwrap_or(0) + 1;

                    update(purchases::table.filter(purchases::id.eq(purchase.id)))
                        .set((
                            purchases::status.eq(PurchaseStatus::Paid.to_string()),
                            purchases::ticket_number.eq(Some(next_ticket)),
                            purchases::updated_at.eq(Utc::now().naive_utc()),
                        ))
                        .execute(conn)?;

                    info!(
                        purchase_id = purchase.id,
                        buyer_id = purchase.buyer_id,
                        payment_reference = %reference,
                        ticket_number = next_ticket,
                        "purchases_sqlite: ticket assigned"
                    );

                    Ok(Some(next_ticket))
                })
            })
            .await?;

        Ok(ticket_number)
    }
}
