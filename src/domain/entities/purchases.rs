use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::{
    domain::value_objects::enums::purchase_statuses::PurchaseStatus,
    infrastructure::sqlite::schema::purchases,
};

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PurchaseEntity {
    pub id: i32,
    pub buyer_id: i64,
    pub buyer_name: String,
    pub payment_reference: String,
    pub amount: i64,
    pub status: String,
    pub ticket_number: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PurchaseEntity {
    pub fn purchase_status(&self) -> Option<PurchaseStatus> {
        PurchaseStatus::from_str(&self.status)
    }

    /// Ticket already handed out for this purchase, if it has been confirmed.
    pub fn assigned_ticket(&self) -> Option<i64> {
        match self.purchase_status() {
            Some(PurchaseStatus::Paid) => self.ticket_number,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = purchases)]
pub struct InsertPurchaseEntity {
    pub buyer_id: i64,
    pub buyer_name: String,
    pub payment_reference: String,
    pub amount: i64,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
