use serde::{Deserialize, Serialize};

/// Placeholder stored when the buyer has no display name.
pub const UNKNOWN_BUYER_NAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPrice {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
}

/// Payment details shown to the buyer right after a ticket purchase starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPayment {
    pub payment_reference: String,
    pub amount: i64,
    pub currency: String,
    pub instructions: Option<String>,
    pub payment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiatePurchaseOutcome {
    Created(CreatedPayment),
    CreationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckPurchaseOutcome {
    NoPurchaseYet,
    /// Provider status, verbatim, for display.
    NotYetPaid { status: String },
    /// The provider could not be reached; the buyer should retry.
    CheckFailed,
    Confirmed { ticket_number: i64 },
}
