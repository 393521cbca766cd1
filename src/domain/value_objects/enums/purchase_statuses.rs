use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Paid,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Paid => "paid",
        }
    }

    /// Parses a stored status. Unknown values yield `None` so new statuses can be
    /// introduced without being mistaken for `paid`.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PurchaseStatus::Pending),
            "paid" => Some(PurchaseStatus::Paid),
            _ => None,
        }
    }
}

impl Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_statuses() {
        assert_eq!(PurchaseStatus::from_str("pending"), Some(PurchaseStatus::Pending));
        assert_eq!(PurchaseStatus::from_str("paid"), Some(PurchaseStatus::Paid));
        assert_eq!(PurchaseStatus::from_str("PAID"), None);
        assert_eq!(PurchaseStatus::from_str("refunded"), None);
    }

    #[test]
    fn displays_storage_form() {
        assert_eq!(PurchaseStatus::Paid.to_string(), "paid");
        assert_eq!(PurchaseStatus::default().to_string(), "pending");
    }
}
