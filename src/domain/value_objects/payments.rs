use serde::{Deserialize, Serialize};

/// Provider status that marks a payment as settled. Compared case-insensitively.
pub const PAID_PROVIDER_STATUS: &str = "paid";

/// Normalized view of a payment as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_reference: String,
    pub status: String,
    pub payment_url: Option<String>,
    pub instructions: Option<String>,
}

impl PaymentDetails {
    pub fn is_paid(&self) -> bool {
        self.status.eq_ignore_ascii_case(PAID_PROVIDER_STATUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(status: &str) -> PaymentDetails {
        PaymentDetails {
            payment_reference: "pay_1".to_string(),
            status: status.to_string(),
            payment_url: None,
            instructions: None,
        }
    }

    #[test]
    fn paid_status_is_case_insensitive() {
        assert!(details("paid").is_paid());
        assert!(details("PAID").is_paid());
        assert!(details("Paid").is_paid());
    }

    #[test]
    fn other_statuses_are_not_paid() {
        assert!(!details("pending").is_paid());
        assert!(!details("paid_partially").is_paid());
        assert!(!details("").is_paid());
    }
}
