//! Fulfillment provider seam. The shipped implementation is a stub; a real
//! VTU integration plugs in behind the same trait.

use async_trait::async_trait;
use serde_json::json;

use crate::db::models::Transaction;
use crate::domain::TransactionType;

/// Result of a fulfillment attempt, kept raw for the transaction metadata.
#[derive(Debug, Clone)]
pub struct FulfillmentOutcome {
    pub success: bool,
    pub message: String,
    pub raw: serde_json::Value,
}

impl FulfillmentOutcome {
    /// Outcome recorded when the provider did not answer within the
    /// configured deadline. Timeouts count as failures and trigger a refund.
    pub fn timed_out() -> Self {
        Self {
            success: false,
            message: "Fulfillment timed out".to_string(),
            raw: json!({ "success": false, "message": "Fulfillment timed out" }),
        }
    }
}

#[async_trait]
pub trait FulfillmentProvider: Send + Sync {
    async fn fulfill(&self, transaction: &Transaction) -> FulfillmentOutcome;
}

// TODO: Replace with the real VTU provider client once API credentials are
// provisioned.
#[derive(Debug, Clone)]
pub struct StubProvider {
    succeed: bool,
}

impl StubProvider {
    pub fn new() -> Self {
        Self { succeed: true }
    }

    /// Stub that reports every fulfillment as failed. Test-oriented, but kept
    /// here so integration tests and the library share one implementation.
    pub fn failing() -> Self {
        Self { succeed: false }
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FulfillmentProvider for StubProvider {
    async fn fulfill(&self, transaction: &Transaction) -> FulfillmentOutcome {
        let label = transaction
            .tx_type
            .parse::<TransactionType>()
            .map(|t| t.label())
            .unwrap_or("Purchase");

        let message = if self.succeed {
            format!("{} purchase successful", label)
        } else {
            format!("{} purchase failed", label)
        };

        FulfillmentOutcome {
            success: self.succeed,
            message: message.clone(),
            raw: json!({
                "success": self.succeed,
                "reference": transaction.reference,
                "message": message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TransactionDetails;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn sample_transaction() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            TransactionType::Data,
            BigDecimal::from(500),
            "DATA-1-abc".to_string(),
            TransactionDetails::default(),
        )
    }

    #[tokio::test]
    async fn stub_reports_success_with_reference() {
        let outcome = StubProvider::new().fulfill(&sample_transaction()).await;

        assert!(outcome.success);
        assert_eq!(outcome.message, "Data purchase successful");
        assert_eq!(outcome.raw["reference"], "DATA-1-abc");
    }

    #[tokio::test]
    async fn failing_stub_reports_failure() {
        let outcome = StubProvider::failing().fulfill(&sample_transaction()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.raw["success"], false);
    }

    #[test]
    fn timed_out_outcome_is_failure() {
        let outcome = FulfillmentOutcome::timed_out();
        assert!(!outcome.success);
    }
}
