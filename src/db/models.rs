use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::TransactionType;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Wallet {
    pub user_id: Uuid,
    #[schema(value_type = String, example = "15000.00")]
    pub balance: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional descriptive fields attached to a purchase, varying per product.
#[derive(Debug, Clone, Default)]
pub struct TransactionDetails {
    pub phone_number: Option<String>,
    pub network: Option<String>,
    pub plan_name: Option<String>,
    pub plan_type: Option<String>,
    pub provider: Option<String>,
    pub smartcard_number: Option<String>,
    pub exam_type: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    #[schema(example = "data")]
    pub tx_type: String,
    #[schema(example = "processing")]
    pub status: String,
    #[schema(value_type = String, example = "750.00")]
    pub amount: BigDecimal,
    pub reference: String,
    pub phone_number: Option<String>,
    pub network: Option<String>,
    pub plan_name: Option<String>,
    pub plan_type: Option<String>,
    pub provider: Option<String>,
    pub smartcard_number: Option<String>,
    pub exam_type: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A transaction record is only ever created in `processing` status,
    /// immediately after the wallet deduction succeeded.
    pub fn new(
        user_id: Uuid,
        tx_type: TransactionType,
        amount: BigDecimal,
        reference: String,
        details: TransactionDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            tx_type: tx_type.as_str().to_string(),
            status: "processing".to_string(),
            amount,
            reference,
            phone_number: details.phone_number,
            network: details.network,
            plan_name: details.plan_name,
            plan_type: details.plan_type,
            provider: details.provider,
            smartcard_number: details.smartcard_number,
            exam_type: details.exam_type,
            bank_name: details.bank_name,
            bank_account: details.bank_account,
            metadata: serde_json::json!({ "request_time": now.to_rfc3339() }),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WebhookSubscription {
    pub fn new(user_id: Uuid, url: String, secret: String, events: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            url,
            secret,
            events,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_transaction_starts_processing() {
        let amount = BigDecimal::from_str("750.00").unwrap();
        let details = TransactionDetails {
            phone_number: Some("08031234567".to_string()),
            network: Some("MTN".to_string()),
            plan_name: Some("1GB Daily".to_string()),
            ..Default::default()
        };

        let tx = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Data,
            amount.clone(),
            "DATA-1-abc".to_string(),
            details,
        );

        assert_eq!(tx.status, "processing");
        assert_eq!(tx.tx_type, "data");
        assert_eq!(tx.amount, amount);
        assert!(tx.metadata.get("request_time").is_some());
        assert!(tx.bank_name.is_none());
    }

    #[test]
    fn transaction_serializes_type_field() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Airtime,
            BigDecimal::from(100),
            "AIRTIME-1-abc".to_string(),
            TransactionDetails::default(),
        );

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "airtime");
        assert!(value.get("tx_type").is_none());
    }

    #[test]
    fn new_subscription_is_active() {
        let sub = WebhookSubscription::new(
            Uuid::new_v4(),
            "https://example.com/hook".to_string(),
            "s3cret".to_string(),
            vec!["transaction.completed".to_string()],
        );

        assert!(sub.is_active);
        assert_eq!(sub.events.len(), 1);
    }
}
