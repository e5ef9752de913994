use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::models::{Transaction, TransactionDetails};
use crate::db::queries;
use crate::domain::{generate_reference, TransactionStatus, TransactionType};
use crate::error::AppError;
use crate::provider::{FulfillmentOutcome, FulfillmentProvider};
use crate::services::dispatcher::{WebhookDispatcher, EVENT_TRANSACTION_COMPLETED};
use crate::services::wallet::WalletLedger;

/// Outcome of a submitted purchase: the finalized record plus the provider's
/// message for the response envelope.
#[derive(Debug)]
pub struct SubmittedPurchase {
    pub transaction: Transaction,
    pub message: String,
}

/// Drives a purchase end to end: deduct, record, fulfill, finalize, refund
/// on failure, notify. The refund is gated on the processing→failed status
/// transition and commits atomically with it, so a transaction is refunded
/// at most once over its lifetime no matter how many failure reports arrive.
#[derive(Clone)]
pub struct TransactionRecorder {
    pool: PgPool,
    wallet: WalletLedger,
    provider: Arc<dyn FulfillmentProvider>,
    dispatcher: WebhookDispatcher,
    fulfillment_timeout: Duration,
}

impl TransactionRecorder {
    pub fn new(
        pool: PgPool,
        wallet: WalletLedger,
        provider: Arc<dyn FulfillmentProvider>,
        dispatcher: WebhookDispatcher,
        fulfillment_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            wallet,
            provider,
            dispatcher,
            fulfillment_timeout,
        }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        tx_type: TransactionType,
        amount: BigDecimal,
        details: TransactionDetails,
    ) -> Result<SubmittedPurchase, AppError> {
        let reference = generate_reference(tx_type);

        // Authoritative deduction. Insufficient funds abort the whole
        // operation before anything is written.
        self.wallet.deduct(user_id, &amount).await?;

        let tx = Transaction::new(user_id, tx_type, amount.clone(), reference.clone(), details);
        let inserted = match queries::insert_transaction(&self.pool, &tx).await {
            Ok(inserted) => inserted,
            Err(e) => {
                error!(reference = %reference, "Transaction creation error: {}", e);
                // The deduction already committed; reverse it before failing.
                self.wallet.credit(user_id, &amount).await?;
                return Err(AppError::RecordingFailed(
                    "Failed to create transaction".to_string(),
                ));
            }
        };

        info!(
            reference = %reference,
            user_id = %user_id,
            tx_type = %tx_type,
            amount = %amount,
            "Processing purchase"
        );

        let outcome = match tokio::time::timeout(
            self.fulfillment_timeout,
            self.provider.fulfill(&inserted),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => FulfillmentOutcome::timed_out(),
        };

        let final_status = if outcome.success {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let patch = json!({
            "provider_response": outcome.raw,
            "completed_time": Utc::now().to_rfc3339(),
        });

        let mut dbtx = self.pool.begin().await?;
        let finalized =
            queries::finalize_transaction(&mut dbtx, inserted.id, final_status.as_str(), patch)
                .await?;
        if finalized.is_some() && !outcome.success {
            queries::credit_balance_tx(&mut dbtx, user_id, &amount).await?;
            info!(reference = %reference, "Wallet refunded for failed fulfillment");
        }
        dbtx.commit().await?;

        // The gate only comes back empty if a webhook finalized (and, where
        // applicable, refunded) this row first; report whatever won.
        let final_tx = match finalized {
            Some(tx) => tx,
            None => queries::get_transaction(&self.pool, inserted.id)
                .await?
                .unwrap_or(inserted),
        };

        match serde_json::to_value(&final_tx) {
            Ok(data) => {
                self.dispatcher
                    .notify(user_id, EVENT_TRANSACTION_COMPLETED, data)
                    .await;
            }
            Err(e) => error!(reference = %reference, "Failed to encode webhook payload: {}", e),
        }

        info!(
            reference = %reference,
            status = %final_tx.status,
            "Purchase finished"
        );

        Ok(SubmittedPurchase {
            transaction: final_tx,
            message: outcome.message,
        })
    }
}
