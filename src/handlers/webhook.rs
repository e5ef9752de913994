use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use crate::db::queries;
use crate::domain::TransactionStatus;
use crate::error::AppError;
use crate::services::dispatcher::EVENT_TRANSACTION_UPDATED;
use crate::validation::{validate_enum, ALLOWED_STATUSES};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize, Serialize)]
pub struct ProviderEvent {
    pub event: String,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Inbound status report from the fulfillment provider, keyed by reference.
///
/// Metadata is appended unconditionally, but the status transition and the
/// refund are gated on the row still being `processing`: a transaction that
/// already reached a terminal state keeps it, and a transaction that was
/// already refunded by the synchronous path is never refunded again.
#[utoipa::path(
    post,
    path = "/webhooks/provider",
    responses(
        (status = 200, description = "Webhook processed or event ignored"),
        (status = 400, description = "Unknown reference, bad signature or invalid payload")
    ),
    tag = "Webhooks"
)]
pub async fn provider_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    // Signing is optional on the provider side; when a signature is present
    // it has to check out.
    if let Some(signature) = headers
        .get("x-webhook-signature")
        .and_then(|h| h.to_str().ok())
    {
        if !verify_signature(
            &state.config.provider_webhook_secret,
            body.as_bytes(),
            signature,
        ) {
            return Err(AppError::BadRequest("Invalid webhook signature".to_string()));
        }
    }

    let payload: ProviderEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e)))?;

    tracing::info!(
        event = %payload.event,
        reference = payload.reference.as_deref().unwrap_or("-"),
        "Received provider webhook"
    );

    if payload.event != "transaction.update" {
        return Ok(Json(json!({ "success": true, "message": "Event ignored" })));
    }

    let reference = payload
        .reference
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing reference".to_string()))?;
    let status = payload
        .status
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing status".to_string()))?;
    validate_enum("status", &status, ALLOWED_STATUSES)?;

    let mut dbtx = state.db.begin().await?;

    let tx = match queries::lock_transaction_by_reference(&mut dbtx, &reference).await? {
        Some(tx) => tx,
        None => {
            dbtx.rollback().await?;
            tracing::error!(reference = %reference, "Transaction not found");
            return Err(AppError::TransactionNotFound(reference));
        }
    };

    let current: TransactionStatus = tx.status.parse().map_err(AppError::Internal)?;
    // Terminal states are immutable; late reports only land in metadata.
    let was_processing = !current.is_terminal();
    let next_status = if was_processing {
        status.as_str()
    } else {
        tx.status.as_str()
    };

    let patch = json!({
        "webhook_update": {
            "message": payload.message.clone(),
            "timestamp": Utc::now().to_rfc3339(),
            "raw_payload": payload,
        }
    });
    let updated = queries::apply_webhook_update(&mut dbtx, tx.id, next_status, patch).await?;

    if was_processing && next_status == TransactionStatus::Failed.as_str() {
        queries::credit_balance_tx(&mut dbtx, tx.user_id, &tx.amount).await?;
        tracing::info!(reference = %reference, "Wallet refunded for failed transaction");
    }

    dbtx.commit().await?;

    match serde_json::to_value(&updated) {
        Ok(data) => {
            state
                .dispatcher
                .notify(tx.user_id, EVENT_TRANSACTION_UPDATED, data)
                .await;
        }
        Err(e) => tracing::error!(reference = %reference, "Failed to encode webhook payload: {}", e),
    }

    tracing::info!(reference = %reference, status = %updated.status, "Transaction updated");

    Ok(Json(json!({ "success": true, "message": "Webhook processed" })))
}

fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"event":"transaction.update","reference":"DATA-1-abc"}"#;
        let signature = sign("provider-secret", body);

        assert!(verify_signature("provider-secret", body, &signature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = br#"{"event":"transaction.update"}"#;
        let signature = sign("other-secret", body);

        assert!(!verify_signature("provider-secret", body, &signature));
    }

    #[test]
    fn rejects_modified_payload() {
        let body = br#"{"event":"transaction.update","status":"completed"}"#;
        let tampered = br#"{"event":"transaction.update","status":"failed"}"#;
        let signature = sign("provider-secret", body);

        assert!(!verify_signature("provider-secret", tampered, &signature));
    }

    #[test]
    fn rejects_non_hex_signature() {
        assert!(!verify_signature("provider-secret", b"{}", "not-hex!"));
    }
}
