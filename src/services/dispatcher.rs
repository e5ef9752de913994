use std::time::Duration;

use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::db::models::WebhookSubscription;
use crate::db::queries;

pub const EVENT_TRANSACTION_COMPLETED: &str = "transaction.completed";
pub const EVENT_TRANSACTION_UPDATED: &str = "transaction.updated";
pub const KNOWN_EVENTS: &[&str] = &[EVENT_TRANSACTION_COMPLETED, EVENT_TRANSACTION_UPDATED];

/// Fans events out to subscriber endpoints. Deliveries are best-effort:
/// each one runs as a detached task with a bounded timeout, a failed
/// delivery is logged and never retried, and the triggering request does
/// not wait for any of them.
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    pool: PgPool,
}

impl WebhookDispatcher {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client, pool }
    }

    /// Loads the user's active subscriptions matching `event` and spawns one
    /// delivery task per subscription.
    pub async fn notify(&self, user_id: Uuid, event: &str, data: serde_json::Value) {
        let subscriptions = match queries::active_subscriptions(&self.pool, user_id, event).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!("Failed to load webhook subscriptions for {}: {}", user_id, e);
                return;
            }
        };

        for subscription in subscriptions {
            let dispatcher = self.clone();
            let event = event.to_string();
            let data = data.clone();

            tokio::spawn(async move {
                match dispatcher.deliver(&subscription, &event, &data).await {
                    Ok(status) if status.is_success() => {
                        debug!(
                            subscription_id = %subscription.id,
                            event = %event,
                            "Webhook delivered"
                        );
                    }
                    Ok(status) => {
                        warn!(
                            subscription_id = %subscription.id,
                            event = %event,
                            status = %status.as_u16(),
                            "Webhook delivery rejected by subscriber"
                        );
                    }
                    Err(e) => {
                        warn!(
                            subscription_id = %subscription.id,
                            event = %event,
                            "Webhook delivery failed: {}", e
                        );
                    }
                }
            });
        }
    }

    /// Single delivery attempt. The subscription secret travels in the
    /// `X-Webhook-Secret` header so the subscriber can authenticate the call.
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        event: &str,
        data: &serde_json::Value,
    ) -> Result<reqwest::StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(&subscription.url)
            .header("X-Webhook-Secret", subscription.secret.as_str())
            .json(&json!({ "event": event, "data": data }))
            .send()
            .await?;

        Ok(response.status())
    }
}
