use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::WebhookSubscription;
use crate::db::queries;
use crate::error::AppError;
use crate::middleware::auth::AuthedUser;
use crate::services::dispatcher::KNOWN_EVENTS;
use crate::validation::{validate_enum, validate_webhook_url};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub url: String,
    pub events: Vec<String>,
    pub secret: Option<String>,
}

pub async fn create_subscription(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_webhook_url(&payload.url)?;

    if payload.events.is_empty() {
        return Err(AppError::Validation(
            "events: must contain at least one event".to_string(),
        ));
    }
    for event in &payload.events {
        validate_enum("events", event, KNOWN_EVENTS)?;
    }

    let secret = payload
        .secret
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let subscription =
        WebhookSubscription::new(user_id, payload.url, secret, payload.events);
    let inserted = queries::insert_subscription(&state.db, &subscription).await?;

    Ok((StatusCode::CREATED, Json(inserted)))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<impl IntoResponse, AppError> {
    let subscriptions = queries::list_subscriptions(&state.db, user_id).await?;
    Ok(Json(subscriptions))
}
