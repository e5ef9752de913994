use axum::{extract::State, response::IntoResponse, Json};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthedUser;
use crate::validation::validate_positive_amount;
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct WalletResponse {
    pub user_id: Uuid,
    #[schema(value_type = String, example = "15000.00")]
    pub balance: BigDecimal,
}

#[derive(Deserialize, ToSchema)]
pub struct FundRequest {
    #[schema(value_type = String, example = "5000.00")]
    pub amount: BigDecimal,
}

#[utoipa::path(
    get,
    path = "/wallet",
    responses(
        (status = 200, description = "Current wallet balance", body = WalletResponse),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "Wallet"
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
) -> Result<impl IntoResponse, AppError> {
    let wallet = state.wallet.balance(user_id).await?;

    Ok(Json(WalletResponse {
        user_id: wallet.user_id,
        balance: wallet.balance,
    }))
}

#[utoipa::path(
    post,
    path = "/wallet/fund",
    request_body = FundRequest,
    responses(
        (status = 200, description = "Wallet credited", body = WalletResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "Wallet"
)]
pub async fn fund_wallet(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Json(payload): Json<FundRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_positive_amount(&payload.amount)?;

    let wallet = state.wallet.credit(user_id, &payload.amount).await?;
    tracing::info!(user_id = %user_id, amount = %payload.amount, "Wallet funded");

    Ok(Json(WalletResponse {
        user_id: wallet.user_id,
        balance: wallet.balance,
    }))
}
