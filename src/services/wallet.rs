use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Wallet;
use crate::db::queries;
use crate::error::AppError;

/// Authoritative per-user balance. One row per user, provisioned with the
/// configured starting balance on first access. Both mutators are single
/// SQL statements, so they stay correct under concurrent requests for the
/// same user.
#[derive(Clone)]
pub struct WalletLedger {
    pool: PgPool,
    starting_balance: BigDecimal,
}

impl WalletLedger {
    pub fn new(pool: PgPool, starting_balance: BigDecimal) -> Self {
        Self {
            pool,
            starting_balance,
        }
    }

    /// Reads the wallet, creating it with the starting balance if this is
    /// the user's first access.
    pub async fn balance(&self, user_id: Uuid) -> Result<Wallet, AppError> {
        let wallet = queries::ensure_wallet(&self.pool, user_id, &self.starting_balance).await?;
        Ok(wallet)
    }

    /// Deducts `amount` if the balance covers it. The check and the write
    /// are one conditional update; a shortfall leaves the balance untouched.
    pub async fn deduct(&self, user_id: Uuid, amount: &BigDecimal) -> Result<Wallet, AppError> {
        queries::ensure_wallet(&self.pool, user_id, &self.starting_balance).await?;

        match queries::deduct_balance(&self.pool, user_id, amount).await? {
            Some(wallet) => Ok(wallet),
            None => Err(AppError::InsufficientBalance),
        }
    }

    /// Credits `amount`. Used for user funding and for refunds; always
    /// succeeds.
    pub async fn credit(&self, user_id: Uuid, amount: &BigDecimal) -> Result<Wallet, AppError> {
        let wallet = queries::credit_balance(&self.pool, user_id, amount).await?;
        Ok(wallet)
    }
}
