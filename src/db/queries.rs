use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::models::{Transaction, Wallet, WebhookSubscription};

// --- Wallet Queries ---

/// Provisions the wallet row on first access, then reads it. The insert is a
/// no-op for existing wallets, so concurrent callers are safe.
pub async fn ensure_wallet(
    pool: &PgPool,
    user_id: Uuid,
    starting_balance: &BigDecimal,
) -> Result<Wallet> {
    sqlx::query(
        "INSERT INTO wallets (user_id, balance) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(starting_balance)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Deducts `amount` as a single conditional update. Returns `None` without
/// mutating anything when the balance cannot cover the amount; two
/// concurrent deductions against a thin balance cannot both succeed.
pub async fn deduct_balance(
    pool: &PgPool,
    user_id: Uuid,
    amount: &BigDecimal,
) -> Result<Option<Wallet>> {
    sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET balance = balance - $2, updated_at = NOW()
        WHERE user_id = $1 AND balance >= $2
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(pool)
    .await
}

/// Credits `amount`, creating the wallet row if it does not exist yet.
/// Unconditional; used for funding and refunds.
pub async fn credit_balance(pool: &PgPool, user_id: Uuid, amount: &BigDecimal) -> Result<Wallet> {
    sqlx::query_as::<_, Wallet>(
        r#"
        INSERT INTO wallets (user_id, balance) VALUES ($1, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET balance = wallets.balance + EXCLUDED.balance, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(pool)
    .await
}

/// Same credit statement, but running inside an open database transaction so
/// a refund commits atomically with the status transition that gates it.
pub async fn credit_balance_tx(
    executor: &mut SqlxTransaction<'_, Postgres>,
    user_id: Uuid,
    amount: &BigDecimal,
) -> Result<Wallet> {
    sqlx::query_as::<_, Wallet>(
        r#"
        INSERT INTO wallets (user_id, balance) VALUES ($1, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET balance = wallets.balance + EXCLUDED.balance, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut **executor)
    .await
}

// --- Transaction Queries ---

pub async fn insert_transaction(pool: &PgPool, tx: &Transaction) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, user_id, type, status, amount, reference,
            phone_number, network, plan_name, plan_type, provider,
            smartcard_number, exam_type, bank_name, bank_account,
            metadata, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(tx.user_id)
    .bind(&tx.tx_type)
    .bind(&tx.status)
    .bind(&tx.amount)
    .bind(&tx.reference)
    .bind(&tx.phone_number)
    .bind(&tx.network)
    .bind(&tx.plan_name)
    .bind(&tx.plan_type)
    .bind(&tx.provider)
    .bind(&tx.smartcard_number)
    .bind(&tx.exam_type)
    .bind(&tx.bank_name)
    .bind(&tx.bank_account)
    .bind(&tx.metadata)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_transaction(pool: &PgPool, id: Uuid) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_transaction_for_user(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_transactions_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Moves a transaction out of `processing`, merging `patch` into its
/// metadata. The status gate makes finalization first-writer-wins: a row
/// already finalized by the webhook path comes back as `None`, and the
/// caller must not refund.
pub async fn finalize_transaction(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    status: &str,
    patch: serde_json::Value,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = $2, metadata = metadata || $3, updated_at = NOW()
        WHERE id = $1 AND status = 'processing'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(patch)
    .fetch_optional(&mut **executor)
    .await
}

/// Row-locks a transaction by its reference for the duration of the open
/// database transaction, so the webhook path and the synchronous
/// finalization path cannot interleave on the same row.
pub async fn lock_transaction_by_reference(
    executor: &mut SqlxTransaction<'_, Postgres>,
    reference: &str,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE reference = $1 FOR UPDATE")
        .bind(reference)
        .fetch_optional(&mut **executor)
        .await
}

/// Applies a webhook-reported update: the status written here has already
/// been resolved against the gate by the caller (terminal rows keep their
/// status, metadata is appended regardless).
pub async fn apply_webhook_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    status: &str,
    patch: serde_json::Value,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = $2, metadata = metadata || $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(patch)
    .fetch_one(&mut **executor)
    .await
}

// --- Webhook Subscription Queries ---

pub async fn active_subscriptions(
    pool: &PgPool,
    user_id: Uuid,
    event: &str,
) -> Result<Vec<WebhookSubscription>> {
    sqlx::query_as::<_, WebhookSubscription>(
        r#"
        SELECT * FROM webhook_subscriptions
        WHERE user_id = $1 AND is_active AND $2 = ANY(events)
        "#,
    )
    .bind(user_id)
    .bind(event)
    .fetch_all(pool)
    .await
}

pub async fn insert_subscription(
    pool: &PgPool,
    subscription: &WebhookSubscription,
) -> Result<WebhookSubscription> {
    sqlx::query_as::<_, WebhookSubscription>(
        r#"
        INSERT INTO webhook_subscriptions (id, user_id, url, secret, events, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(subscription.id)
    .bind(subscription.user_id)
    .bind(&subscription.url)
    .bind(&subscription.secret)
    .bind(&subscription.events)
    .bind(subscription.is_active)
    .bind(subscription.created_at)
    .fetch_one(pool)
    .await
}

pub async fn list_subscriptions(pool: &PgPool, user_id: Uuid) -> Result<Vec<WebhookSubscription>> {
    sqlx::query_as::<_, WebhookSubscription>(
        "SELECT * FROM webhook_subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

// --- API Key Queries ---

pub async fn resolve_api_key(pool: &PgPool, key: &str) -> Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM api_keys WHERE key = $1 AND is_active",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
}
