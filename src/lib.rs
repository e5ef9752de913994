pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod provider;
pub mod services;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::services::dispatcher::WebhookDispatcher;
use crate::services::recorder::TransactionRecorder;
use crate::services::wallet::WalletLedger;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
    pub wallet: WalletLedger,
    pub recorder: TransactionRecorder,
    pub dispatcher: WebhookDispatcher,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::wallet::get_wallet,
        handlers::wallet::fund_wallet,
        handlers::purchase::submit_purchase,
        handlers::transactions::list_transactions,
        handlers::transactions::get_transaction,
        handlers::webhook::provider_callback,
    ),
    components(schemas(
        handlers::HealthStatus,
        handlers::DbPoolStats,
        handlers::wallet::WalletResponse,
        handlers::wallet::FundRequest,
        handlers::purchase::PurchaseRequest,
        handlers::purchase::PurchaseResponse,
        db::models::Transaction,
        db::models::Wallet,
        db::models::WebhookSubscription,
    )),
    tags(
        (name = "Wallet", description = "Per-user balance"),
        (name = "Purchases", description = "Wallet-backed product purchases"),
        (name = "Transactions", description = "Purchase history"),
        (name = "Webhooks", description = "Provider callbacks and subscriber fan-out")
    )
)]
pub struct ApiDoc;

pub fn create_app(state: AppState) -> Router {
    // The original service fronts browser clients, so CORS stays permissive.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/wallet", get(handlers::wallet::get_wallet))
        .route("/wallet/fund", post(handlers::wallet::fund_wallet))
        .route("/purchases/:product", post(handlers::purchase::submit_purchase))
        .route("/transactions", get(handlers::transactions::list_transactions))
        .route("/transactions/:id", get(handlers::transactions::get_transaction))
        .route(
            "/webhooks",
            get(handlers::subscriptions::list_subscriptions)
                .post(handlers::subscriptions::create_subscription),
        )
        .route("/webhooks/provider", post(handlers::webhook::provider_callback))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(state)
}
