use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vtu_core::cli::{self, Cli, Commands, DbCommands, TxCommands};
use vtu_core::config::Config;
use vtu_core::provider::StubProvider;
use vtu_core::services::dispatcher::WebhookDispatcher;
use vtu_core::services::recorder::TransactionRecorder;
use vtu_core::services::wallet::WalletLedger;
use vtu_core::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => {
            let pool = db::create_pool(&config).await?;
            run_migrations(&pool).await?;
            println!("Migrations applied");
            Ok(())
        }
        Commands::Tx(TxCommands::ForceComplete { reference }) => {
            let pool = db::create_pool(&config).await?;
            cli::handle_tx_force_complete(&pool, &reference).await
        }
        Commands::Config => {
            cli::handle_config_check(&config);
            Ok(())
        }
    }
}

async fn run_migrations(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;

    run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let dispatcher = WebhookDispatcher::new(
        pool.clone(),
        Duration::from_secs(config.webhook_timeout_secs),
    );
    let wallet = WalletLedger::new(pool.clone(), config.starting_balance.clone());
    let recorder = TransactionRecorder::new(
        pool.clone(),
        wallet.clone(),
        Arc::new(StubProvider::new()),
        dispatcher.clone(),
        Duration::from_secs(config.fulfillment_timeout_secs),
    );

    let state = AppState {
        db: pool,
        config: config.clone(),
        wallet,
        recorder,
        dispatcher,
    };
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
