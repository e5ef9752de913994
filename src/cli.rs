use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "vtu-core")]
#[command(about = "VTU wallet and transaction processor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction management commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Force-complete a transaction stuck in processing
    ForceComplete {
        /// Transaction reference
        #[arg(value_name = "REFERENCE")]
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

/// Marks a stuck `processing` transaction as completed. The status gate
/// keeps this from touching finalized rows, so it never interferes with the
/// refund discipline.
pub async fn handle_tx_force_complete(pool: &PgPool, reference: &str) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = 'completed', updated_at = NOW()
        WHERE reference = $1 AND status = 'processing'
        RETURNING id
        "#,
    )
    .bind(reference)
    .fetch_optional(pool)
    .await?;

    match result {
        Some(_) => println!("Transaction {} marked as completed", reference),
        None => println!(
            "Transaction {} not found or not in processing status",
            reference
        ),
    }

    Ok(())
}

pub fn handle_config_check(config: &Config) {
    println!("Configuration loaded:");
    println!("  server_port:              {}", config.server_port);
    println!("  database_url:             [set]");
    println!(
        "  provider_webhook_secret:  {}",
        if config.provider_webhook_secret.is_empty() {
            "[empty]"
        } else {
            "[set]"
        }
    );
    println!("  starting_balance:         {}", config.starting_balance);
    println!(
        "  fulfillment_timeout_secs: {}",
        config.fulfillment_timeout_secs
    );
    println!("  webhook_timeout_secs:     {}", config.webhook_timeout_secs);
}
