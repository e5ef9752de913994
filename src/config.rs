use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Default balance a wallet is provisioned with on first access.
pub const DEFAULT_STARTING_BALANCE: &str = "15000.00";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub provider_webhook_secret: String,
    pub starting_balance: BigDecimal,
    pub fulfillment_timeout_secs: u64,
    pub webhook_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let starting_balance_raw =
            env::var("STARTING_BALANCE").unwrap_or_else(|_| DEFAULT_STARTING_BALANCE.to_string());
        let starting_balance = BigDecimal::from_str(&starting_balance_raw)
            .map_err(|e| anyhow::anyhow!("STARTING_BALANCE is not a valid decimal: {}", e))?;

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            provider_webhook_secret: env::var("PROVIDER_WEBHOOK_SECRET")?,
            starting_balance,
            fulfillment_timeout_secs: env::var("FULFILLMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            webhook_timeout_secs: env::var("WEBHOOK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        })
    }
}
