use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    /// Upper bound on a single order placement, from `ORDER_TIMEOUT_MS`.
    pub order_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let order_timeout = match env::var("ORDER_TIMEOUT_MS") {
            Ok(raw) => Some(parse_timeout_ms(&raw)?),
            Err(_) => None,
        };
        Ok(Self {
            server_port,
            database_url,
            order_timeout,
        })
    }
}

fn parse_timeout_ms(raw: &str) -> anyhow::Result<Duration> {
    let ms: u64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("ORDER_TIMEOUT_MS must be a whole number of milliseconds: {e}"))?;
    if ms == 0 {
        anyhow::bail!("ORDER_TIMEOUT_MS must be greater than zero");
    }
    Ok(Duration::from_millis(ms))
}
