use shop_hex::application::Services;
use shop_hex::config::Config;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / ORDER_TIMEOUT_MS when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "repository ready");

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        order_timeout: config.order_timeout,
    };

    let http = HttpServer::new(Services::new(repo), server_cfg).await?;
    http.run().await
}
