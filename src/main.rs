use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pattern_api::config::{AppConfig, Environment};
use pattern_api::database::{manager, PgPatternStore};
use pattern_api::AppState;

#[derive(Debug, Parser)]
#[command(name = "pattern-api", version, about = "Read-only HTTP API over stock pattern data")]
struct Args {
    /// Address to bind
    #[arg(long, env = "PATTERN_API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (falls back to PORT, then 8000)
    #[arg(long, env = "PATTERN_API_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, API_KEY, etc.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(config.environment);
    tracing::info!("Starting pattern API in {:?} mode", config.environment);
    tracing::debug!(?config, "configuration loaded");

    let pool = manager::connect(&config.database).context("failed to create database pool")?;
    let store = PgPatternStore::new(pool.clone(), config.database.query_timeout());
    let app = pattern_api::app(AppState::new(store, config));

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()))
        .unwrap_or(8000);
    let bind_addr = format!("{}:{}", args.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pattern API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Closed database pool");
    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
