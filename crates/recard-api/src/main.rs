//! recard-api - HTTP API server for recard

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use recard_api::{build_state, create_router};
use recard_core::defaults::{DATABASE_PATH, SERVER_PORT};
use recard_gen::AiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = std::env::var("RECARD_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DATABASE_PATH));
    let port = std::env::var("RECARD_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(SERVER_PORT);

    let ai_config = AiConfig::from_env();
    info!(
        subsystem = "api",
        op = "startup",
        db_path = %db_path.display(),
        ai_enabled = ai_config.enabled,
        model = %ai_config.model,
        "Starting recard API server"
    );

    let state = build_state(&db_path, ai_config).await?;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(subsystem = "api", op = "listen", %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
