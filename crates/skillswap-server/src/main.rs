use std::net::SocketAddr;

use anyhow::Context;
use skillswap_server::{create_router, db, AppState, Config};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skillswap_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("failed to create {}", config.media_root.display()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::new(pool, config));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
