use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rental_recs_api::api::{create_router, AppState};
use rental_recs_api::config::Config;
use rental_recs_api::db::{create_pool, create_redis_client, Cache, CacheWriterHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let mut cache_writer: Option<CacheWriterHandle> = None;
    let state = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url, config.max_db_connections).await?;
            let cache = match &config.redis_url {
                Some(redis_url) => {
                    let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
                    cache_writer = Some(handle);
                    Some(cache)
                }
                None => None,
            };
            tracing::info!(cached = cache.is_some(), "Using Postgres backend");
            AppState::postgres(pool, &config, cache)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory backend");
            AppState::in_memory(&config)
        }
    };

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
