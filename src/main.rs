use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use couchlist_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgWatchlistStore},
    routes::{create_router, AppState},
    services::providers::{openai::OpenAiProvider, tmdb::TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Postgres, with embedded migrations applied before serving
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    // Redis-backed metadata cache
    let redis_client = create_redis_client(&config.redis_url)?;
    let cache = Cache::new(redis_client);

    let state = AppState {
        store: Arc::new(PgWatchlistStore::new(pool)),
        metadata: Arc::new(TmdbProvider::new(
            cache,
            config.tmdb_api_key,
            config.tmdb_api_url,
        )),
        completions: Arc::new(OpenAiProvider::new(
            config.openai_api_key,
            config.openai_api_url,
            config.openai_model,
        )),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM so in-flight requests can drain
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
