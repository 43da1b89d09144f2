use sqlx::{postgres::PgPoolOptions, PgPool};

const MAX_POOL_CONNECTIONS: u32 = 5;

/// Creates the PostgreSQL connection pool shared by the service
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations
///
/// Runs at startup so a fresh database reaches the current schema before
/// the server starts accepting requests.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}
