use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Review, WatchlistItem, WatchlistRecord};

/// Read operations the dashboard and suggestion flows need from storage.
///
/// Kept behind a trait so the services can run against an in-memory
/// implementation in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Watchlists owned by the user, in creation order.
    async fn owned_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>>;

    /// Watchlists the user has a membership row for, in creation order.
    /// Includes lists the user also owns; callers dedup.
    async fn member_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>>;

    /// All items across the given watchlists.
    async fn items_in_watchlists(&self, watchlist_ids: &[Uuid]) -> AppResult<Vec<WatchlistItem>>;

    /// Item counts per watchlist. Watchlists with no items are absent from
    /// the map.
    async fn item_counts(&self, watchlist_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>>;

    /// Member count via the `get_true_member_count` stored procedure, which
    /// counts every member row no matter what row visibility the requesting
    /// user has.
    async fn true_member_count(&self, watchlist_id: Uuid, requesting_user: Uuid)
        -> AppResult<i64>;

    /// The user's review rows restricted to the given items.
    async fn reviews_for_user(&self, user_id: Uuid, item_ids: &[Uuid]) -> AppResult<Vec<Review>>;
}

/// PostgreSQL-backed store used in production.
#[derive(Clone)]
pub struct PgWatchlistStore {
    pool: PgPool,
}

impl PgWatchlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn owned_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>> {
        let records = sqlx::query_as::<_, WatchlistRecord>(
            "SELECT id, name, description, owner_id, is_public, created_at
             FROM watchlists
             WHERE owner_id = $1
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn member_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>> {
        let records = sqlx::query_as::<_, WatchlistRecord>(
            "SELECT w.id, w.name, w.description, w.owner_id, w.is_public, w.created_at
             FROM watchlists w
             JOIN watchlist_members m ON m.watchlist_id = w.id
             WHERE m.user_id = $1
             ORDER BY w.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn items_in_watchlists(&self, watchlist_ids: &[Uuid]) -> AppResult<Vec<WatchlistItem>> {
        let items = sqlx::query_as::<_, WatchlistItem>(
            "SELECT id, watchlist_id, tmdb_id, media_type, title, overview, poster_path,
                    backdrop_path, release_date, runtime_minutes, vote_average, genres,
                    status, added_by, created_at, updated_at
             FROM watchlist_items
             WHERE watchlist_id = ANY($1)
             ORDER BY created_at",
        )
        .bind(watchlist_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn item_counts(&self, watchlist_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT watchlist_id, COUNT(*)
             FROM watchlist_items
             WHERE watchlist_id = ANY($1)
             GROUP BY watchlist_id",
        )
        .bind(watchlist_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn true_member_count(
        &self,
        watchlist_id: Uuid,
        requesting_user: Uuid,
    ) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i32>("SELECT get_true_member_count($1, $2)")
            .bind(watchlist_id)
            .bind(requesting_user)
            .fetch_one(&self.pool)
            .await?;

        Ok(i64::from(count))
    }

    async fn reviews_for_user(&self, user_id: Uuid, item_ids: &[Uuid]) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT item_id, user_id, rating, comment, watched, watched_at, created_at, updated_at
             FROM reviews
             WHERE user_id = $1 AND item_id = ANY($2)",
        )
        .bind(user_id)
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }
}
