use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A user's review of a watchlist item. At most one row exists per
/// (item, user) pair; writes upsert against that key.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Review {
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub rating: Option<i16>,
    pub comment: Option<String>,
    pub watched: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
