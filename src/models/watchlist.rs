use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MediaType, WatchStatus};

/// A watchlist row as stored.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WatchlistRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Dashboard-facing summary of a watchlist with its aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub item_count: i64,
    pub member_count: i64,
}

/// An item on a watchlist, carrying denormalized display metadata so the
/// dashboard never has to call out to TMDB for fields it already has.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub watchlist_id: Uuid,
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub vote_average: Option<f64>,
    pub genres: Vec<String>,
    pub status: WatchStatus,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
