use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{WatchlistItem, WatchlistSummary};

/// Reason attached to every dashboard recommendation.
pub const NOT_WATCHED_REASON: &str = "Not watched yet!";

/// A dashboard recommendation derived from an unwatched item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub genres: Vec<String>,
    pub reason: String,
    /// Trailer URL, populated for the first recommendation only.
    /// Serialized as an explicit null when absent.
    pub trailer: Option<String>,
}

impl From<WatchlistItem> for Recommendation {
    fn from(item: WatchlistItem) -> Self {
        Self {
            id: item.tmdb_id,
            title: item.title,
            overview: item.overview,
            poster_path: item.poster_path,
            backdrop_path: item.backdrop_path,
            release_date: item.release_date,
            runtime: item.runtime_minutes,
            vote_average: item.vote_average,
            genres: item.genres,
            reason: NOT_WATCHED_REASON.to_string(),
            trailer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub recommendations: Vec<Recommendation>,
    pub owned: Vec<WatchlistSummary>,
    pub shared: Vec<WatchlistSummary>,
}

/// A similar-title suggestion resolved through metadata search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub recommendations: Vec<Suggestion>,
}
