use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of media an item refers to, matching TMDB's `media_type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
        }
    }
}

/// Item-level watch status shared by everyone on the watchlist, as opposed
/// to the per-user watched flag on reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum WatchStatus {
    ToWatch,
    Watching,
    Watched,
}

/// One entry from a TMDB video listing for a movie or show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaVideo {
    pub name: String,
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
}

/// A TMDB multi-search hit normalized to the fields the service consumes.
/// Person results are filtered out before this type is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}
