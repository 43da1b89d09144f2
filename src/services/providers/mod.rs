//! External provider abstractions.
//!
//! The dashboard and suggestion flows reach TMDB and the completion API
//! through these traits, so tests can substitute in-memory implementations
//! and the concrete clients stay swappable.

use crate::{
    error::AppResult,
    models::{MediaType, MediaVideo, TitleMatch},
};

pub mod openai;
pub mod tmdb;

/// Media metadata source: canonical titles, video listings, search.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Canonical display title for a movie or show.
    async fn lookup_title(&self, media_type: MediaType, tmdb_id: i64) -> AppResult<String>;

    /// Video listing (trailers, teasers, clips) for a movie or show.
    async fn list_videos(&self, media_type: MediaType, tmdb_id: i64)
        -> AppResult<Vec<MediaVideo>>;

    /// Free-text search across movies and TV; person results are excluded.
    async fn search(&self, query: &str) -> AppResult<Vec<TitleMatch>>;
}

/// Text-completion source for the suggestion prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}
