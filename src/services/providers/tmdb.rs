//! TMDB metadata provider
//!
//! Three read paths, each cached briefly in Redis:
//! 1. Title lookup: /movie/{id} or /tv/{id} → canonical display title
//! 2. Video listing: /{type}/{id}/videos → trailers, teasers, clips
//! 3. Multi-search: /search/multi → movie/tv matches for free-text titles

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaType, MediaVideo, TitleMatch},
    services::providers::MetadataProvider,
};

const TITLE_CACHE_TTL: u64 = 86400; // 24 hours
const VIDEO_CACHE_TTL: u64 = 86400; // 24 hours
const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

/// Raw multi-search hit. `media_type` distinguishes movie/tv/person, and
/// movies carry `title` where TV shows carry `name`.
#[derive(Debug, Deserialize)]
struct TmdbSearchHit {
    id: i64,
    media_type: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// Issues a GET with the v3 api_key appended and returns the JSON body.
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> AppResult<serde_json::Value> {
        let response = self
            .http_client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Normalizes a multi-search hit, dropping person results and entries
    /// without a usable display title.
    fn hit_to_match(hit: TmdbSearchHit) -> Option<TitleMatch> {
        let (media_type, title) = match hit.media_type.as_str() {
            "movie" => (MediaType::Movie, hit.title),
            "tv" => (MediaType::Tv, hit.name),
            _ => return None,
        };

        Some(TitleMatch {
            tmdb_id: hit.id,
            media_type,
            title: title?,
            overview: hit.overview,
            poster_path: hit.poster_path,
            vote_average: hit.vote_average,
        })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn lookup_title(&self, media_type: MediaType, tmdb_id: i64) -> AppResult<String> {
        cached!(
            self.cache,
            CacheKey::Title(media_type, tmdb_id),
            TITLE_CACHE_TTL,
            async move {
                let url = format!("{}/{}/{}", self.api_url, media_type, tmdb_id);
                let details = self.get_json(&url, &[]).await?;

                let title = details["title"]
                    .as_str()
                    .or_else(|| details["name"].as_str())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        AppError::ExternalApi(format!(
                            "TMDB details for {} {} missing a title",
                            media_type, tmdb_id
                        ))
                    })?;

                tracing::debug!(
                    media_type = %media_type,
                    tmdb_id = tmdb_id,
                    title = %title,
                    provider = "tmdb",
                    "Title lookup completed"
                );

                Ok::<_, AppError>(title)
            }
        )
    }

    async fn list_videos(
        &self,
        media_type: MediaType,
        tmdb_id: i64,
    ) -> AppResult<Vec<MediaVideo>> {
        cached!(
            self.cache,
            CacheKey::Videos(media_type, tmdb_id),
            VIDEO_CACHE_TTL,
            async move {
                let url = format!("{}/{}/{}/videos", self.api_url, media_type, tmdb_id);
                let listing = self.get_json(&url, &[]).await?;

                let results = listing["results"].as_array().ok_or_else(|| {
                    AppError::ExternalApi("Invalid TMDB video listing format".to_string())
                })?;

                let videos: Vec<MediaVideo> = results
                    .iter()
                    .filter_map(|video| serde_json::from_value::<MediaVideo>(video.clone()).ok())
                    .collect();

                tracing::info!(
                    media_type = %media_type,
                    tmdb_id = tmdb_id,
                    videos = videos.len(),
                    provider = "tmdb",
                    "Video listing fetched"
                );

                Ok::<_, AppError>(videos)
            }
        )
    }

    async fn search(&self, query: &str) -> AppResult<Vec<TitleMatch>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let url = format!("{}/search/multi", self.api_url);
                let page = self.get_json(&url, &[("query", query)]).await?;

                let results = page["results"].as_array().ok_or_else(|| {
                    AppError::ExternalApi("Invalid TMDB search response format".to_string())
                })?;

                let matches: Vec<TitleMatch> = results
                    .iter()
                    .filter_map(|hit| {
                        serde_json::from_value::<TmdbSearchHit>(hit.clone())
                            .ok()
                            .and_then(Self::hit_to_match)
                    })
                    .collect();

                tracing::info!(
                    query = %query,
                    results = matches.len(),
                    provider = "tmdb",
                    "Multi-search completed"
                );

                Ok::<_, AppError>(matches)
            }
        )
    }
}
