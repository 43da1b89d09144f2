use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use uuid::Uuid;

use couchlist_api::db::WatchlistStore;
use couchlist_api::error::{AppError, AppResult};
use couchlist_api::middleware::auth::{USER_EMAIL_HEADER, USER_ID_HEADER};
use couchlist_api::middleware::request_id::REQUEST_ID_HEADER;
use couchlist_api::models::{
    MediaType, MediaVideo, Review, TitleMatch, WatchStatus, WatchlistItem, WatchlistRecord,
};
use couchlist_api::routes::{create_router, AppState};
use couchlist_api::services::providers::{CompletionProvider, MetadataProvider};

// In-memory test doubles

#[derive(Default, Clone)]
struct InMemoryStore {
    watchlists: Vec<WatchlistRecord>,
    /// (watchlist_id, user_id) membership rows, owners included
    memberships: Vec<(Uuid, Uuid)>,
    items: Vec<WatchlistItem>,
    reviews: Vec<Review>,
}

#[async_trait]
impl WatchlistStore for InMemoryStore {
    async fn owned_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>> {
        Ok(self
            .watchlists
            .iter()
            .filter(|w| w.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn member_watchlists(&self, user_id: Uuid) -> AppResult<Vec<WatchlistRecord>> {
        let member_of: HashSet<Uuid> = self
            .memberships
            .iter()
            .filter(|(_, member)| *member == user_id)
            .map(|(watchlist_id, _)| *watchlist_id)
            .collect();

        Ok(self
            .watchlists
            .iter()
            .filter(|w| member_of.contains(&w.id))
            .cloned()
            .collect())
    }

    async fn items_in_watchlists(&self, watchlist_ids: &[Uuid]) -> AppResult<Vec<WatchlistItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| watchlist_ids.contains(&item.watchlist_id))
            .cloned()
            .collect())
    }

    async fn item_counts(&self, watchlist_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
        let mut counts = HashMap::new();
        for item in &self.items {
            if watchlist_ids.contains(&item.watchlist_id) {
                *counts.entry(item.watchlist_id).or_insert(0i64) += 1;
            }
        }
        Ok(counts)
    }

    async fn true_member_count(
        &self,
        watchlist_id: Uuid,
        _requesting_user: Uuid,
    ) -> AppResult<i64> {
        Ok(self
            .memberships
            .iter()
            .filter(|(list, _)| *list == watchlist_id)
            .count() as i64)
    }

    async fn reviews_for_user(&self, user_id: Uuid, item_ids: &[Uuid]) -> AppResult<Vec<Review>> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && item_ids.contains(&r.item_id))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
struct StubMetadata {
    titles: HashMap<(MediaType, i64), String>,
    videos: HashMap<i64, Vec<MediaVideo>>,
    search_hits: HashMap<String, Vec<TitleMatch>>,
    fail_videos: bool,
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    async fn lookup_title(&self, media_type: MediaType, tmdb_id: i64) -> AppResult<String> {
        self.titles
            .get(&(media_type, tmdb_id))
            .cloned()
            .ok_or_else(|| AppError::ExternalApi(format!("no title for {}", tmdb_id)))
    }

    async fn list_videos(
        &self,
        _media_type: MediaType,
        tmdb_id: i64,
    ) -> AppResult<Vec<MediaVideo>> {
        if self.fail_videos {
            return Err(AppError::ExternalApi("video listing unavailable".to_string()));
        }
        Ok(self.videos.get(&tmdb_id).cloned().unwrap_or_default())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<TitleMatch>> {
        Ok(self.search_hits.get(query).cloned().unwrap_or_default())
    }
}

/// Returns its canned reply, or a provider error when none is set.
#[derive(Default, Clone)]
struct StubCompletions {
    reply: Option<String>,
}

#[async_trait]
impl CompletionProvider for StubCompletions {
    async fn complete(&self, _prompt: &str) -> AppResult<String> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(AppError::ExternalApi("completion backend offline".to_string())),
        }
    }
}

// Fixtures

fn create_test_server(
    store: InMemoryStore,
    metadata: StubMetadata,
    completions: StubCompletions,
) -> TestServer {
    let state = AppState {
        store: Arc::new(store),
        metadata: Arc::new(metadata),
        completions: Arc::new(completions),
    };
    TestServer::new(create_router(state)).unwrap()
}

fn watchlist(owner_id: Uuid, name: &str) -> WatchlistRecord {
    WatchlistRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some(format!("{} description", name)),
        owner_id,
        is_public: false,
        created_at: Utc::now(),
    }
}

fn item(watchlist_id: Uuid, tmdb_id: i64, title: &str, status: WatchStatus) -> WatchlistItem {
    WatchlistItem {
        id: Uuid::new_v4(),
        watchlist_id,
        tmdb_id,
        media_type: MediaType::Movie,
        title: title.to_string(),
        overview: Some(format!("{} overview", title)),
        poster_path: Some(format!("/poster-{}.jpg", tmdb_id)),
        backdrop_path: None,
        release_date: None,
        runtime_minutes: Some(110),
        vote_average: Some(7.2),
        genres: vec!["Drama".to_string()],
        status,
        added_by: watchlist_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn watched_review(item_id: Uuid, user_id: Uuid) -> Review {
    Review {
        item_id,
        user_id,
        rating: Some(4),
        comment: None,
        watched: true,
        watched_at: Some(Utc::now()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn trailer(key: &str) -> MediaVideo {
    MediaVideo {
        name: "Official Trailer".to_string(),
        key: key.to_string(),
        site: "YouTube".to_string(),
        kind: "Trailer".to_string(),
        official: true,
    }
}

fn title_match(tmdb_id: i64, title: &str) -> TitleMatch {
    TitleMatch {
        tmdb_id,
        media_type: MediaType::Movie,
        title: title.to_string(),
        overview: Some(format!("{} overview", title)),
        poster_path: Some(format!("/poster-{}.jpg", tmdb_id)),
        vote_average: Some(8.0),
    }
}

fn get_with_identity(server: &TestServer, path: &str, user_id: Uuid) -> axum_test::TestRequest {
    server
        .get(path)
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&user_id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_EMAIL_HEADER),
            HeaderValue::from_static("viewer@example.com"),
        )
}

// Tests

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(
        InMemoryStore::default(),
        StubMetadata::default(),
        StubCompletions::default(),
    );

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_dashboard_requires_identity_headers() {
    let server = create_test_server(
        InMemoryStore::default(),
        StubMetadata::default(),
        StubCompletions::default(),
    );

    let response = server.get("/api/v1/dashboard").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_request_id_propagated_and_generated() {
    let server = create_test_server(
        InMemoryStore::default(),
        StubMetadata::default(),
        StubCompletions::default(),
    );

    // A forwarded UUID comes back unchanged
    let forwarded = Uuid::new_v4().to_string();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_str(&forwarded).unwrap(),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.header(REQUEST_ID_HEADER), forwarded.as_str());

    // Without one, the service mints a parseable UUID
    let response = server.get("/health").await;
    response.assert_status_ok();
    let generated = response.header(REQUEST_ID_HEADER);
    assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_dashboard_empty_for_user_with_no_watchlists() {
    let server = create_test_server(
        InMemoryStore::default(),
        StubMetadata::default(),
        StubCompletions::default(),
    );

    let response = get_with_identity(&server, "/api/v1/dashboard", Uuid::new_v4()).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
    assert_eq!(body["owned"].as_array().unwrap().len(), 0);
    assert_eq!(body["shared"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_splits_owned_and_shared_with_counts() {
    let user = Uuid::new_v4();
    let friend = Uuid::new_v4();

    let mine = watchlist(user, "Movie Night");
    let theirs = watchlist(friend, "Prestige TV");

    let store = InMemoryStore {
        memberships: vec![(mine.id, user), (theirs.id, friend), (theirs.id, user)],
        items: vec![
            item(mine.id, 603, "The Matrix", WatchStatus::ToWatch),
            item(mine.id, 680, "Pulp Fiction", WatchStatus::ToWatch),
            item(theirs.id, 1396, "Breaking Bad", WatchStatus::ToWatch),
        ],
        watchlists: vec![mine.clone(), theirs.clone()],
        reviews: vec![],
    };

    // Every title has a trailer so whichever item lands first resolves one
    let metadata = StubMetadata {
        videos: HashMap::from([
            (603, vec![trailer("m7E9piHcfr4")]),
            (680, vec![trailer("s7EdQ4FqbhY")]),
            (1396, vec![trailer("HhesaQXLuRY")]),
        ]),
        ..StubMetadata::default()
    };

    let server = create_test_server(store, metadata, StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/dashboard", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let owned = body["owned"].as_array().unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0]["name"], "Movie Night");
    assert_eq!(owned[0]["item_count"], 2);
    assert_eq!(owned[0]["member_count"], 1);

    let shared = body["shared"].as_array().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["name"], "Prestige TV");
    assert_eq!(shared[0]["item_count"], 1);
    assert_eq!(shared[0]["member_count"], 2);

    // All three items are unwatched, under the cap of five
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 3);
    for rec in recommendations {
        assert_eq!(rec["reason"], "Not watched yet!");
    }

    // Only the lead recommendation carries a trailer
    assert!(recommendations[0]["trailer"].is_string());
    assert!(recommendations[1]["trailer"].is_null());
    assert!(recommendations[2]["trailer"].is_null());

    // Summaries are stable across loads; only the sample is random
    let second = get_with_identity(&server, "/api/v1/dashboard", user).await;
    second.assert_status_ok();
    let second_body: serde_json::Value = second.json();
    assert_eq!(second_body["owned"], body["owned"]);
    assert_eq!(second_body["shared"], body["shared"]);
}

#[tokio::test]
async fn test_dashboard_watched_reviews_shrink_the_pool() {
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let friend = Uuid::new_v4();
    let mine = watchlist(user, "Backlog");
    let shared = watchlist(friend, "Shared Picks");

    // User owns a 3-item list with one item watched, and belongs to a
    // 2-item list with nothing watched: the pool is 4
    let seen = item(mine.id, 603, "The Matrix", WatchStatus::ToWatch);
    let pending_a = item(mine.id, 680, "Pulp Fiction", WatchStatus::ToWatch);
    let pending_b = item(mine.id, 949, "Heat", WatchStatus::ToWatch);
    let shared_a = item(shared.id, 27205, "Inception", WatchStatus::ToWatch);
    let shared_b = item(shared.id, 157336, "Interstellar", WatchStatus::ToWatch);

    let store = InMemoryStore {
        memberships: vec![(mine.id, user), (shared.id, friend), (shared.id, user)],
        // Another user's watched review must not shrink this user's pool
        reviews: vec![
            watched_review(seen.id, user),
            watched_review(pending_a.id, other),
        ],
        items: vec![seen, pending_a, pending_b, shared_a, shared_b],
        watchlists: vec![mine, shared],
    };

    let server = create_test_server(store, StubMetadata::default(), StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/dashboard", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let ids: HashSet<i64> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|rec| rec["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, HashSet::from([680, 949, 27205, 157336]));
}

#[tokio::test]
async fn test_dashboard_lists_empty_watchlists_with_zero_counts() {
    let user = Uuid::new_v4();
    let empty = watchlist(user, "Someday");

    let store = InMemoryStore {
        memberships: vec![(empty.id, user)],
        watchlists: vec![empty],
        items: vec![],
        reviews: vec![],
    };

    let server = create_test_server(store, StubMetadata::default(), StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/dashboard", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["owned"][0]["item_count"], 0);
    assert_eq!(body["owned"][0]["member_count"], 1);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_survives_trailer_lookup_failure() {
    let user = Uuid::new_v4();
    let mine = watchlist(user, "Backlog");

    let store = InMemoryStore {
        memberships: vec![(mine.id, user)],
        items: vec![item(mine.id, 603, "The Matrix", WatchStatus::ToWatch)],
        watchlists: vec![mine],
        reviews: vec![],
    };
    let metadata = StubMetadata {
        fail_videos: true,
        ..StubMetadata::default()
    };

    let server = create_test_server(store, metadata, StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/dashboard", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0]["trailer"].is_null());
}

#[tokio::test]
async fn test_suggestions_resolve_completion_lines_in_order() {
    let user = Uuid::new_v4();
    let mine = watchlist(user, "Backlog");

    let store = InMemoryStore {
        memberships: vec![(mine.id, user)],
        items: vec![
            item(mine.id, 949, "Heat", WatchStatus::ToWatch),
            item(mine.id, 680, "Pulp Fiction", WatchStatus::Watching),
        ],
        watchlists: vec![mine],
        reviews: vec![],
    };

    let metadata = StubMetadata {
        titles: HashMap::from([
            ((MediaType::Movie, 949), "Heat".to_string()),
            ((MediaType::Movie, 680), "Pulp Fiction".to_string()),
        ]),
        search_hits: HashMap::from([
            (
                "The Thing".to_string(),
                vec![title_match(1091, "The Thing")],
            ),
            ("Alien".to_string(), vec![title_match(348, "Alien")]),
            // "Not A Real Film" intentionally absent
        ]),
        ..StubMetadata::default()
    };

    let completions = StubCompletions {
        reply: Some(
            "1. The Thing - Paranoia in the ice.\n\
             2. Alien - Deep-space dread.\n\
             3. Not A Real Film - Made up."
                .to_string(),
        ),
    };

    let server = create_test_server(store, metadata, completions);
    let response = get_with_identity(&server, "/api/v1/suggestions", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let recommendations = body["recommendations"].as_array().unwrap();

    // The unresolvable third line is dropped; the rest keep completion order
    assert_eq!(recommendations.len(), 2);
    assert_eq!(recommendations[0]["id"], 1091);
    assert_eq!(recommendations[0]["title"], "The Thing");
    assert_eq!(recommendations[0]["reason"], "Paranoia in the ice.");
    assert_eq!(recommendations[1]["id"], 348);
    assert_eq!(recommendations[1]["reason"], "Deep-space dread.");
}

#[tokio::test]
async fn test_suggestions_empty_backlog_never_calls_model() {
    let user = Uuid::new_v4();
    let mine = watchlist(user, "Finished");

    let store = InMemoryStore {
        memberships: vec![(mine.id, user)],
        items: vec![item(mine.id, 603, "The Matrix", WatchStatus::Watched)],
        watchlists: vec![mine],
        reviews: vec![],
    };

    // The default stub errors on any call, so a 200 proves it was skipped
    let server = create_test_server(store, StubMetadata::default(), StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/suggestions", user).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_suggestions_completion_failure_is_bad_gateway() {
    let user = Uuid::new_v4();
    let mine = watchlist(user, "Backlog");

    let store = InMemoryStore {
        memberships: vec![(mine.id, user)],
        items: vec![item(mine.id, 949, "Heat", WatchStatus::ToWatch)],
        watchlists: vec![mine],
        reviews: vec![],
    };
    let metadata = StubMetadata {
        titles: HashMap::from([((MediaType::Movie, 949), "Heat".to_string())]),
        ..StubMetadata::default()
    };

    let server = create_test_server(store, metadata, StubCompletions::default());
    let response = get_with_identity(&server, "/api/v1/suggestions", user).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "completion backend offline");
}
