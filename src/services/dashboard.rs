use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::{stream, StreamExt};
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::{
    db::WatchlistStore,
    error::AppResult,
    models::{
        DashboardResponse, MediaType, MediaVideo, Recommendation, Review, WatchlistItem,
        WatchlistRecord, WatchlistSummary,
    },
    services::{providers::MetadataProvider, scope},
};

/// Most recommendations a single dashboard returns.
const MAX_RECOMMENDATIONS: usize = 5;

/// Member-count lookups in flight at once.
const MEMBER_COUNT_CONCURRENCY: usize = 8;

const TRAILER_VIDEO_TYPE: &str = "Trailer";
const TRAILER_VIDEO_SITE: &str = "YouTube";

/// Builds the dashboard payload for a user: watchlist summaries split into
/// owned and shared groups, plus a random sample of the user's unwatched
/// items as recommendations.
pub async fn build_dashboard(
    store: &dyn WatchlistStore,
    metadata: &dyn MetadataProvider,
    user_id: Uuid,
) -> AppResult<DashboardResponse> {
    let start = Instant::now();

    // 1. Resolve the visible set; nothing visible means an empty dashboard
    let visible = scope::visible_watchlists(store, user_id).await?;
    if visible.is_empty() {
        return Ok(DashboardResponse {
            recommendations: Vec::new(),
            owned: Vec::new(),
            shared: Vec::new(),
        });
    }

    let watchlist_ids: Vec<Uuid> = visible.iter().map(|w| w.id).collect();

    // 2. Items and item counts for the whole visible set in two queries
    let (items, item_counts) = tokio::try_join!(
        store.items_in_watchlists(&watchlist_ids),
        store.item_counts(&watchlist_ids)
    )?;

    // 3. Member counts via the stored procedure; a failed lookup degrades
    //    that watchlist's count to 0 instead of failing the dashboard
    let member_counts = fetch_member_counts(store, &watchlist_ids, user_id).await;

    // 4. Summaries in creation order, split by ownership
    let (owned, shared) = summarize(&visible, user_id, &item_counts, &member_counts);

    // 5. Per-user watch state: reviews marked watched shrink the pool
    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let reviews = store.reviews_for_user(user_id, &item_ids).await?;
    let unwatched = partition_unwatched(items, &reviews);

    // 6. Uniform random sample, then a best-effort trailer for the first pick
    let pool_size = unwatched.len();
    let sampled = sample_items(unwatched, &mut rand::thread_rng(), MAX_RECOMMENDATIONS);
    let first_media = sampled.first().map(|item| (item.media_type, item.tmdb_id));
    let mut recommendations: Vec<Recommendation> =
        sampled.into_iter().map(Recommendation::from).collect();

    if let Some((media_type, tmdb_id)) = first_media {
        recommendations[0].trailer = fetch_trailer(metadata, media_type, tmdb_id).await;
    }

    tracing::info!(
        user_id = %user_id,
        watchlists = watchlist_ids.len(),
        pool = pool_size,
        recommendations = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Dashboard built"
    );

    Ok(DashboardResponse {
        recommendations,
        owned,
        shared,
    })
}

/// Member counts for each watchlist through the `get_true_member_count`
/// stored procedure, with at most MEMBER_COUNT_CONCURRENCY lookups in
/// flight. Individual failures degrade to a count of 0 with a warning.
async fn fetch_member_counts(
    store: &dyn WatchlistStore,
    watchlist_ids: &[Uuid],
    user_id: Uuid,
) -> HashMap<Uuid, i64> {
    stream::iter(watchlist_ids.iter().copied())
        .map(|watchlist_id| async move {
            match store.true_member_count(watchlist_id, user_id).await {
                Ok(count) => (watchlist_id, count),
                Err(e) => {
                    tracing::warn!(
                        watchlist_id = %watchlist_id,
                        error = %e,
                        "Member count lookup failed, reporting 0"
                    );
                    (watchlist_id, 0)
                }
            }
        })
        .buffer_unordered(MEMBER_COUNT_CONCURRENCY)
        .collect()
        .await
}

/// Builds summaries in the order of `visible` and splits them into lists
/// the user owns and lists shared with them. Watchlists missing from a
/// count map report 0.
fn summarize(
    visible: &[WatchlistRecord],
    user_id: Uuid,
    item_counts: &HashMap<Uuid, i64>,
    member_counts: &HashMap<Uuid, i64>,
) -> (Vec<WatchlistSummary>, Vec<WatchlistSummary>) {
    let mut owned = Vec::new();
    let mut shared = Vec::new();

    for watchlist in visible {
        let summary = WatchlistSummary {
            id: watchlist.id,
            name: watchlist.name.clone(),
            description: watchlist.description.clone(),
            owner_id: watchlist.owner_id,
            item_count: item_counts.get(&watchlist.id).copied().unwrap_or(0),
            member_count: member_counts.get(&watchlist.id).copied().unwrap_or(0),
        };

        if watchlist.owner_id == user_id {
            owned.push(summary);
        } else {
            shared.push(summary);
        }
    }

    (owned, shared)
}

/// Drops every item the user has marked watched through a review. Items
/// with no review row, or a review left unwatched, stay in the pool.
fn partition_unwatched(items: Vec<WatchlistItem>, reviews: &[Review]) -> Vec<WatchlistItem> {
    let watched: HashSet<Uuid> = reviews
        .iter()
        .filter(|review| review.watched)
        .map(|review| review.item_id)
        .collect();

    items
        .into_iter()
        .filter(|item| !watched.contains(&item.id))
        .collect()
}

/// Uniform sample without replacement: shuffle then truncate, so selection
/// never favors insertion order.
fn sample_items<R: Rng>(
    mut pool: Vec<WatchlistItem>,
    rng: &mut R,
    limit: usize,
) -> Vec<WatchlistItem> {
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

/// Best-effort trailer lookup for the first recommendation. Any failure
/// logs and yields None so the dashboard still returns.
async fn fetch_trailer(
    metadata: &dyn MetadataProvider,
    media_type: MediaType,
    tmdb_id: i64,
) -> Option<String> {
    match metadata.list_videos(media_type, tmdb_id).await {
        Ok(videos) => pick_trailer(&videos),
        Err(e) => {
            tracing::warn!(
                media_type = %media_type,
                tmdb_id = tmdb_id,
                error = %e,
                "Trailer lookup failed, omitting trailer"
            );
            None
        }
    }
}

/// First YouTube-hosted entry typed "Trailer", rendered as a watch URL.
fn pick_trailer(videos: &[MediaVideo]) -> Option<String> {
    videos
        .iter()
        .find(|video| video.kind == TRAILER_VIDEO_TYPE && video.site == TRAILER_VIDEO_SITE)
        .map(|video| format!("https://www.youtube.com/watch?v={}", video.key))
}
