use std::collections::HashSet;

use uuid::Uuid;

use crate::{db::WatchlistStore, error::AppResult, models::WatchlistRecord};

/// Resolves the watchlists visible to a user: lists they own plus lists
/// they were added to as members.
///
/// Both queries run concurrently. The union is deduplicated by watchlist
/// id with owned lists first, so a user holding a redundant membership row
/// on their own list sees it exactly once.
pub async fn visible_watchlists(
    store: &dyn WatchlistStore,
    user_id: Uuid,
) -> AppResult<Vec<WatchlistRecord>> {
    let (owned, member) = tokio::try_join!(
        store.owned_watchlists(user_id),
        store.member_watchlists(user_id)
    )?;

    let mut seen = HashSet::new();
    let mut visible = Vec::with_capacity(owned.len() + member.len());
    for watchlist in owned.into_iter().chain(member) {
        if seen.insert(watchlist.id) {
            visible.push(watchlist);
        }
    }

    Ok(visible)
}
