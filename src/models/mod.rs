mod dashboard;
mod media;
mod review;
mod watchlist;

pub use dashboard::{
    DashboardResponse, Recommendation, Suggestion, SuggestionsResponse, NOT_WATCHED_REASON,
};
pub use media::{MediaType, MediaVideo, TitleMatch, WatchStatus};
pub use review::Review;
pub use watchlist::{WatchlistItem, WatchlistRecord, WatchlistSummary};
