pub mod cache;
pub mod postgres;
pub mod store;

mod macros;

pub use cache::{create_redis_client, Cache, CacheKey};
pub use postgres::{create_pool, run_migrations};
pub use store::{PgWatchlistStore, WatchlistStore};
