//! Self-refreshing instrument watchlist.

mod watchlist_model;
mod watchlist_service;

pub use watchlist_model::{NewWatchlistEntry, WatchlistEntry, WatchlistUpdate};
pub use watchlist_service::WatchlistService;

use async_trait::async_trait;

use crate::errors::Result;

/// Store contract for watchlist entries, keyed by (owner, symbol token).
#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// Entries for a user, in insertion order.
    async fn list_by_owner(&self, owner_user_id: &str) -> Result<Vec<WatchlistEntry>>;

    async fn find(&self, owner_user_id: &str, symbol_token: &str)
        -> Result<Option<WatchlistEntry>>;

    async fn exists(&self, owner_user_id: &str, symbol_token: &str) -> Result<bool>;

    /// Insert or replace the entry for (owner, symbol token).
    async fn upsert(&self, entry: WatchlistEntry) -> Result<WatchlistEntry>;

    async fn delete(&self, owner_user_id: &str, symbol_token: &str) -> Result<()>;
}
