//! Portfolio valuation, history and the daily snapshot job.

mod portfolio_model;
mod portfolio_service;
mod snapshot_service;
#[cfg(test)]
pub(crate) mod tests_support;
mod valuation_service;

pub use portfolio_model::{
    HistoryRange, PortfolioHistory, PortfolioValuation, ValuationResult,
};
pub use portfolio_service::PortfolioService;
pub use snapshot_service::{SnapshotService, SnapshotSummary};
pub use valuation_service::ValuationService;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;

/// Store contract for daily portfolio value snapshots.
#[async_trait]
pub trait PortfolioHistoryRepository: Send + Sync {
    /// Write the snapshot for (user, date), replacing any existing row for
    /// that calendar day: at most one snapshot per user per day.
    async fn upsert(&self, snapshot: PortfolioHistory) -> Result<()>;

    /// Snapshots for a user on or after `start`, ascending by date.
    async fn list_since(&self, user_id: &str, start: NaiveDate) -> Result<Vec<PortfolioHistory>>;
}

/// Resolves the set of users the snapshot job iterates over.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_ids(&self) -> Result<Vec<String>>;
}
