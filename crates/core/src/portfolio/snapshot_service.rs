//! Daily portfolio-value snapshot job.

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::Result;
use crate::portfolio::{
    PortfolioHistory, PortfolioHistoryRepository, UserDirectory, ValuationService,
};
use crate::positions::PositionRepository;

/// Outcome of one snapshot run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Users the run iterated over.
    pub users: usize,
    /// Snapshots actually written.
    pub written: usize,
}

/// Values every user's portfolio and records one [`PortfolioHistory`] row
/// per user per day.
///
/// One user's failure never aborts the run; it is logged and the job moves
/// on to the next user.
pub struct SnapshotService {
    users: Arc<dyn UserDirectory>,
    positions: Arc<dyn PositionRepository>,
    history: Arc<dyn PortfolioHistoryRepository>,
    valuation: Arc<ValuationService>,
}

impl SnapshotService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        positions: Arc<dyn PositionRepository>,
        history: Arc<dyn PortfolioHistoryRepository>,
        valuation: Arc<ValuationService>,
    ) -> Self {
        Self {
            users,
            positions,
            history,
            valuation,
        }
    }

    /// Snapshot every user's portfolio value for `date`.
    ///
    /// Re-running for the same date replaces that day's rows rather than
    /// duplicating them.
    pub async fn take_snapshots(&self, date: NaiveDate) -> Result<SnapshotSummary> {
        let user_ids = self.users.user_ids().await?;
        let mut summary = SnapshotSummary {
            users: user_ids.len(),
            written: 0,
        };

        for user_id in user_ids {
            match self.snapshot_user(&user_id, date).await {
                Ok(()) => summary.written += 1,
                Err(e) => warn!("skipping snapshot for user {}: {}", user_id, e),
            }
        }

        info!(
            "portfolio snapshot run for {}: wrote {}/{} users",
            date, summary.written, summary.users
        );
        Ok(summary)
    }

    async fn snapshot_user(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let positions = self.positions.list_by_owner(user_id).await?;
        let valuation = self.valuation.value_positions(&positions).await;
        self.history
            .upsert(PortfolioHistory {
                user_id: user_id.to_string(),
                date,
                total_value: valuation.total_value,
            })
            .await
    }

    /// Run the snapshot job forever on a fixed period.
    pub async fn run_daily(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(e) = self.take_snapshots(today).await {
                error!("snapshot run for {} failed: {}", today, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::tests_support::{
        MemoryHistoryRepository, MemoryPositionRepository, StaticUsers,
    };
    use crate::positions::{NewPosition, Position};
    use crate::price_source::PriceSource;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use assetserve_market_data::MarketDataError;

    struct FixedPrice(Decimal);

    #[async_trait]
    impl PriceSource for FixedPrice {
        async fn last_traded_price(
            &self,
            _exchange: &str,
            _symbol: &str,
            _token: &str,
        ) -> std::result::Result<Decimal, MarketDataError> {
            Ok(self.0)
        }

        async fn latest_close(
            &self,
            _exchange: &str,
            _token: &str,
        ) -> std::result::Result<Decimal, MarketDataError> {
            Ok(self.0)
        }
    }

    fn position_for(owner: &str, quantity: Decimal) -> Position {
        Position::from_new(
            owner,
            NewPosition {
                exchange: "NSE".to_string(),
                symbol_token: "3045".to_string(),
                symbol: "SBIN-EQ".to_string(),
                asset_type: "STOCK".to_string(),
                quantity,
                purchase_price: dec!(100),
            },
        )
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn writes_one_snapshot_per_user() {
        let positions = Arc::new(MemoryPositionRepository::default());
        positions.insert(position_for("alice", dec!(2))).await.unwrap();
        positions.insert(position_for("bob", dec!(3))).await.unwrap();

        let history = Arc::new(MemoryHistoryRepository::default());
        let service = SnapshotService::new(
            Arc::new(StaticUsers(vec!["alice".to_string(), "bob".to_string()])),
            positions,
            history.clone(),
            Arc::new(ValuationService::new(Arc::new(FixedPrice(dec!(50))))),
        );

        let summary = service.take_snapshots(date("2025-06-02")).await.unwrap();
        assert_eq!(summary, SnapshotSummary { users: 2, written: 2 });

        let rows = history.snapshots();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_value, dec!(100));
        assert_eq!(rows[1].total_value, dec!(150));
    }

    #[tokio::test]
    async fn one_failing_user_does_not_stop_the_run() {
        let positions = Arc::new(MemoryPositionRepository::default());
        positions.insert(position_for("alice", dec!(1))).await.unwrap();
        positions.insert(position_for("bob", dec!(1))).await.unwrap();

        let history = Arc::new(MemoryHistoryRepository::failing_for(&["alice"]));
        let service = SnapshotService::new(
            Arc::new(StaticUsers(vec!["alice".to_string(), "bob".to_string()])),
            positions,
            history.clone(),
            Arc::new(ValuationService::new(Arc::new(FixedPrice(dec!(50))))),
        );

        let summary = service.take_snapshots(date("2025-06-02")).await.unwrap();
        assert_eq!(summary, SnapshotSummary { users: 2, written: 1 });

        let rows = history.snapshots();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "bob");
    }

    #[tokio::test]
    async fn rerunning_a_day_replaces_rather_than_duplicates() {
        let positions = Arc::new(MemoryPositionRepository::default());
        positions.insert(position_for("alice", dec!(1))).await.unwrap();

        let history = Arc::new(MemoryHistoryRepository::default());
        let service = SnapshotService::new(
            Arc::new(StaticUsers(vec!["alice".to_string()])),
            positions,
            history.clone(),
            Arc::new(ValuationService::new(Arc::new(FixedPrice(dec!(50))))),
        );

        service.take_snapshots(date("2025-06-02")).await.unwrap();
        service.take_snapshots(date("2025-06-02")).await.unwrap();

        assert_eq!(history.snapshots().len(), 1);
    }
}
