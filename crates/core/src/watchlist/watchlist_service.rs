//! Watchlist CRUD with refresh-on-read pricing.
//!
//! Every read re-fetches the current price for each entry and writes it
//! back before returning, so the stored LTP is always the freshest one the
//! upstream would give us. When a fetch fails the previously stored price
//! is kept and the failure is logged.

use log::warn;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::price_source::PriceSource;
use crate::watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistRepository, WatchlistUpdate};

/// Watchlist instruments carry bare tokens; the upstream exchange segment
/// is fixed, matching how entries are captured in the first place.
const WATCHLIST_EXCHANGE: &str = "NSE";

pub struct WatchlistService {
    entries: Arc<dyn WatchlistRepository>,
    prices: Arc<dyn PriceSource>,
}

impl WatchlistService {
    pub fn new(entries: Arc<dyn WatchlistRepository>, prices: Arc<dyn PriceSource>) -> Self {
        Self { entries, prices }
    }

    /// Add an instrument to the owner's watchlist.
    ///
    /// Rejects a token the owner already watches. The initial price fetch
    /// is best-effort: on failure the entry is stored without an LTP.
    pub async fn add(
        &self,
        owner_user_id: &str,
        new: NewWatchlistEntry,
    ) -> Result<WatchlistEntry> {
        if self.entries.exists(owner_user_id, &new.symbol_token).await? {
            return Err(Error::Validation(format!(
                "symbol token {} is already in the watchlist",
                new.symbol_token
            )));
        }

        let current_ltp = self.fetch_price(&new.symbol_token).await;
        self.entries
            .upsert(WatchlistEntry {
                owner_user_id: owner_user_id.to_string(),
                symbol_token: new.symbol_token,
                symbol_name: new.symbol_name,
                current_ltp,
                target_price: new.target_price,
                notes: new.notes,
            })
            .await
    }

    /// The owner's watchlist with refreshed prices.
    ///
    /// Each entry's price is re-fetched and persisted before the list is
    /// returned; an entry whose fetch fails keeps its stored price.
    pub async fn list(&self, owner_user_id: &str) -> Result<Vec<WatchlistEntry>> {
        let stored = self.entries.list_by_owner(owner_user_id).await?;
        let mut refreshed = Vec::with_capacity(stored.len());

        for mut entry in stored {
            if let Some(ltp) = self.fetch_price(&entry.symbol_token).await {
                entry.current_ltp = Some(ltp);
                entry = self.entries.upsert(entry).await?;
            }
            refreshed.push(entry);
        }

        Ok(refreshed)
    }

    /// Update target price and/or notes for a watched token, refreshing
    /// its price along the way.
    pub async fn update(
        &self,
        owner_user_id: &str,
        symbol_token: &str,
        update: WatchlistUpdate,
    ) -> Result<WatchlistEntry> {
        let mut entry = self
            .entries
            .find(owner_user_id, symbol_token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("watchlist entry {}", symbol_token)))?;

        if let Some(target_price) = update.target_price {
            entry.target_price = target_price;
        }
        if let Some(notes) = update.notes {
            entry.notes = Some(notes);
        }
        if let Some(ltp) = self.fetch_price(symbol_token).await {
            entry.current_ltp = Some(ltp);
        }

        self.entries.upsert(entry).await
    }

    /// Remove a watched token from the owner's list.
    pub async fn remove(&self, owner_user_id: &str, symbol_token: &str) -> Result<()> {
        if !self.entries.exists(owner_user_id, symbol_token).await? {
            return Err(Error::NotFound(format!(
                "watchlist entry {}",
                symbol_token
            )));
        }
        self.entries.delete(owner_user_id, symbol_token).await
    }

    async fn fetch_price(&self, symbol_token: &str) -> Option<rust_decimal::Decimal> {
        match self
            .prices
            .latest_close(WATCHLIST_EXCHANGE, symbol_token)
            .await
        {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(
                    "keeping stored price for watchlist token {}: {}",
                    symbol_token, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assetserve_market_data::MarketDataError;

    #[derive(Default)]
    struct MemoryWatchlist {
        rows: Mutex<Vec<WatchlistEntry>>,
    }

    #[async_trait]
    impl WatchlistRepository for MemoryWatchlist {
        async fn list_by_owner(&self, owner_user_id: &str) -> Result<Vec<WatchlistEntry>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.owner_user_id == owner_user_id)
                .cloned()
                .collect())
        }

        async fn find(
            &self,
            owner_user_id: &str,
            symbol_token: &str,
        ) -> Result<Option<WatchlistEntry>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.owner_user_id == owner_user_id && e.symbol_token == symbol_token)
                .cloned())
        }

        async fn exists(&self, owner_user_id: &str, symbol_token: &str) -> Result<bool> {
            Ok(self.find(owner_user_id, symbol_token).await?.is_some())
        }

        async fn upsert(&self, entry: WatchlistEntry) -> Result<WatchlistEntry> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|e| {
                e.owner_user_id == entry.owner_user_id && e.symbol_token == entry.symbol_token
            }) {
                Some(existing) => *existing = entry.clone(),
                None => rows.push(entry.clone()),
            }
            Ok(entry)
        }

        async fn delete(&self, owner_user_id: &str, symbol_token: &str) -> Result<()> {
            self.rows.lock().unwrap().retain(|e| {
                !(e.owner_user_id == owner_user_id && e.symbol_token == symbol_token)
            });
            Ok(())
        }
    }

    struct TablePrices {
        by_token: HashMap<&'static str, Decimal>,
    }

    #[async_trait]
    impl PriceSource for TablePrices {
        async fn last_traded_price(
            &self,
            _exchange: &str,
            _symbol: &str,
            token: &str,
        ) -> std::result::Result<Decimal, MarketDataError> {
            self.latest_close("NSE", token).await
        }

        async fn latest_close(
            &self,
            _exchange: &str,
            token: &str,
        ) -> std::result::Result<Decimal, MarketDataError> {
            self.by_token.get(token).copied().ok_or_else(|| {
                MarketDataError::UpstreamUnavailable(format!("no price for {}", token))
            })
        }
    }

    fn service(prices: &[(&'static str, Decimal)]) -> (WatchlistService, Arc<MemoryWatchlist>) {
        let repository = Arc::new(MemoryWatchlist::default());
        let service = WatchlistService::new(
            repository.clone(),
            Arc::new(TablePrices {
                by_token: prices.iter().copied().collect(),
            }),
        );
        (service, repository)
    }

    fn new_entry(token: &str) -> NewWatchlistEntry {
        NewWatchlistEntry {
            symbol_token: token.to_string(),
            symbol_name: "SBIN-EQ".to_string(),
            target_price: dec!(700),
            notes: None,
        }
    }

    #[tokio::test]
    async fn add_captures_the_current_price() {
        let (service, _) = service(&[("3045", dec!(791.85))]);
        let entry = service.add("user-1", new_entry("3045")).await.unwrap();
        assert_eq!(entry.current_ltp, Some(dec!(791.85)));
        assert_eq!(entry.target_price, dec!(700));
    }

    #[tokio::test]
    async fn duplicate_tokens_are_rejected() {
        let (service, _) = service(&[("3045", dec!(791.85))]);
        service.add("user-1", new_entry("3045")).await.unwrap();
        assert!(matches!(
            service.add("user-1", new_entry("3045")).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn list_refreshes_and_persists_prices() {
        let (service, repository) = service(&[("3045", dec!(800))]);
        repository
            .upsert(WatchlistEntry {
                owner_user_id: "user-1".to_string(),
                symbol_token: "3045".to_string(),
                symbol_name: "SBIN-EQ".to_string(),
                current_ltp: Some(dec!(750)),
                target_price: dec!(700),
                notes: None,
            })
            .await
            .unwrap();

        let listed = service.list("user-1").await.unwrap();
        assert_eq!(listed[0].current_ltp, Some(dec!(800)));

        // The refreshed price was written back, not just returned.
        let stored = repository.find("user-1", "3045").await.unwrap().unwrap();
        assert_eq!(stored.current_ltp, Some(dec!(800)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_stored_price() {
        let (service, repository) = service(&[]);
        repository
            .upsert(WatchlistEntry {
                owner_user_id: "user-1".to_string(),
                symbol_token: "3045".to_string(),
                symbol_name: "SBIN-EQ".to_string(),
                current_ltp: Some(dec!(750)),
                target_price: dec!(700),
                notes: None,
            })
            .await
            .unwrap();

        let listed = service.list("user-1").await.unwrap();
        assert_eq!(listed[0].current_ltp, Some(dec!(750)));
    }

    #[tokio::test]
    async fn update_applies_partial_fields_and_refreshes() {
        let (service, _) = service(&[("3045", dec!(810))]);
        service.add("user-1", new_entry("3045")).await.unwrap();

        let updated = service
            .update(
                "user-1",
                "3045",
                WatchlistUpdate {
                    target_price: Some(dec!(720)),
                    notes: Some("buy the dip".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.target_price, dec!(720));
        assert_eq!(updated.notes.as_deref(), Some("buy the dip"));
        assert_eq!(updated.current_ltp, Some(dec!(810)));
    }

    #[tokio::test]
    async fn remove_is_scoped_to_the_owner() {
        let (service, repository) = service(&[("3045", dec!(800))]);
        service.add("user-1", new_entry("3045")).await.unwrap();
        service.add("user-2", new_entry("3045")).await.unwrap();

        service.remove("user-1", "3045").await.unwrap();
        assert!(repository.find("user-1", "3045").await.unwrap().is_none());
        assert!(repository.find("user-2", "3045").await.unwrap().is_some());

        assert!(matches!(
            service.remove("user-1", "3045").await,
            Err(Error::NotFound(_))
        ));
    }
}
