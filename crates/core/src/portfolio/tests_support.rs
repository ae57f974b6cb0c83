//! In-memory repository doubles shared by the service tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;

use crate::errors::{Error, Result};
use crate::portfolio::{PortfolioHistory, PortfolioHistoryRepository, UserDirectory};
use crate::positions::{Position, PositionRepository};

#[derive(Default)]
pub(crate) struct MemoryPositionRepository {
    rows: Mutex<Vec<Position>>,
}

#[async_trait]
impl PositionRepository for MemoryPositionRepository {
    async fn list_by_owner(&self, owner_user_id: &str) -> Result<Vec<Position>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.owner_user_id == owner_user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, position: Position) -> Result<Position> {
        self.rows.lock().unwrap().push(position.clone());
        Ok(position)
    }

    async fn find(&self, id: &str) -> Result<Option<Position>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryHistoryRepository {
    rows: Mutex<Vec<PortfolioHistory>>,
    /// User ids whose writes fail, for error-isolation tests.
    failing_users: Vec<String>,
}

impl MemoryHistoryRepository {
    pub(crate) fn failing_for(users: &[&str]) -> Self {
        Self {
            rows: Mutex::default(),
            failing_users: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<PortfolioHistory> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortfolioHistoryRepository for MemoryHistoryRepository {
    async fn upsert(&self, snapshot: PortfolioHistory) -> Result<()> {
        if self.failing_users.contains(&snapshot.user_id) {
            return Err(Error::Store("disk full".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| !(r.user_id == snapshot.user_id && r.date == snapshot.date));
        rows.push(snapshot);
        Ok(())
    }

    async fn list_since(&self, user_id: &str, start: NaiveDate) -> Result<Vec<PortfolioHistory>> {
        let mut rows: Vec<PortfolioHistory> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.date >= start)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        Ok(rows)
    }
}

pub(crate) struct StaticUsers(pub(crate) Vec<String>);

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn user_ids(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}
