//! Position CRUD with ownership enforcement, plus valued-portfolio and
//! history reads.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::portfolio::{
    HistoryRange, PortfolioHistory, PortfolioHistoryRepository, PortfolioValuation,
    ValuationService,
};
use crate::positions::{NewPosition, Position, PositionRepository};

/// User-facing portfolio operations.
///
/// These are the only operations that surface errors to users: a missing
/// position or an ownership mismatch is a real failure, while market-data
/// unavailability merely degrades the valuation.
pub struct PortfolioService {
    positions: Arc<dyn PositionRepository>,
    history: Arc<dyn PortfolioHistoryRepository>,
    valuation: Arc<ValuationService>,
}

impl PortfolioService {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        history: Arc<dyn PortfolioHistoryRepository>,
        valuation: Arc<ValuationService>,
    ) -> Self {
        Self {
            positions,
            history,
            valuation,
        }
    }

    /// Add a position for the given owner.
    pub async fn add_position(&self, owner_user_id: &str, new: NewPosition) -> Result<Position> {
        if new.quantity <= Decimal::ZERO {
            return Err(Error::Validation("quantity must be positive".to_string()));
        }
        if new.purchase_price < Decimal::ZERO {
            return Err(Error::Validation(
                "purchase price cannot be negative".to_string(),
            ));
        }
        self.positions
            .insert(Position::from_new(owner_user_id, new))
            .await
    }

    /// The owner's portfolio with live valuation, in insertion order.
    pub async fn valued_portfolio(&self, owner_user_id: &str) -> Result<PortfolioValuation> {
        let positions = self.positions.list_by_owner(owner_user_id).await?;
        Ok(self.valuation.value_positions(&positions).await)
    }

    /// Delete a position. Only the owner may delete it.
    pub async fn delete_position(&self, owner_user_id: &str, position_id: &str) -> Result<()> {
        let position = self
            .positions
            .find(position_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("position {}", position_id)))?;

        if position.owner_user_id != owner_user_id {
            return Err(Error::Forbidden(
                "position belongs to a different user".to_string(),
            ));
        }

        self.positions.delete(position_id).await
    }

    /// Snapshot history for the chart, ascending by date.
    pub async fn history(
        &self,
        owner_user_id: &str,
        range: HistoryRange,
    ) -> Result<Vec<PortfolioHistory>> {
        let start = range.start_date(Utc::now().date_naive());
        self.history.list_since(owner_user_id, start).await
    }
}
