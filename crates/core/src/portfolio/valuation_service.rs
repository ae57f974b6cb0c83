//! Live valuation of locally tracked positions.

use log::warn;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::portfolio::{PortfolioValuation, ValuationResult};
use crate::positions::Position;
use crate::price_source::PriceSource;

/// Combines positions with live prices into per-position and aggregate
/// valuation.
pub struct ValuationService {
    prices: Arc<dyn PriceSource>,
}

impl ValuationService {
    pub fn new(prices: Arc<dyn PriceSource>) -> Self {
        Self { prices }
    }

    /// Value the given positions, preserving their order.
    ///
    /// One price fetch per position, through the [`PriceSource`] seam. A
    /// failed fetch values the position at zero and marks it (and the
    /// aggregate) as degraded instead of omitting it: the dashboard keeps
    /// rendering every row.
    pub async fn value_positions(&self, positions: &[Position]) -> PortfolioValuation {
        let mut results = Vec::with_capacity(positions.len());
        let mut total_value = Decimal::ZERO;
        let mut degraded = false;

        for position in positions {
            let (current_price, price_fetch_failed) = match self
                .prices
                .last_traded_price(&position.exchange, &position.symbol, &position.symbol_token)
                .await
            {
                Ok(price) => (price, false),
                Err(e) => {
                    warn!(
                        "price fetch failed for position {} ({}): {}",
                        position.id, position.symbol, e
                    );
                    degraded = true;
                    (Decimal::ZERO, true)
                }
            };

            let value = current_price * position.quantity;
            let cost_basis = position.purchase_price * position.quantity;
            let profit_and_loss = value - cost_basis;
            total_value += value;

            results.push(ValuationResult {
                position_id: position.id.clone(),
                symbol: position.symbol.clone(),
                asset_type: position.asset_type.clone(),
                quantity: position.quantity,
                purchase_price: position.purchase_price,
                current_price,
                total_value: value,
                profit_and_loss,
                price_fetch_failed,
            });
        }

        PortfolioValuation {
            positions: results,
            total_value,
            degraded,
        }
    }
}
