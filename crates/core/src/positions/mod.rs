//! Locally tracked portfolio positions.
//!
//! A [`Position`] is what the user told us they own, with exact decimal
//! quantity and purchase price. It is distinct from the broker-side
//! `Holding` projection served by the market-data crate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;

/// A user-owned position.
///
/// Quantity and purchase price are exact decimals; valuation never touches
/// binary floating point because these values represent money.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub owner_user_id: String,
    pub exchange: String,
    pub symbol_token: String,
    pub symbol: String,
    pub asset_type: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

/// Request payload for adding a position.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub exchange: String,
    pub symbol_token: String,
    pub symbol: String,
    pub asset_type: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

impl Position {
    /// Materialize a new position for the given owner.
    pub fn from_new(owner_user_id: &str, new: NewPosition) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            exchange: new.exchange,
            symbol_token: new.symbol_token,
            symbol: new.symbol,
            asset_type: new.asset_type,
            quantity: new.quantity,
            purchase_price: new.purchase_price,
        }
    }
}

/// Store contract for positions, keyed by owner + id.
///
/// `list_by_owner` must preserve insertion order; valuation results follow
/// that ordering.
#[async_trait]
pub trait PositionRepository: Send + Sync {
    async fn list_by_owner(&self, owner_user_id: &str) -> Result<Vec<Position>>;
    async fn insert(&self, position: Position) -> Result<Position>;
    async fn find(&self, id: &str) -> Result<Option<Position>>;
    async fn delete(&self, id: &str) -> Result<()>;
}
