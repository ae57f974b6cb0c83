//! Valuation and history models.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

/// Live valuation of one position.
///
/// Derived, recomputed per request, never stored. Invariant:
/// `total_value = current_price * quantity` and
/// `profit_and_loss = total_value - purchase_price * quantity`, all exact
/// decimal arithmetic.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub position_id: String,
    pub symbol: String,
    pub asset_type: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub total_value: Decimal,
    pub profit_and_loss: Decimal,
    /// True when the price fetch failed and `current_price` is a zero
    /// stand-in rather than a live quote. The position is kept in the
    /// result either way.
    pub price_fetch_failed: bool,
}

/// Valuation of a whole portfolio, in position insertion order.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub positions: Vec<ValuationResult>,
    pub total_value: Decimal,
    /// True when at least one position carries a failed price fetch, so a
    /// caller can tell a degraded valuation from a truly empty market.
    pub degraded: bool,
}

/// One materialized aggregate snapshot: the portfolio's total value for a
/// user on a calendar day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHistory {
    pub user_id: String,
    pub date: NaiveDate,
    pub total_value: Decimal,
}

/// Chart ranges for portfolio history queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryRange {
    ThreeMonths,
    SixMonths,
    TwelveMonths,
    All,
}

impl HistoryRange {
    /// Inclusive start date of the range, counted back from `today`.
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        let months = match self {
            HistoryRange::ThreeMonths => 3,
            HistoryRange::SixMonths => 6,
            HistoryRange::TwelveMonths => 12,
            // Effectively unbounded.
            HistoryRange::All => 1200,
        };
        today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Parse the range tag used by the history endpoint; anything
    /// unrecognized falls back to the full history.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "3m" => HistoryRange::ThreeMonths,
            "6m" => HistoryRange::SixMonths,
            "12m" => HistoryRange::TwelveMonths,
            _ => HistoryRange::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_start_dates_count_back_in_months() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(
            HistoryRange::ThreeMonths.start_date(today),
            NaiveDate::from_ymd_opt(2026, 5, 30).unwrap()
        );
        assert_eq!(
            HistoryRange::TwelveMonths.start_date(today),
            NaiveDate::from_ymd_opt(2025, 8, 30).unwrap()
        );
        assert!(HistoryRange::All.start_date(today) < NaiveDate::from_ymd_opt(1950, 1, 1).unwrap());
    }

    #[test]
    fn unknown_range_tags_fall_back_to_all() {
        assert_eq!(HistoryRange::from_tag("3m"), HistoryRange::ThreeMonths);
        assert_eq!(HistoryRange::from_tag("whatever"), HistoryRange::All);
    }
}
