//! Defensive parsing of upstream payloads.
//!
//! SmartAPI response shapes are inconsistent and occasionally malformed:
//! numeric fields go missing, arrive as strings, or nest differently per
//! endpoint. Everything in this module is a pure transformation from
//! `serde_json::Value` into the typed records in [`crate::models`], with one
//! hard rule: NaN and infinity are used as internal sentinels only and are
//! sanitized to `0.0` before any value crosses the module boundary.

use chrono::DateTime;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{Candle, Holding, IndexQuote, MarketTrend, PutCallRatio};

/// Division guard: percent change is only derived when the close is at
/// least this far from zero.
const CLOSE_EPSILON: f64 = 1e-4;

/// Replace non-finite values with zero.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Extract a numeric field, returning the NaN sentinel when the field is
/// missing or non-numeric. Upstream sometimes sends numbers as strings, so
/// those are accepted too.
pub fn field_num(obj: &Value, key: &str) -> f64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Extract a string field with an empty-string default.
pub fn field_str(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Validate the `{status, data}` envelope and return the `data` payload.
pub fn envelope(body: &Value) -> Result<&Value, MarketDataError> {
    if body.get("status").and_then(Value::as_bool) != Some(true) {
        return Err(MarketDataError::MalformedResponse(format!(
            "upstream returned error status: {}",
            body.get("message").and_then(Value::as_str).unwrap_or("?")
        )));
    }
    match body.get("data") {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(MarketDataError::MalformedResponse(
            "response has no data field".to_string(),
        )),
    }
}

/// Extract a last traded price from an LTP-mode quote response.
///
/// Accepts the documented `data.fetched[0].ltp` shape as well as the older
/// `data.ltp` and bare `ltp` shapes seen in the wild.
pub fn parse_ltp(body: &Value) -> Result<f64, MarketDataError> {
    let candidates = [
        body.pointer("/data/fetched/0"),
        body.get("data"),
        Some(body),
    ];
    for obj in candidates.into_iter().flatten() {
        let ltp = field_num(obj, "ltp");
        if !ltp.is_nan() {
            return Ok(sanitize(ltp));
        }
    }
    Err(MarketDataError::MalformedResponse(
        "no ltp field in quote response".to_string(),
    ))
}

/// Build a sanitized, fully derived quote from one FULL-mode record.
///
/// Missing `netChange`/`percentChange` are derived from ltp and close when
/// both are finite; the trend classifies the (possibly NaN) change before
/// sanitization so an unknown change stays neutral.
pub fn quote_from_value(name: &str, obj: &Value) -> IndexQuote {
    let ltp = field_num(obj, "ltp");
    let open = field_num(obj, "open");
    let high = field_num(obj, "high");
    let low = field_num(obj, "low");
    let close = field_num(obj, "close");

    let mut change = field_num(obj, "netChange");
    if change.is_nan() {
        change = field_num(obj, "change");
    }
    if change.is_nan() && ltp.is_finite() && close.is_finite() {
        change = ltp - close;
    }

    let mut percent_change = field_num(obj, "percentChange");
    if percent_change.is_nan() && change.is_finite() && close.abs() > CLOSE_EPSILON {
        percent_change = change / close * 100.0;
    }

    let trend = MarketTrend::from_change(change);

    IndexQuote {
        name: name.to_string(),
        ltp: sanitize(ltp),
        open: sanitize(open),
        high: sanitize(high),
        low: sanitize(low),
        close: sanitize(close),
        change: sanitize(change),
        percent_change: sanitize(percent_change),
        trend,
    }
}

/// Records of a FULL-mode quote response as (symbolToken, record) pairs.
pub fn parse_full_quote_records(body: &Value) -> Result<Vec<(String, Value)>, MarketDataError> {
    let data = envelope(body)?;
    let fetched = data
        .get("fetched")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MarketDataError::MalformedResponse("quote response has no fetched array".to_string())
        })?;

    Ok(fetched
        .iter()
        .filter_map(|record| {
            let token = field_str(record, "symbolToken");
            if token.is_empty() {
                None
            } else {
                Some((token, record.clone()))
            }
        })
        .collect())
}

/// Parse an ordered candle series. Malformed rows are skipped, upstream
/// order is preserved.
pub fn parse_candles(body: &Value) -> Result<Vec<Candle>, MarketDataError> {
    let data = envelope(body)?;
    let rows = data.as_array().ok_or_else(|| {
        MarketDataError::MalformedResponse("candle data is not an array".to_string())
    })?;

    Ok(rows.iter().filter_map(candle_from_row).collect())
}

fn candle_from_row(row: &Value) -> Option<Candle> {
    let cells = row.as_array()?;
    if cells.len() < 6 {
        return None;
    }
    let timestamp = DateTime::parse_from_rfc3339(cells[0].as_str()?).ok()?;
    let volume = cells[5]
        .as_u64()
        .or_else(|| cells[5].as_f64().map(|v| v.max(0.0) as u64))
        .unwrap_or(0);

    let cell_num = |cell: &Value| sanitize(cell.as_f64().unwrap_or(f64::NAN));

    Some(Candle {
        timestamp,
        open: cell_num(&cells[1]),
        high: cell_num(&cells[2]),
        low: cell_num(&cells[3]),
        close: cell_num(&cells[4]),
        volume,
    })
}

/// Parse the `data.holdings` array of a holdings response.
pub fn parse_holdings(body: &Value) -> Result<Vec<Holding>, MarketDataError> {
    let data = envelope(body)?;
    let holdings = data
        .get("holdings")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MarketDataError::MalformedResponse("response has no holdings array".to_string())
        })?;

    Ok(holdings
        .iter()
        .map(|record| Holding {
            trading_symbol: field_str(record, "tradingsymbol"),
            symbol_token: field_str(record, "symboltoken"),
            quantity: sanitize(field_num(record, "quantity")) as i64,
            average_price: sanitize(field_num(record, "averageprice")),
            ltp: sanitize(field_num(record, "ltp")),
            pnl: sanitize(field_num(record, "profitandloss")),
            pnl_percent: sanitize(field_num(record, "pnlpercentage")),
        })
        .collect())
}

/// Parse a put/call ratio response. Entries without a trading symbol are
/// dropped.
pub fn parse_put_call_ratios(body: &Value) -> Result<Vec<PutCallRatio>, MarketDataError> {
    let data = envelope(body)?;
    let rows = data.as_array().ok_or_else(|| {
        MarketDataError::MalformedResponse("pcr data is not an array".to_string())
    })?;

    Ok(rows
        .iter()
        .filter_map(|record| {
            let trading_symbol = field_str(record, "tradingSymbol");
            if trading_symbol.is_empty() {
                return None;
            }
            Some(PutCallRatio {
                trading_symbol,
                pcr: sanitize(field_num(record, "pcr")),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_never_leaks_non_finite_values() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(42.5), 42.5);
    }

    #[test]
    fn field_num_accepts_strings_and_flags_garbage() {
        let obj = json!({"a": 1.5, "b": "2.25", "c": "oops", "d": null});
        assert_eq!(field_num(&obj, "a"), 1.5);
        assert_eq!(field_num(&obj, "b"), 2.25);
        assert!(field_num(&obj, "c").is_nan());
        assert!(field_num(&obj, "d").is_nan());
        assert!(field_num(&obj, "missing").is_nan());
    }

    #[test]
    fn change_and_percent_are_derived_when_absent() {
        let quote = quote_from_value("NIFTY 50", &json!({"ltp": 105.0, "close": 100.0}));
        assert_eq!(quote.change, 5.0);
        assert_eq!(quote.percent_change, 5.0);
        assert_eq!(quote.trend, MarketTrend::Up);
    }

    #[test]
    fn upstream_change_fields_win_over_derivation() {
        let quote = quote_from_value(
            "NIFTY 50",
            &json!({"ltp": 105.0, "close": 100.0, "netChange": 4.0, "percentChange": 4.1}),
        );
        assert_eq!(quote.change, 4.0);
        assert_eq!(quote.percent_change, 4.1);
    }

    #[test]
    fn absent_ltp_sanitizes_to_zero() {
        let quote = quote_from_value("SENSEX", &json!({"close": "not-a-number"}));
        assert_eq!(quote.ltp, 0.0);
        assert_eq!(quote.close, 0.0);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.trend, MarketTrend::Neutral);
        assert!(quote.percent_change.is_finite());
    }

    #[test]
    fn percent_change_guards_near_zero_close() {
        let quote = quote_from_value("X", &json!({"ltp": 5.0, "close": 0.00001}));
        // Derived change is ~5, but the close is inside the division guard.
        assert_eq!(quote.percent_change, 0.0);
        assert_eq!(quote.trend, MarketTrend::Up);
    }

    #[test]
    fn parse_ltp_handles_all_observed_shapes() {
        let full = json!({"status": true, "data": {"fetched": [{"ltp": 101.5}]}});
        let nested = json!({"data": {"ltp": 102.5}});
        let bare = json!({"ltp": "103.5"});
        assert_eq!(parse_ltp(&full).unwrap(), 101.5);
        assert_eq!(parse_ltp(&nested).unwrap(), 102.5);
        assert_eq!(parse_ltp(&bare).unwrap(), 103.5);
        assert!(parse_ltp(&json!({"data": {}})).is_err());
    }

    #[test]
    fn envelope_rejects_error_status_and_null_data() {
        assert!(envelope(&json!({"status": false, "message": "closed"})).is_err());
        assert!(envelope(&json!({"status": true, "data": null})).is_err());
        assert!(envelope(&json!({"status": true, "data": []})).is_ok());
    }

    #[test]
    fn candles_preserve_order_and_skip_malformed_rows() {
        let body = json!({
            "status": true,
            "data": [
                ["2024-01-02T09:15:00+05:30", 100.0, 101.0, 99.5, 100.5, 1200],
                ["garbage-timestamp", 1, 2, 3, 4, 5],
                ["2024-01-02T09:16:00+05:30", 100.5, 102.0, 100.0, 101.5, 800],
                [1, 2, 3]
            ]
        });
        let candles = parse_candles(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 100.5);
        assert_eq!(candles[1].close, 101.5);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[0].volume, 1200);
    }

    #[test]
    fn holdings_parse_with_defaults_for_missing_fields() {
        let body = json!({
            "status": true,
            "data": {"holdings": [
                {"tradingsymbol": "TCS-EQ", "symboltoken": "11536", "quantity": 4,
                 "averageprice": 3500.25, "ltp": 3600.0, "profitandloss": 399.0,
                 "pnlpercentage": 2.85},
                {"tradingsymbol": "INFY-EQ"}
            ]}
        });
        let holdings = parse_holdings(&body).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].quantity, 4);
        assert_eq!(holdings[1].symbol_token, "");
        assert_eq!(holdings[1].ltp, 0.0);
    }

    #[test]
    fn pcr_entries_without_symbol_are_dropped() {
        let body = json!({
            "status": true,
            "data": [
                {"pcr": 1.02, "tradingSymbol": "NIFTY25JANFUT"},
                {"pcr": 0.5}
            ]
        });
        let ratios = parse_put_call_ratios(&body).unwrap();
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].trading_symbol, "NIFTY25JANFUT");
    }

    #[test]
    fn full_quote_records_are_keyed_by_token() {
        let body = json!({
            "status": true,
            "data": {"fetched": [
                {"symbolToken": "99926000", "ltp": 21000.0},
                {"ltp": 1.0}
            ]}
        });
        let records = parse_full_quote_records(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "99926000");
    }
}
