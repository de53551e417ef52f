//! Data-driven translation between canonical order vocabulary and an
//! exchange's wire vocabulary.
//!
//! Each exchange supplies static tables; the functions here stay generic.

use crate::core::errors::ExchangeError;
use crate::core::types::{OrderSide, OrderStatus, PriceLevel, TimeInForce};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// Native status string -> canonical status.
#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    exchange: &'static str,
    entries: &'static [(&'static str, OrderStatus)],
}

impl StatusTable {
    pub const fn new(
        exchange: &'static str,
        entries: &'static [(&'static str, OrderStatus)],
    ) -> Self {
        Self { exchange, entries }
    }

    pub fn lookup(&self, raw: &str) -> Option<OrderStatus> {
        self.entries
            .iter()
            .find(|(native, _)| native.eq_ignore_ascii_case(raw))
            .map(|(_, status)| *status)
    }

    /// Maps a native status, failing open to `New` for unknown values.
    ///
    /// Polling loops must keep running when an exchange introduces a new
    /// status string, so unknown values are logged and treated as still open.
    pub fn map(&self, raw: &str) -> OrderStatus {
        self.lookup(raw).unwrap_or_else(|| {
            warn!(exchange = self.exchange, status = %raw, "Unmapped order status, defaulting to new");
            OrderStatus::New
        })
    }
}

/// Canonical time-in-force <-> native name.
#[derive(Debug, Clone, Copy)]
pub struct TifTable {
    entries: &'static [(TimeInForce, &'static str)],
}

impl TifTable {
    pub const fn new(entries: &'static [(TimeInForce, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn to_exchange(&self, tif: TimeInForce) -> &'static str {
        self.entries
            .iter()
            .find(|(canonical, _)| *canonical == tif)
            .or_else(|| self.entries.first())
            .map_or("GTC", |(_, native)| *native)
    }

    /// Unknown native names fall back to GTC.
    pub fn from_exchange(&self, raw: &str) -> TimeInForce {
        self.entries
            .iter()
            .find(|(_, native)| native.eq_ignore_ascii_case(raw))
            .map_or_else(|| TimeInForce::parse_or_default(raw), |(tif, _)| *tif)
    }
}

/// Per-side value of an exchange's stop-direction field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopConvention {
    pub buy: &'static str,
    pub sell: &'static str,
}

impl StopConvention {
    pub const fn direction(&self, side: OrderSide) -> &'static str {
        match side {
            OrderSide::Buy => self.buy,
            OrderSide::Sell => self.sell,
        }
    }
}

/// Order vocabulary of one exchange
#[derive(Debug, Clone, Copy)]
pub struct OrderVocabulary {
    pub statuses: StatusTable,
    pub time_in_force: TifTable,
    /// `None` when the exchange has no stop-direction field
    pub stop: Option<StopConvention>,
}

/// Average execution price from aggregate fill value.
///
/// Returns `None` when nothing has been filled.
pub fn executed_price(notional: Decimal, filled_quantity: Decimal) -> Option<Decimal> {
    if filled_quantity.is_zero() {
        return None;
    }
    notional.checked_div(filled_quantity)
}

/// Parses a numeric wire string, failing loudly instead of defaulting to zero.
pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, ExchangeError> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| ExchangeError::ParseError(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Like [`parse_decimal`], treating absent or empty strings as `None`.
pub fn parse_optional_decimal(
    field: &str,
    value: Option<&str>,
) -> Result<Option<Decimal>, ExchangeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_decimal(field, v).map(Some),
    }
}

pub fn parse_rfc3339(field: &str, value: &str) -> Result<DateTime<Utc>, ExchangeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ExchangeError::ParseError(format!("Invalid {} '{}': {}", field, value, e)))
}

pub fn parse_epoch_millis(field: &str, value: &str) -> Result<DateTime<Utc>, ExchangeError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| ExchangeError::ParseError(format!("Invalid {} '{}'", field, value)))
}

/// Percentage change from `open` to `last`; zero when there is no open price.
///
/// Overflow means the exchange sent prices no real market trades at, so it
/// is reported as a `ParseError` rather than a number.
pub fn change_percent(last: Decimal, open: Decimal) -> Result<Decimal, ExchangeError> {
    if open.is_zero() {
        return Ok(Decimal::ZERO);
    }
    last.checked_sub(open)
        .and_then(|delta| delta.checked_div(open))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|d| d.normalize())
        .ok_or_else(|| {
            ExchangeError::ParseError(format!(
                "24h change from open {} to last {} is out of range",
                open, last
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bids,
    Asks,
}

pub fn parse_price_level(price: &str, size: &str) -> Result<PriceLevel, ExchangeError> {
    Ok(PriceLevel {
        price: parse_decimal("book price", price)?,
        size: parse_decimal("book size", size)?,
    })
}

/// Orders one side of a book best price first and keeps at most `limit` levels.
pub fn finish_book_side(
    mut levels: Vec<PriceLevel>,
    side: BookSide,
    limit: usize,
) -> Vec<PriceLevel> {
    match side {
        BookSide::Bids => levels.sort_by(|a, b| b.price.cmp(&a.price)),
        BookSide::Asks => levels.sort_by(|a, b| a.price.cmp(&b.price)),
    }
    levels.truncate(limit);
    levels
}
