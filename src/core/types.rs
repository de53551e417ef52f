use crate::core::errors::ExchangeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection lifecycle state of a connector instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop | Self::StopLimit)
    }

    pub const fn requires_price(self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    GTC, // Good Till Canceled
    IOC, // Immediate or Cancel
    FOK, // Fill or Kill
}

impl TimeInForce {
    /// Parses a time-in-force name, falling back to GTC for anything unrecognized.
    pub fn parse_or_default(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "IOC" => Self::IOC,
            "FOK" => Self::FOK,
            _ => Self::GTC,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GTC => "GTC",
            Self::IOC => "IOC",
            Self::FOK => "FOK",
        }
    }
}

/// Canonical order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    pub const fn is_open(self) -> bool {
        matches!(self, Self::New | Self::PartiallyFilled)
    }
}

/// Order placement request in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: Option<String>,
}

impl OrderParams {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: None,
            client_order_id: None,
        }
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            price: Some(price),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn stop(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::Stop,
            stop_price: Some(stop_price),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn stop_limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::StopLimit,
            price: Some(price),
            stop_price: Some(stop_price),
            ..Self::market(symbol, side, quantity)
        }
    }

    #[must_use]
    pub const fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    #[must_use]
    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.client_order_id = Some(client_order_id.into());
        self
    }

    /// Checks the parameters an exchange would otherwise reject after a round trip.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.symbol.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "symbol must not be empty".to_string(),
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.order_type.requires_price() {
            match self.price {
                Some(price) if price > Decimal::ZERO => {}
                _ => {
                    return Err(ExchangeError::InvalidParameters(
                        "a positive price is required for limit orders".to_string(),
                    ))
                }
            }
        }
        if self.order_type.is_stop() {
            match self.stop_price {
                Some(stop) if stop > Decimal::ZERO => {}
                _ => {
                    return Err(ExchangeError::InvalidParameters(
                        "a positive stop price is required for stop orders".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Order state as reported by the exchange, in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    /// Exchange-reported; not checked against `quantity`
    pub executed_quantity: Decimal,
    /// `None` whenever nothing has been executed
    pub executed_price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticker plus 24h statistics, assembled from one consistent fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    pub symbol: String,
    pub exchange: String,
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume_24h: Decimal,
    /// Percentage change from the 24h open
    pub change_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Order book snapshot, best price first on both sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<Balance>,
    pub permissions: Vec<String>,
}

impl AccountInfo {
    /// Builds account info, dropping assets with nothing free or locked.
    pub fn from_balances(balances: Vec<Balance>, permissions: Vec<String>) -> Self {
        Self {
            balances: balances
                .into_iter()
                .filter(|b| !b.total().is_zero())
                .collect(),
            permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_time_in_force_defaults_to_gtc() {
        assert_eq!(TimeInForce::parse_or_default("ioc"), TimeInForce::IOC);
        assert_eq!(TimeInForce::parse_or_default("FOK"), TimeInForce::FOK);
        assert_eq!(TimeInForce::parse_or_default("GTD"), TimeInForce::GTC);
        assert_eq!(TimeInForce::parse_or_default(""), TimeInForce::GTC);
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let order = OrderParams::market("BTCUSD", OrderSide::Buy, dec!(0));
        assert!(matches!(
            order.validate(),
            Err(ExchangeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_validate_requires_prices() {
        let mut limit = OrderParams::limit("BTCUSD", OrderSide::Buy, dec!(1), dec!(100));
        assert!(limit.validate().is_ok());
        limit.price = None;
        assert!(limit.validate().is_err());

        let mut stop = OrderParams::stop("BTCUSD", OrderSide::Sell, dec!(1), dec!(90));
        assert!(stop.validate().is_ok());
        stop.stop_price = None;
        assert!(stop.validate().is_err());

        let stop_limit =
            OrderParams::stop_limit("ETHUSD", OrderSide::Sell, dec!(1), dec!(3000), dec!(3100));
        assert!(stop_limit.validate().is_ok());
    }

    #[test]
    fn test_account_info_filters_empty_balances() {
        let info = AccountInfo::from_balances(
            vec![
                Balance {
                    asset: "BTC".to_string(),
                    free: dec!(0.5),
                    locked: dec!(0),
                },
                Balance {
                    asset: "ETH".to_string(),
                    free: dec!(0),
                    locked: dec!(0),
                },
                Balance {
                    asset: "USD".to_string(),
                    free: dec!(0),
                    locked: dec!(10),
                },
            ],
            vec!["view".to_string()],
        );
        let assets: Vec<_> = info.balances.iter().map(|b| b.asset.as_str()).collect();
        assert_eq!(assets, vec!["BTC", "USD"]);
    }
}
