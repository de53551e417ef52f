use super::types::{
    CoinbaseAccount, CoinbaseOrder, CoinbaseOrderBook, CoinbaseOrderRequest, CoinbaseStats,
    CoinbaseTicker,
};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    extract_error_message, ErrorClassifier, HeaderNames, KeyEncoding, SigningScheme,
    TimestampFormat,
};
use crate::core::mapping::{
    self, BookSide, OrderVocabulary, StatusTable, StopConvention, TifTable,
};
use crate::core::symbols::SymbolFormat;
use crate::core::types::{
    AccountInfo, Balance, MarketData, OrderBook, OrderParams, OrderResult, OrderSide,
    OrderStatus, OrderType, PriceLevel, TimeInForce,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

pub const EXCHANGE: &str = "coinbase";

/// Quote currencies in match priority order
pub const COINBASE_SYMBOLS: SymbolFormat = SymbolFormat::new(
    "-",
    &["USD", "USDT", "USDC", "DAI", "BTC", "ETH", "EUR", "GBP"],
);

pub const COINBASE_SIGNING: SigningScheme = SigningScheme {
    headers: HeaderNames {
        api_key: "CB-ACCESS-KEY",
        signature: "CB-ACCESS-SIGN",
        timestamp: "CB-ACCESS-TIMESTAMP",
        passphrase: Some("CB-ACCESS-PASSPHRASE"),
    },
    key_encoding: KeyEncoding::Base64,
    timestamp_format: TimestampFormat::EpochSeconds,
};

pub const COINBASE_ORDERS: OrderVocabulary = OrderVocabulary {
    statuses: StatusTable::new(
        EXCHANGE,
        &[
            ("pending", OrderStatus::New),
            ("received", OrderStatus::New),
            ("open", OrderStatus::New),
            ("active", OrderStatus::New),
            ("done", OrderStatus::Filled),
            ("filled", OrderStatus::Filled),
            ("canceled", OrderStatus::Canceled),
            ("rejected", OrderStatus::Rejected),
        ],
    ),
    time_in_force: TifTable::new(&[
        (TimeInForce::GTC, "GTC"),
        (TimeInForce::IOC, "IOC"),
        (TimeInForce::FOK, "FOK"),
    ]),
    stop: Some(StopConvention {
        buy: "entry",
        sell: "loss",
    }),
};

/// Open-order statuses requested from `GET /orders`
pub const OPEN_ORDER_STATUSES: &[&str] = &["open", "pending", "active"];

/// Recognises Coinbase's clock-skew rejection
///
/// Coinbase answers a stale `CB-ACCESS-TIMESTAMP` with 400/401 and a message
/// mentioning the timestamp; there is no dedicated error code.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinbaseClassifier;

impl ErrorClassifier for CoinbaseClassifier {
    fn classify(&self, status: u16, body: &str) -> Option<ExchangeError> {
        if !matches!(status, 400 | 401) {
            return None;
        }
        let message = extract_error_message(body)?;
        message
            .to_ascii_lowercase()
            .contains("timestamp")
            .then(|| ExchangeError::TimestampRejected(message))
    }
}

pub fn to_product_id(symbol: &str) -> String {
    COINBASE_SYMBOLS.denormalize(symbol)
}

pub fn from_product_id(product_id: &str) -> String {
    COINBASE_SYMBOLS.normalize(product_id)
}

pub fn order_request(params: &OrderParams, client_oid: &str) -> CoinbaseOrderRequest {
    let stop = COINBASE_ORDERS
        .stop
        .filter(|_| params.order_type.is_stop())
        .map(|convention| convention.direction(params.side).to_string());

    let is_limit = params.order_type.requires_price();
    let time_in_force = params
        .time_in_force
        .filter(|_| is_limit)
        .map(|tif| COINBASE_ORDERS.time_in_force.to_exchange(tif).to_string());

    CoinbaseOrderRequest {
        product_id: to_product_id(&params.symbol),
        side: params.side.to_string(),
        order_type: if is_limit { "limit" } else { "market" }.to_string(),
        size: params.quantity.to_string(),
        price: params.price.filter(|_| is_limit).map(|p| p.to_string()),
        stop,
        stop_price: params
            .stop_price
            .filter(|_| params.order_type.is_stop())
            .map(|p| p.to_string()),
        time_in_force,
        client_oid: client_oid.to_string(),
    }
}

fn parse_side(raw: &str) -> Result<OrderSide, ExchangeError> {
    match raw {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => Err(ExchangeError::ParseError(format!(
            "Unknown order side '{}'",
            other
        ))),
    }
}

fn parse_order_type(raw: &str, has_stop: bool) -> Result<OrderType, ExchangeError> {
    match (raw, has_stop) {
        ("market", false) => Ok(OrderType::Market),
        ("limit", false) => Ok(OrderType::Limit),
        ("market" | "stop", true) | ("stop", false) => Ok(OrderType::Stop),
        ("limit", true) => Ok(OrderType::StopLimit),
        (other, _) => Err(ExchangeError::ParseError(format!(
            "Unknown order type '{}'",
            other
        ))),
    }
}

/// `done` orders are keyed by `done_reason`; an open order with fills is
/// partially filled.
fn order_status(order: &CoinbaseOrder, filled: Decimal) -> OrderStatus {
    let raw = match (order.status.as_str(), order.done_reason.as_deref()) {
        ("done", Some(reason)) if !reason.is_empty() => reason,
        (status, _) => status,
    };
    match COINBASE_ORDERS.statuses.map(raw) {
        OrderStatus::New if filled > Decimal::ZERO => OrderStatus::PartiallyFilled,
        status => status,
    }
}

pub fn convert_order(order: CoinbaseOrder) -> Result<OrderResult, ExchangeError> {
    let quantity = mapping::parse_decimal(
        "size",
        order
            .size
            .as_deref()
            .ok_or_else(|| ExchangeError::ParseError(format!("Order {} has no size", order.id)))?,
    )?;
    let executed_quantity =
        mapping::parse_optional_decimal("filled_size", order.filled_size.as_deref())?
            .unwrap_or(Decimal::ZERO);
    let executed_value =
        mapping::parse_optional_decimal("executed_value", order.executed_value.as_deref())?
            .unwrap_or(Decimal::ZERO);
    let created_at = mapping::parse_rfc3339("created_at", &order.created_at)?;
    let updated_at = match order.done_at.as_deref() {
        Some(done_at) => mapping::parse_rfc3339("done_at", done_at)?,
        None => created_at,
    };

    Ok(OrderResult {
        status: order_status(&order, executed_quantity),
        symbol: from_product_id(&order.product_id),
        side: parse_side(&order.side)?,
        order_type: parse_order_type(&order.order_type, order.stop.is_some())?,
        quantity,
        price: mapping::parse_optional_decimal("price", order.price.as_deref())?,
        stop_price: mapping::parse_optional_decimal("stop_price", order.stop_price.as_deref())?,
        executed_quantity,
        executed_price: mapping::executed_price(executed_value, executed_quantity),
        time_in_force: order
            .time_in_force
            .as_deref()
            .map(|tif| COINBASE_ORDERS.time_in_force.from_exchange(tif)),
        created_at,
        updated_at,
        id: order.id,
        client_order_id: order.client_oid.filter(|oid| !oid.is_empty()),
    })
}

/// `now` stamps tickers that arrive without a `time` field
pub fn convert_market_data(
    symbol: &str,
    ticker: CoinbaseTicker,
    stats: CoinbaseStats,
    now: DateTime<Utc>,
) -> Result<MarketData, ExchangeError> {
    let price = mapping::parse_decimal("price", &ticker.price)?;
    let open = mapping::parse_decimal("open", &stats.open)?;
    let timestamp = match ticker.time.as_deref() {
        Some(time) => mapping::parse_rfc3339("time", time)?,
        None => now,
    };

    Ok(MarketData {
        symbol: from_product_id(symbol),
        exchange: EXCHANGE.to_string(),
        price,
        bid: mapping::parse_decimal("bid", &ticker.bid)?,
        ask: mapping::parse_decimal("ask", &ticker.ask)?,
        volume_24h: mapping::parse_decimal("volume", &stats.volume)?,
        change_24h: mapping::change_percent(price, open)?,
        high_24h: mapping::parse_decimal("high", &stats.high)?,
        low_24h: mapping::parse_decimal("low", &stats.low)?,
        timestamp,
    })
}

fn convert_levels(levels: &[Vec<Value>]) -> Result<Vec<PriceLevel>, ExchangeError> {
    levels
        .iter()
        .map(|level| match (level.first(), level.get(1)) {
            (Some(Value::String(price)), Some(Value::String(size))) => {
                mapping::parse_price_level(price, size)
            }
            _ => Err(ExchangeError::ParseError(format!(
                "Malformed book level {:?}",
                level
            ))),
        })
        .collect()
}

pub fn convert_order_book(
    product_id: &str,
    book: CoinbaseOrderBook,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<OrderBook, ExchangeError> {
    let timestamp = match book.time.as_deref() {
        Some(time) => mapping::parse_rfc3339("time", time)?,
        None => now,
    };

    Ok(OrderBook {
        symbol: from_product_id(product_id),
        bids: mapping::finish_book_side(convert_levels(&book.bids)?, BookSide::Bids, limit),
        asks: mapping::finish_book_side(convert_levels(&book.asks)?, BookSide::Asks, limit),
        timestamp,
    })
}

/// Balances from `available`/`hold`; trading permission from any account.
pub fn convert_account(accounts: Vec<CoinbaseAccount>) -> Result<AccountInfo, ExchangeError> {
    let mut permissions = vec!["view".to_string()];
    if accounts.iter().any(|a| a.trading_enabled) {
        permissions.push("trade".to_string());
    }

    let balances = accounts
        .into_iter()
        .map(|account| {
            Ok(Balance {
                free: mapping::parse_decimal("available", &account.available)?,
                locked: mapping::parse_decimal("hold", &account.hold)?,
                asset: account.currency,
            })
        })
        .collect::<Result<Vec<_>, ExchangeError>>()?;

    Ok(AccountInfo::from_balances(balances, permissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn order_json(status: &str, done_reason: Option<&str>, filled: &str) -> CoinbaseOrder {
        serde_json::from_value(json!({
            "id": "d0c5340b-6d6c-49d9-b567-48c4bfca13d2",
            "client_oid": "abc",
            "product_id": "BTC-USD",
            "side": "buy",
            "type": "limit",
            "size": "2.00000000",
            "price": "100.00",
            "time_in_force": "IOC",
            "status": status,
            "done_reason": done_reason,
            "filled_size": filled,
            "executed_value": "150.00",
            "created_at": "2024-01-02T03:04:05.123456Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_stop_limit_request_uses_loss_for_sell() {
        let params =
            OrderParams::stop_limit("ETHUSD", OrderSide::Sell, dec!(1), dec!(3000), dec!(3100));
        let body = serde_json::to_value(order_request(&params, "cid")).unwrap();

        assert_eq!(body["product_id"], "ETH-USD");
        assert_eq!(body["type"], "limit");
        assert_eq!(body["stop"], "loss");
        assert_eq!(body["price"], "3000");
        assert_eq!(body["stop_price"], "3100");
        assert_eq!(body["client_oid"], "cid");
    }

    #[test]
    fn test_stop_market_buy_uses_entry_without_price() {
        let params = OrderParams::stop("BTCUSD", OrderSide::Buy, dec!(0.5), dec!(50000));
        let request = order_request(&params, "cid");
        assert_eq!(request.order_type, "market");
        assert_eq!(request.stop.as_deref(), Some("entry"));
        assert_eq!(request.price, None);
        assert_eq!(request.time_in_force, None);
    }

    #[test]
    fn test_limit_request_maps_time_in_force() {
        let params = OrderParams::limit("BTCUSDC", OrderSide::Buy, dec!(1), dec!(100))
            .with_time_in_force(TimeInForce::FOK);
        let request = order_request(&params, "cid");
        assert_eq!(request.product_id, "BTC-USDC");
        assert_eq!(request.time_in_force.as_deref(), Some("FOK"));
        assert_eq!(request.stop, None);
    }

    #[test]
    fn test_status_table_values() {
        for (raw, expected) in [
            ("pending", OrderStatus::New),
            ("received", OrderStatus::New),
            ("open", OrderStatus::New),
            ("active", OrderStatus::New),
            ("done", OrderStatus::Filled),
            ("filled", OrderStatus::Filled),
            ("canceled", OrderStatus::Canceled),
            ("rejected", OrderStatus::Rejected),
            ("settling", OrderStatus::New),
        ] {
            assert_eq!(COINBASE_ORDERS.statuses.map(raw), expected, "{}", raw);
        }
    }

    #[test]
    fn test_done_order_is_keyed_by_reason() {
        let canceled = convert_order(order_json("done", Some("canceled"), "0")).unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(canceled.executed_price, None);

        let filled = convert_order(order_json("done", Some("filled"), "1.5")).unwrap();
        assert_eq!(filled.status, OrderStatus::Filled);
        assert_eq!(filled.executed_price, Some(dec!(100)));
        assert_eq!(filled.time_in_force, Some(TimeInForce::IOC));
        assert_eq!(filled.symbol, "BTCUSD");
    }

    #[test]
    fn test_open_order_with_fills_is_partially_filled() {
        let order = convert_order(order_json("open", None, "0.5")).unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.executed_quantity, dec!(0.5));
        assert_eq!(order.quantity, dec!(2));
    }

    #[test]
    fn test_classifier_detects_timestamp_rejection() {
        let classifier = CoinbaseClassifier;
        assert!(matches!(
            classifier.classify(401, r#"{"message":"request timestamp expired"}"#),
            Some(ExchangeError::TimestampRejected(_))
        ));
        assert!(classifier
            .classify(401, r#"{"message":"invalid signature"}"#)
            .is_none());
        assert!(classifier
            .classify(500, r#"{"message":"timestamp"}"#)
            .is_none());
    }

    #[test]
    fn test_book_levels_must_be_numeric() {
        let book: CoinbaseOrderBook = serde_json::from_value(json!({
            "bids": [["100.1", "abc", 1]],
            "asks": [],
            "sequence": 1
        }))
        .unwrap();
        assert!(matches!(
            convert_order_book("BTC-USD", book, 10, Utc::now()),
            Err(ExchangeError::ParseError(_))
        ));
    }
}
