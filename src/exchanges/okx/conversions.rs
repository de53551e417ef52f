use super::types::{
    OkxAccountBalance, OkxAccountConfig, OkxAlgoOrder, OkxAlgoOrderRequest, OkxOrder,
    OkxOrderBook, OkxOrderRequest, OkxTicker,
};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    ErrorClassifier, HeaderNames, KeyEncoding, SigningScheme, TimestampFormat,
};
use crate::core::mapping::{self, BookSide, OrderVocabulary, StatusTable, TifTable};
use crate::core::symbols::SymbolFormat;
use crate::core::types::{
    AccountInfo, Balance, MarketData, OrderBook, OrderParams, OrderResult, OrderSide,
    OrderStatus, OrderType, PriceLevel, TimeInForce,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

pub const EXCHANGE: &str = "okx";

/// Header selecting the demo trading environment
pub const SIMULATED_TRADING_HEADER: &str = "x-simulated-trading";

pub const OKX_SYMBOLS: SymbolFormat =
    SymbolFormat::new("-", &["USDT", "USDC", "USD", "BTC", "ETH", "EUR"]);

pub const OKX_SIGNING: SigningScheme = SigningScheme {
    headers: HeaderNames {
        api_key: "OK-ACCESS-KEY",
        signature: "OK-ACCESS-SIGN",
        timestamp: "OK-ACCESS-TIMESTAMP",
        passphrase: Some("OK-ACCESS-PASSPHRASE"),
    },
    key_encoding: KeyEncoding::Raw,
    timestamp_format: TimestampFormat::Iso8601Millis,
};

/// Time in force is carried by `ordType` on OKX
pub const OKX_ORDERS: OrderVocabulary = OrderVocabulary {
    statuses: StatusTable::new(
        EXCHANGE,
        &[
            ("live", OrderStatus::New),
            ("partially_filled", OrderStatus::PartiallyFilled),
            ("filled", OrderStatus::Filled),
            ("canceled", OrderStatus::Canceled),
            ("mmp_canceled", OrderStatus::Canceled),
        ],
    ),
    time_in_force: TifTable::new(&[
        (TimeInForce::GTC, "limit"),
        (TimeInForce::IOC, "ioc"),
        (TimeInForce::FOK, "fok"),
    ]),
    stop: None,
};

/// Trigger order states; `effective` means the trigger fired and the
/// resulting order was submitted
pub const OKX_ALGO_STATUSES: StatusTable = StatusTable::new(
    EXCHANGE,
    &[
        ("live", OrderStatus::New),
        ("pause", OrderStatus::New),
        ("partially_effective", OrderStatus::PartiallyFilled),
        ("effective", OrderStatus::Filled),
        ("canceled", OrderStatus::Canceled),
        ("order_failed", OrderStatus::Rejected),
        ("partially_failed", OrderStatus::Rejected),
    ],
);

/// Marks canonical ids of orders living on the algo endpoints
pub const ALGO_ID_PREFIX: &str = "algo:";

/// Which OKX order family a canonical order id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OkxOrderRef<'a> {
    Regular(&'a str),
    Algo(&'a str),
}

impl<'a> OkxOrderRef<'a> {
    pub fn parse(order_id: &'a str) -> Result<Self, ExchangeError> {
        let order_ref = order_id
            .strip_prefix(ALGO_ID_PREFIX)
            .map_or(Self::Regular(order_id), Self::Algo);
        match order_ref {
            Self::Regular(id) | Self::Algo(id) if id.trim().is_empty() => Err(
                ExchangeError::InvalidParameters(format!("Invalid order id '{}'", order_id)),
            ),
            valid => Ok(valid),
        }
    }
}

pub fn algo_order_id(algo_id: &str) -> String {
    format!("{}{}", ALGO_ID_PREFIX, algo_id)
}

const RATE_LIMIT_CODES: &[&str] = &["50011", "50061"];
const TIMESTAMP_CODES: &[&str] = &["50102", "50112"];

/// Envelope fields needed for classification; error bodies may omit `data`
#[derive(Debug, Deserialize)]
struct OkxEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

/// Classifies the `{code, msg, data}` envelope
///
/// OKX reports most failures with a non-zero `code`, frequently under HTTP
/// 200, and per-order failures only in `data[].sMsg`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OkxClassifier;

impl ErrorClassifier for OkxClassifier {
    fn classify(&self, status: u16, body: &str) -> Option<ExchangeError> {
        let envelope: OkxEnvelope = serde_json::from_str(body).ok()?;
        if envelope.code == "0" {
            return None;
        }

        let item_message = envelope
            .data
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get("sMsg"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());
        let message = match item_message {
            Some(detail) if envelope.msg.is_empty() => format!("{} ({})", detail, envelope.code),
            Some(detail) => format!("{}: {} ({})", envelope.msg, detail, envelope.code),
            None => format!("{} ({})", envelope.msg, envelope.code),
        };

        let code = envelope.code.as_str();
        Some(if RATE_LIMIT_CODES.contains(&code) {
            ExchangeError::RateLimitExceeded {
                message,
                retry_after: None,
            }
        } else if TIMESTAMP_CODES.contains(&code) {
            ExchangeError::TimestampRejected(message)
        } else {
            ExchangeError::HttpError {
                code: status,
                message,
                raw_body: body.to_string(),
            }
        })
    }
}

pub fn to_inst_id(symbol: &str) -> String {
    OKX_SYMBOLS.denormalize(symbol)
}

pub fn from_inst_id(inst_id: &str) -> String {
    OKX_SYMBOLS.normalize(inst_id)
}

/// Takes the single record OKX wraps in `data`
pub fn single<T>(data: Vec<T>, what: &str) -> Result<T, ExchangeError> {
    data.into_iter()
        .next()
        .ok_or_else(|| ExchangeError::ParseError(format!("OKX returned no {}", what)))
}

/// Market sizes are in base currency, matching `OrderParams::quantity`
fn base_target(order_type: OrderType) -> Option<String> {
    matches!(order_type, OrderType::Market | OrderType::Stop).then(|| "base_ccy".to_string())
}

pub fn order_request(params: &OrderParams, cl_ord_id: &str) -> OkxOrderRequest {
    let ord_type = match params.order_type {
        OrderType::Market | OrderType::Stop => "market",
        OrderType::Limit | OrderType::StopLimit => OKX_ORDERS
            .time_in_force
            .to_exchange(params.time_in_force.unwrap_or_default()),
    };

    OkxOrderRequest {
        inst_id: to_inst_id(&params.symbol),
        td_mode: "cash".to_string(),
        side: params.side.to_string(),
        ord_type: ord_type.to_string(),
        sz: params.quantity.to_string(),
        px: params
            .price
            .filter(|_| params.order_type.requires_price())
            .map(|p| p.to_string()),
        cl_ord_id: cl_ord_id.to_string(),
        tgt_ccy: base_target(params.order_type),
    }
}

/// Stop and stop-limit orders become trigger algo orders
pub fn algo_order_request(
    params: &OrderParams,
    algo_cl_ord_id: &str,
) -> Result<OkxAlgoOrderRequest, ExchangeError> {
    let trigger_px = params.stop_price.ok_or_else(|| {
        ExchangeError::InvalidParameters("stop orders require a stop price".to_string())
    })?;
    let order_px = match params.order_type {
        OrderType::StopLimit => params
            .price
            .ok_or_else(|| {
                ExchangeError::InvalidParameters("stop_limit orders require a price".to_string())
            })?
            .to_string(),
        _ => "-1".to_string(),
    };

    Ok(OkxAlgoOrderRequest {
        inst_id: to_inst_id(&params.symbol),
        td_mode: "cash".to_string(),
        side: params.side.to_string(),
        ord_type: "trigger".to_string(),
        sz: params.quantity.to_string(),
        trigger_px: trigger_px.to_string(),
        order_px,
        algo_cl_ord_id: algo_cl_ord_id.to_string(),
        tgt_ccy: base_target(params.order_type),
    })
}

/// Canonical view of an accepted placement
///
/// OKX acknowledges placements with ids only, so the result echoes the
/// request as a new, unfilled order.
pub fn accepted_order(
    params: &OrderParams,
    order_id: String,
    client_order_id: String,
    now: DateTime<Utc>,
) -> OrderResult {
    OrderResult {
        id: order_id,
        client_order_id: Some(client_order_id),
        symbol: from_inst_id(&to_inst_id(&params.symbol)),
        side: params.side,
        order_type: params.order_type,
        status: OrderStatus::New,
        quantity: params.quantity,
        price: params.price.filter(|_| params.order_type.requires_price()),
        stop_price: params.stop_price.filter(|_| params.order_type.is_stop()),
        executed_quantity: Decimal::ZERO,
        executed_price: None,
        time_in_force: params
            .time_in_force
            .filter(|_| params.order_type.requires_price()),
        created_at: now,
        updated_at: now,
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

pub fn convert_order(order: OkxOrder) -> Result<OrderResult, ExchangeError> {
    let (order_type, time_in_force) = match order.ord_type.as_str() {
        "market" => (OrderType::Market, None),
        native => (
            OrderType::Limit,
            Some(OKX_ORDERS.time_in_force.from_exchange(native)),
        ),
    };

    let executed_quantity = mapping::parse_optional_decimal("accFillSz", Some(&order.acc_fill_sz))?
        .unwrap_or(Decimal::ZERO);
    let executed_price = if executed_quantity.is_zero() {
        None
    } else {
        mapping::parse_optional_decimal("avgPx", Some(&order.avg_px))?
    };
    let created_at = mapping::parse_epoch_millis("cTime", &order.c_time)?;
    let updated_at = if order.u_time.is_empty() {
        created_at
    } else {
        mapping::parse_epoch_millis("uTime", &order.u_time)?
    };

    Ok(OrderResult {
        status: OKX_ORDERS.statuses.map(&order.state),
        symbol: from_inst_id(&order.inst_id),
        side: parse_side(&order.side)?,
        order_type,
        quantity: mapping::parse_decimal("sz", &order.sz)?,
        price: mapping::parse_optional_decimal("px", Some(&order.px))?,
        stop_price: None,
        executed_quantity,
        executed_price,
        time_in_force,
        created_at,
        updated_at,
        id: order.ord_id,
        client_order_id: Some(order.cl_ord_id).filter(|id| !id.is_empty()),
    })
}

/// Triggered orders report the size and price handed to the resulting
/// regular order; that order's own fills are not followed here.
pub fn convert_algo_order(order: OkxAlgoOrder) -> Result<OrderResult, ExchangeError> {
    let price = match order.order_px.trim() {
        "" | "-1" => None,
        px => Some(mapping::parse_decimal("orderPx", px)?),
    };
    let order_type = if price.is_some() {
        OrderType::StopLimit
    } else {
        OrderType::Stop
    };

    let status = OKX_ALGO_STATUSES.map(&order.state);
    let executed_quantity = if matches!(
        status,
        OrderStatus::Filled | OrderStatus::PartiallyFilled
    ) {
        mapping::parse_optional_decimal("actualSz", Some(&order.actual_sz))?
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let executed_price = match order.actual_px.trim() {
        "" | "-1" => None,
        _ if executed_quantity.is_zero() => None,
        px => Some(mapping::parse_decimal("actualPx", px)?),
    };
    let created_at = mapping::parse_epoch_millis("cTime", &order.c_time)?;
    let updated_at = if order.u_time.is_empty() {
        created_at
    } else {
        mapping::parse_epoch_millis("uTime", &order.u_time)?
    };

    Ok(OrderResult {
        id: algo_order_id(&order.algo_id),
        client_order_id: Some(order.algo_cl_ord_id).filter(|id| !id.is_empty()),
        symbol: from_inst_id(&order.inst_id),
        side: parse_side(&order.side)?,
        order_type,
        status,
        quantity: mapping::parse_decimal("sz", &order.sz)?,
        price,
        stop_price: mapping::parse_optional_decimal("triggerPx", Some(&order.trigger_px))?,
        executed_quantity,
        executed_price,
        time_in_force: None,
        created_at,
        updated_at,
    })
}

pub fn convert_market_data(ticker: OkxTicker) -> Result<MarketData, ExchangeError> {
    let price = mapping::parse_decimal("last", &ticker.last)?;
    let open = mapping::parse_decimal("open24h", &ticker.open_24h)?;

    Ok(MarketData {
        symbol: from_inst_id(&ticker.inst_id),
        exchange: EXCHANGE.to_string(),
        price,
        bid: mapping::parse_decimal("bidPx", &ticker.bid_px)?,
        ask: mapping::parse_decimal("askPx", &ticker.ask_px)?,
        volume_24h: mapping::parse_decimal("vol24h", &ticker.vol_24h)?,
        change_24h: mapping::change_percent(price, open)?,
        high_24h: mapping::parse_decimal("high24h", &ticker.high_24h)?,
        low_24h: mapping::parse_decimal("low24h", &ticker.low_24h)?,
        timestamp: mapping::parse_epoch_millis("ts", &ticker.ts)?,
    })
}

fn convert_levels(levels: &[Vec<String>]) -> Result<Vec<PriceLevel>, ExchangeError> {
    levels
        .iter()
        .map(|level| match (level.first(), level.get(1)) {
            (Some(price), Some(size)) => mapping::parse_price_level(price, size),
            _ => Err(ExchangeError::ParseError(format!(
                "Malformed book level {:?}",
                level
            ))),
        })
        .collect()
}

pub fn convert_order_book(
    inst_id: &str,
    book: OkxOrderBook,
    limit: usize,
) -> Result<OrderBook, ExchangeError> {
    Ok(OrderBook {
        symbol: from_inst_id(inst_id),
        bids: mapping::finish_book_side(convert_levels(&book.bids)?, BookSide::Bids, limit),
        asks: mapping::finish_book_side(convert_levels(&book.asks)?, BookSide::Asks, limit),
        timestamp: mapping::parse_epoch_millis("ts", &book.ts)?,
    })
}

pub fn convert_account(
    balance: OkxAccountBalance,
    config: OkxAccountConfig,
) -> Result<AccountInfo, ExchangeError> {
    let balances = balance
        .details
        .into_iter()
        .map(|detail| {
            Ok(Balance {
                free: mapping::parse_optional_decimal("availBal", Some(&detail.avail_bal))?
                    .unwrap_or(Decimal::ZERO),
                locked: mapping::parse_optional_decimal("frozenBal", Some(&detail.frozen_bal))?
                    .unwrap_or(Decimal::ZERO),
                asset: detail.ccy,
            })
        })
        .collect::<Result<Vec<_>, ExchangeError>>()?;

    let permissions = config
        .perm
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Ok(AccountInfo::from_balances(balances, permissions))
}
