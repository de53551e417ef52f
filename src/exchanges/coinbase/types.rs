use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coinbase Exchange account (one per currency)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseAccount {
    pub id: String,
    pub currency: String,
    pub balance: String,   // available + hold
    pub available: String, // Free to trade or withdraw
    pub hold: String,      // Reserved by open orders
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub trading_enabled: bool,
}

/// `/products/{id}/ticker`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseTicker {
    #[serde(default)]
    pub trade_id: Option<u64>,
    pub price: String,
    #[serde(default)]
    pub size: Option<String>,
    pub bid: String,
    pub ask: String,
    pub volume: String,
    #[serde(default)]
    pub time: Option<String>,
}

/// `/products/{id}/stats`, rolling 24h window
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseStats {
    pub open: String,
    pub high: String,
    pub low: String,
    pub last: String,
    pub volume: String,
    #[serde(default)]
    pub volume_30day: Option<String>,
}

/// `/products/{id}/book?level=2`
///
/// Levels are `[price, size, num_orders]` with string prices and sizes and an
/// integer order count.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseOrderBook {
    pub bids: Vec<Vec<Value>>,
    pub asks: Vec<Vec<Value>>,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Body of `POST /orders`
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CoinbaseOrderRequest {
    pub product_id: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String, // market or limit
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>, // entry or loss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<String>,
    pub client_oid: String,
}

/// Order as returned by the orders endpoints
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinbaseOrder {
    pub id: String,
    #[serde(default)]
    pub client_oid: Option<String>,
    pub product_id: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub stop_price: Option<String>,
    #[serde(default)]
    pub time_in_force: Option<String>,
    pub status: String,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub filled_size: Option<String>,
    #[serde(default)]
    pub executed_value: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub done_at: Option<String>,
}
