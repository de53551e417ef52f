use serde::{Deserialize, Serialize};

/// OKX API standard response wrapper
#[derive(Debug, Deserialize, Serialize)]
pub struct OkxResponse<T> {
    pub code: String,
    pub msg: String,
    pub data: T,
}

/// `/api/v5/market/ticker`, includes the rolling 24h window
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxTicker {
    pub inst_id: String,
    pub last: String,
    pub bid_px: String,
    pub ask_px: String,
    pub open_24h: String,
    pub high_24h: String,
    pub low_24h: String,
    pub vol_24h: String,     // Base currency volume
    #[serde(default)]
    pub vol_ccy_24h: String, // Quote currency volume
    pub ts: String,          // Epoch millis
}

/// `/api/v5/market/books`
///
/// Levels are `[price, size, deprecated, order_count]`, all strings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OkxOrderBook {
    pub asks: Vec<Vec<String>>,
    pub bids: Vec<Vec<String>>,
    pub ts: String,
}

/// Body of `POST /api/v5/trade/order`
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OkxOrderRequest {
    pub inst_id: String,
    pub td_mode: String,  // cash for spot
    pub side: String,
    pub ord_type: String, // market, limit, ioc, fok
    pub sz: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
    pub cl_ord_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tgt_ccy: Option<String>,
}

/// Body of `POST /api/v5/trade/order-algo` for trigger orders
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OkxAlgoOrderRequest {
    pub inst_id: String,
    pub td_mode: String,
    pub side: String,
    pub ord_type: String, // trigger
    pub sz: String,
    pub trigger_px: String,
    pub order_px: String, // -1 executes at market
    pub algo_cl_ord_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tgt_ccy: Option<String>,
}

/// Per-order acknowledgement of place / cancel calls
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OkxOrderAck {
    #[serde(default)]
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    #[serde(default)]
    pub s_code: String,
    #[serde(default)]
    pub s_msg: String,
}

/// Body of `POST /api/v5/trade/cancel-order`
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OkxCancelRequest {
    pub inst_id: String,
    pub ord_id: String,
}

/// One entry of the `POST /api/v5/trade/cancel-algos` body array
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OkxCancelAlgoRequest {
    pub algo_id: String,
    pub inst_id: String,
}

/// Trigger order from `order-algo` / `orders-algo-pending`
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxAlgoOrder {
    pub inst_id: String,
    pub algo_id: String,
    #[serde(default)]
    pub algo_cl_ord_id: String,
    pub side: String,
    pub sz: String,
    #[serde(default)]
    pub trigger_px: String,
    #[serde(default)]
    pub order_px: String, // -1 for market execution
    pub state: String,
    #[serde(default)]
    pub actual_sz: String, // Size handed to the triggered order
    #[serde(default)]
    pub actual_px: String,
    pub c_time: String,
    #[serde(default)]
    pub u_time: String,
}

/// Order details
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxOrder {
    pub inst_id: String,
    pub ord_id: String,
    #[serde(default)]
    pub cl_ord_id: String,
    #[serde(default)]
    pub px: String, // Empty for market orders
    pub sz: String,
    pub ord_type: String,
    pub side: String,
    #[serde(default)]
    pub acc_fill_sz: String,
    #[serde(default)]
    pub avg_px: String,
    pub state: String,
    pub c_time: String,
    #[serde(default)]
    pub u_time: String,
}

/// One currency of `/api/v5/account/balance`
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxBalanceDetail {
    pub ccy: String,
    #[serde(default)]
    pub avail_bal: String,
    #[serde(default)]
    pub frozen_bal: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxAccountBalance {
    #[serde(default)]
    pub total_eq: String,
    #[serde(default)]
    pub details: Vec<OkxBalanceDetail>,
}

/// `/api/v5/account/config`
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OkxAccountConfig {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub perm: String, // Comma separated, e.g. "read_only,trade"
}
