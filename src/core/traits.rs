use crate::core::{
    config::ExchangeCredentials,
    errors::{ConnectorError, Operation},
    types::{AccountInfo, ConnectionState, MarketData, OrderBook, OrderParams, OrderResult},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Callback receiving pushed price updates
pub type PriceCallback = Arc<dyn Fn(MarketData) + Send + Sync>;

/// Unified contract implemented once per exchange
///
/// Market data and order book queries are public and work in any state.
/// Every other operation requires a successful `connect()` and fails with
/// `NotConnected` without any network traffic otherwise.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    fn exchange_name(&self) -> &'static str;

    fn state(&self) -> ConnectionState;

    /// Validates credentials, verifies them with one authenticated call and
    /// transitions to `Connected`.
    async fn connect(&mut self, credentials: ExchangeCredentials) -> Result<bool, ConnectorError>;

    /// Clears credentials. Always succeeds.
    fn disconnect(&mut self) -> bool;

    async fn get_market_data(&self, symbol: &str) -> Result<MarketData, ConnectorError>;

    async fn get_order_book(&self, symbol: &str, limit: usize)
        -> Result<OrderBook, ConnectorError>;

    async fn place_order(&self, params: OrderParams) -> Result<OrderResult, ConnectorError>;

    async fn cancel_order(&self, order_id: &str, symbol: &str) -> Result<bool, ConnectorError>;

    async fn get_order_status(
        &self,
        order_id: &str,
        symbol: &str,
    ) -> Result<OrderResult, ConnectorError>;

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ConnectorError>;

    async fn get_account_info(&self) -> Result<AccountInfo, ConnectorError>;

    /// Returns `false` when the connector cannot push updates
    fn subscribe_price_updates(&self, symbols: &[String], callback: PriceCallback) -> bool;

    fn unsubscribe_price_updates(&self, symbols: &[String]) -> bool;
}

/// Shared answer of REST-only connectors to subscription requests
pub fn reject_price_subscription(
    exchange: &'static str,
    operation: Operation,
    symbols: &[String],
) -> bool {
    warn!(
        exchange,
        operation = %operation,
        symbols = ?symbols,
        "Push price updates are not available on a REST-only connector; poll get_market_data instead"
    );
    false
}
