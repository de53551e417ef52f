use crate::core::config::ExchangeCredentials;
use crate::core::errors::{ConnectorError, ExchangeError, Operation, ResultExt};
use crate::core::session::Session;
use crate::core::traits::{reject_price_subscription, ExchangeConnector, PriceCallback};
use crate::core::types::{
    AccountInfo, ConnectionState, MarketData, OrderBook, OrderParams, OrderResult,
};
use crate::exchanges::coinbase::{conversions::EXCHANGE, rest::CoinbaseRest};
use async_trait::async_trait;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::Market;
pub use trading::Trading;

/// Coinbase Exchange connector composed of market, trading and account parts
///
/// Owns the session; the parts are stateless and receive credentials from the
/// session guard on every authenticated call.
#[derive(Debug)]
pub struct CoinbaseConnector {
    session: Session,
    pub market: Market,
    pub trading: Trading,
    pub account: Account,
}

impl CoinbaseConnector {
    pub fn new(rest: CoinbaseRest) -> Self {
        Self {
            session: Session::new(EXCHANGE),
            market: Market::new(rest.clone()),
            trading: Trading::new(rest.clone()),
            account: Account::new(rest),
        }
    }
}

#[async_trait]
impl ExchangeConnector for CoinbaseConnector {
    fn exchange_name(&self) -> &'static str {
        EXCHANGE
    }

    fn state(&self) -> ConnectionState {
        self.session.state()
    }

    async fn connect(&mut self, credentials: ExchangeCredentials) -> Result<bool, ConnectorError> {
        self.account
            .validate_credentials(&credentials)
            .for_operation(EXCHANGE, Operation::Connect)?;

        let attempt = self.session.begin_connect(credentials);
        let verified = match attempt.credentials() {
            Ok(credentials) => self.account.get_account_info(credentials).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match verified {
            Ok(()) => {
                attempt.commit();
                Ok(true)
            }
            Err(e) => Err(ExchangeError::ConnectionError(Box::new(e)))
                .for_operation(EXCHANGE, Operation::Connect),
        }
    }

    fn disconnect(&mut self) -> bool {
        self.session.disconnect()
    }

    async fn get_market_data(&self, symbol: &str) -> Result<MarketData, ConnectorError> {
        self.market
            .get_market_data(symbol)
            .await
            .for_symbol(EXCHANGE, Operation::GetMarketData, symbol)
    }

    async fn get_order_book(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<OrderBook, ConnectorError> {
        self.market
            .get_order_book(symbol, limit)
            .await
            .for_symbol(EXCHANGE, Operation::GetOrderBook, symbol)
    }

    async fn place_order(&self, params: OrderParams) -> Result<OrderResult, ConnectorError> {
        let symbol = params.symbol.clone();
        let credentials = self
            .session
            .require_connected()
            .for_symbol(EXCHANGE, Operation::PlaceOrder, &symbol)?;
        self.trading
            .place_order(credentials, params)
            .await
            .for_symbol(EXCHANGE, Operation::PlaceOrder, &symbol)
    }

    async fn cancel_order(&self, order_id: &str, symbol: &str) -> Result<bool, ConnectorError> {
        let credentials = self.session.require_connected().for_order(
            EXCHANGE,
            Operation::CancelOrder,
            symbol,
            order_id,
        )?;
        self.trading
            .cancel_order(credentials, order_id, symbol)
            .await
            .for_order(EXCHANGE, Operation::CancelOrder, symbol, order_id)
    }

    async fn get_order_status(
        &self,
        order_id: &str,
        symbol: &str,
    ) -> Result<OrderResult, ConnectorError> {
        let credentials = self.session.require_connected().for_order(
            EXCHANGE,
            Operation::GetOrderStatus,
            symbol,
            order_id,
        )?;
        self.trading
            .get_order_status(credentials, order_id)
            .await
            .for_order(EXCHANGE, Operation::GetOrderStatus, symbol, order_id)
    }

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ConnectorError> {
        let result = match self.session.require_connected() {
            Ok(credentials) => self.trading.get_open_orders(credentials, symbol).await,
            Err(e) => Err(e),
        };
        match symbol {
            Some(symbol) => result.for_symbol(EXCHANGE, Operation::GetOpenOrders, symbol),
            None => result.for_operation(EXCHANGE, Operation::GetOpenOrders),
        }
    }

    async fn get_account_info(&self) -> Result<AccountInfo, ConnectorError> {
        let credentials = self
            .session
            .require_connected()
            .for_operation(EXCHANGE, Operation::GetAccountInfo)?;
        self.account
            .get_account_info(credentials)
            .await
            .for_operation(EXCHANGE, Operation::GetAccountInfo)
    }

    fn subscribe_price_updates(&self, symbols: &[String], _callback: PriceCallback) -> bool {
        reject_price_subscription(EXCHANGE, Operation::SubscribePriceUpdates, symbols)
    }

    fn unsubscribe_price_updates(&self, symbols: &[String]) -> bool {
        reject_price_subscription(EXCHANGE, Operation::UnsubscribePriceUpdates, symbols)
    }
}
