use crate::core::errors::ExchangeError;
use crate::core::types::{MarketData, OrderBook};
use crate::exchanges::coinbase::{conversions, rest::CoinbaseRest};
use tracing::instrument;

/// Coinbase public market data
#[derive(Debug, Clone)]
pub struct Market {
    rest: CoinbaseRest,
}

impl Market {
    pub const fn new(rest: CoinbaseRest) -> Self {
        Self { rest }
    }

    /// Ticker and 24h stats live on separate endpoints; both are fetched
    /// concurrently and neither is used unless both succeed.
    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn get_market_data(&self, symbol: &str) -> Result<MarketData, ExchangeError> {
        let product_id = conversions::to_product_id(symbol);
        let (ticker, stats) = tokio::try_join!(
            self.rest.get_ticker(&product_id),
            self.rest.get_stats(&product_id)
        )
        .map_err(|e| ExchangeError::MarketDataError(Box::new(e)))?;

        conversions::convert_market_data(&product_id, ticker, stats, self.rest.now())
    }

    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn get_order_book(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<OrderBook, ExchangeError> {
        if limit == 0 {
            return Err(ExchangeError::InvalidParameters(
                "order book limit must be at least 1".to_string(),
            ));
        }
        let product_id = conversions::to_product_id(symbol);
        let book = self.rest.get_order_book(&product_id).await?;
        conversions::convert_order_book(&product_id, book, limit, self.rest.now())
    }
}
