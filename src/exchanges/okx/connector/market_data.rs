use crate::core::errors::ExchangeError;
use crate::core::types::{MarketData, OrderBook};
use crate::exchanges::okx::{conversions, rest::OkxRest};
use tracing::instrument;

/// OKX public market data
#[derive(Debug, Clone)]
pub struct Market {
    rest: OkxRest,
}

impl Market {
    pub const fn new(rest: OkxRest) -> Self {
        Self { rest }
    }

    /// The OKX ticker already carries the 24h window, so one call suffices.
    #[instrument(skip(self), fields(exchange = "okx"))]
    pub async fn get_market_data(&self, symbol: &str) -> Result<MarketData, ExchangeError> {
        let inst_id = conversions::to_inst_id(symbol);
        let ticker = self
            .rest
            .get_ticker(&inst_id)
            .await
            .map_err(|e| ExchangeError::MarketDataError(Box::new(e)))?;
        conversions::convert_market_data(ticker)
    }

    #[instrument(skip(self), fields(exchange = "okx"))]
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
        let inst_id = conversions::to_inst_id(symbol);
        let book = self.rest.get_order_book(&inst_id, limit).await?;
        conversions::convert_order_book(&inst_id, book, limit)
    }
}
