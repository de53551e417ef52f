use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::types::{OrderParams, OrderResult};
use crate::exchanges::coinbase::{conversions, rest::CoinbaseRest};
use tracing::{info, instrument};
use uuid::Uuid;

/// Coinbase order placement and queries
#[derive(Debug, Clone)]
pub struct Trading {
    rest: CoinbaseRest,
}

impl Trading {
    pub const fn new(rest: CoinbaseRest) -> Self {
        Self { rest }
    }

    /// Places one order. Always sends a `client_oid` so an ambiguous failure
    /// can be reconciled against the open orders list.
    #[instrument(skip(self, credentials, params), fields(exchange = "coinbase", symbol = %params.symbol))]
    pub async fn place_order(
        &self,
        credentials: &ExchangeCredentials,
        params: OrderParams,
    ) -> Result<OrderResult, ExchangeError> {
        params.validate()?;

        let client_oid = params
            .client_order_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let request = conversions::order_request(&params, &client_oid);
        let order = self.rest.place_order(credentials, &request).await?;

        let mut result = conversions::convert_order(order)?;
        result.client_order_id.get_or_insert(client_oid);
        info!(order_id = %result.id, status = ?result.status, "Order placed");
        Ok(result)
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn cancel_order(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
        symbol: &str,
    ) -> Result<bool, ExchangeError> {
        let product_id = conversions::to_product_id(symbol);
        self.rest
            .cancel_order(credentials, order_id, &product_id)
            .await?;
        Ok(true)
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_order_status(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
    ) -> Result<OrderResult, ExchangeError> {
        let order = self.rest.get_order(credentials, order_id).await?;
        conversions::convert_order(order)
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_open_orders(
        &self,
        credentials: &ExchangeCredentials,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let product_id = symbol.map(conversions::to_product_id);
        self.rest
            .get_open_orders(credentials, product_id.as_deref())
            .await?
            .into_iter()
            .map(conversions::convert_order)
            .collect()
    }
}
