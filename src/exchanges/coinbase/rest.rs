use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::coinbase::conversions::OPEN_ORDER_STATUSES;
use crate::exchanges::coinbase::types::{
    CoinbaseAccount, CoinbaseOrder, CoinbaseOrderBook, CoinbaseOrderRequest, CoinbaseStats,
    CoinbaseTicker,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::instrument;

/// Typed wrapper over the Coinbase Exchange REST endpoints
#[derive(Debug, Clone)]
pub struct CoinbaseRest {
    client: RestClient,
}

impl CoinbaseRest {
    pub const fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<(), ExchangeError> {
        self.client.validate_credentials(credentials)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.client.now()
    }

    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn get_ticker(&self, product_id: &str) -> Result<CoinbaseTicker, ExchangeError> {
        self.client
            .get_public(&format!("/products/{}/ticker", product_id), &[])
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn get_stats(&self, product_id: &str) -> Result<CoinbaseStats, ExchangeError> {
        self.client
            .get_public(&format!("/products/{}/stats", product_id), &[])
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinbase"))]
    pub async fn get_order_book(
        &self,
        product_id: &str,
    ) -> Result<CoinbaseOrderBook, ExchangeError> {
        self.client
            .get_public(
                &format!("/products/{}/book", product_id),
                &[("level", "2")],
            )
            .await
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_accounts(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<Vec<CoinbaseAccount>, ExchangeError> {
        self.client.get_signed(credentials, "/accounts", &[]).await
    }

    #[instrument(
        skip(self, credentials, request),
        fields(exchange = "coinbase", product_id = %request.product_id, client_oid = %request.client_oid)
    )]
    pub async fn place_order(
        &self,
        credentials: &ExchangeCredentials,
        request: &CoinbaseOrderRequest,
    ) -> Result<CoinbaseOrder, ExchangeError> {
        let body = serde_json::to_value(request)
            .map_err(|e| ExchangeError::SerializationError(e.to_string()))?;
        self.client.post_signed(credentials, "/orders", &body).await
    }

    /// Coinbase answers a successful cancel with the order id
    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn cancel_order(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
        product_id: &str,
    ) -> Result<Value, ExchangeError> {
        self.client
            .delete_signed(
                credentials,
                &format!("/orders/{}", order_id),
                &[("product_id", product_id)],
            )
            .await
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_order(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
    ) -> Result<CoinbaseOrder, ExchangeError> {
        self.client
            .get_signed(credentials, &format!("/orders/{}", order_id), &[])
            .await
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_open_orders(
        &self,
        credentials: &ExchangeCredentials,
        product_id: Option<&str>,
    ) -> Result<Vec<CoinbaseOrder>, ExchangeError> {
        let mut query: Vec<(&str, &str)> = OPEN_ORDER_STATUSES
            .iter()
            .map(|status| ("status", *status))
            .collect();
        if let Some(product_id) = product_id {
            query.push(("product_id", product_id));
        }
        self.client.get_signed(credentials, "/orders", &query).await
    }
}
