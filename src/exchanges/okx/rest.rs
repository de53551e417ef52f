use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::okx::conversions::single;
use crate::exchanges::okx::types::{
    OkxAccountBalance, OkxAccountConfig, OkxAlgoOrder, OkxAlgoOrderRequest, OkxCancelAlgoRequest,
    OkxCancelRequest, OkxOrder, OkxOrderAck, OkxOrderBook, OkxOrderRequest, OkxResponse,
    OkxTicker,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

/// Deepest book OKX serves from `/api/v5/market/books`
const MAX_BOOK_DEPTH: usize = 400;

/// OKX v5 REST API client
///
/// Envelope errors (`code != "0"`) are classified by the kernel before
/// deserialisation, so every method here only unwraps `data`.
#[derive(Debug, Clone)]
pub struct OkxRest {
    client: RestClient,
}

impl OkxRest {
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

    fn encode<T: Serialize>(request: &T) -> Result<serde_json::Value, ExchangeError> {
        serde_json::to_value(request).map_err(|e| ExchangeError::SerializationError(e.to_string()))
    }

    #[instrument(skip(self), fields(exchange = "okx"))]
    pub async fn get_ticker(&self, inst_id: &str) -> Result<OkxTicker, ExchangeError> {
        let response: OkxResponse<Vec<OkxTicker>> = self
            .client
            .get_public("/api/v5/market/ticker", &[("instId", inst_id)])
            .await?;
        single(response.data, "ticker")
    }

    #[instrument(skip(self), fields(exchange = "okx"))]
    pub async fn get_order_book(
        &self,
        inst_id: &str,
        depth: usize,
    ) -> Result<OkxOrderBook, ExchangeError> {
        let sz = depth.min(MAX_BOOK_DEPTH).to_string();
        let response: OkxResponse<Vec<OkxOrderBook>> = self
            .client
            .get_public("/api/v5/market/books", &[("instId", inst_id), ("sz", sz.as_str())])
            .await?;
        single(response.data, "order book")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_balance(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<OkxAccountBalance, ExchangeError> {
        let response: OkxResponse<Vec<OkxAccountBalance>> = self
            .client
            .get_signed(credentials, "/api/v5/account/balance", &[])
            .await?;
        single(response.data, "account balance")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_account_config(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<OkxAccountConfig, ExchangeError> {
        let response: OkxResponse<Vec<OkxAccountConfig>> = self
            .client
            .get_signed(credentials, "/api/v5/account/config", &[])
            .await?;
        single(response.data, "account config")
    }

    #[instrument(
        skip(self, credentials, request),
        fields(exchange = "okx", inst_id = %request.inst_id, cl_ord_id = %request.cl_ord_id)
    )]
    pub async fn place_order(
        &self,
        credentials: &ExchangeCredentials,
        request: &OkxOrderRequest,
    ) -> Result<OkxOrderAck, ExchangeError> {
        let response: OkxResponse<Vec<OkxOrderAck>> = self
            .client
            .post_signed(credentials, "/api/v5/trade/order", &Self::encode(request)?)
            .await?;
        single(response.data, "order acknowledgement")
    }

    #[instrument(
        skip(self, credentials, request),
        fields(exchange = "okx", inst_id = %request.inst_id, algo_cl_ord_id = %request.algo_cl_ord_id)
    )]
    pub async fn place_algo_order(
        &self,
        credentials: &ExchangeCredentials,
        request: &OkxAlgoOrderRequest,
    ) -> Result<OkxOrderAck, ExchangeError> {
        let response: OkxResponse<Vec<OkxOrderAck>> = self
            .client
            .post_signed(
                credentials,
                "/api/v5/trade/order-algo",
                &Self::encode(request)?,
            )
            .await?;
        single(response.data, "algo order acknowledgement")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn cancel_order(
        &self,
        credentials: &ExchangeCredentials,
        inst_id: &str,
        ord_id: &str,
    ) -> Result<OkxOrderAck, ExchangeError> {
        let request = OkxCancelRequest {
            inst_id: inst_id.to_string(),
            ord_id: ord_id.to_string(),
        };
        let response: OkxResponse<Vec<OkxOrderAck>> = self
            .client
            .post_signed(
                credentials,
                "/api/v5/trade/cancel-order",
                &Self::encode(&request)?,
            )
            .await?;
        single(response.data, "cancel acknowledgement")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_order(
        &self,
        credentials: &ExchangeCredentials,
        inst_id: &str,
        ord_id: &str,
    ) -> Result<OkxOrder, ExchangeError> {
        let response: OkxResponse<Vec<OkxOrder>> = self
            .client
            .get_signed(
                credentials,
                "/api/v5/trade/order",
                &[("instId", inst_id), ("ordId", ord_id)],
            )
            .await?;
        single(response.data, "order")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_pending_orders(
        &self,
        credentials: &ExchangeCredentials,
        inst_id: Option<&str>,
    ) -> Result<Vec<OkxOrder>, ExchangeError> {
        let mut query = vec![("instType", "SPOT")];
        if let Some(inst_id) = inst_id {
            query.push(("instId", inst_id));
        }
        let response: OkxResponse<Vec<OkxOrder>> = self
            .client
            .get_signed(credentials, "/api/v5/trade/orders-pending", &query)
            .await?;
        Ok(response.data)
    }

    /// Cancels one trigger order; the endpoint takes a batch array
    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn cancel_algo_order(
        &self,
        credentials: &ExchangeCredentials,
        inst_id: &str,
        algo_id: &str,
    ) -> Result<OkxOrderAck, ExchangeError> {
        let request = vec![OkxCancelAlgoRequest {
            algo_id: algo_id.to_string(),
            inst_id: inst_id.to_string(),
        }];
        let response: OkxResponse<Vec<OkxOrderAck>> = self
            .client
            .post_signed(
                credentials,
                "/api/v5/trade/cancel-algos",
                &Self::encode(&request)?,
            )
            .await?;
        single(response.data, "algo cancel acknowledgement")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_algo_order(
        &self,
        credentials: &ExchangeCredentials,
        algo_id: &str,
    ) -> Result<OkxAlgoOrder, ExchangeError> {
        let response: OkxResponse<Vec<OkxAlgoOrder>> = self
            .client
            .get_signed(credentials, "/api/v5/trade/order-algo", &[("algoId", algo_id)])
            .await?;
        single(response.data, "algo order")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_pending_algo_orders(
        &self,
        credentials: &ExchangeCredentials,
        inst_id: Option<&str>,
    ) -> Result<Vec<OkxAlgoOrder>, ExchangeError> {
        let mut query = vec![("ordType", "trigger"), ("instType", "SPOT")];
        if let Some(inst_id) = inst_id {
            query.push(("instId", inst_id));
        }
        let response: OkxResponse<Vec<OkxAlgoOrder>> = self
            .client
            .get_signed(credentials, "/api/v5/trade/orders-algo-pending", &query)
            .await?;
        Ok(response.data)
    }
}
