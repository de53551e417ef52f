use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::types::{OrderParams, OrderResult};
use crate::exchanges::okx::conversions::{self, OkxOrderRef};
use crate::exchanges::okx::rest::OkxRest;
use tracing::{info, instrument};
use uuid::Uuid;

/// OKX order placement and queries
#[derive(Debug, Clone)]
pub struct Trading {
    rest: OkxRest,
}

impl Trading {
    pub const fn new(rest: OkxRest) -> Self {
        Self { rest }
    }

    /// Places one order; stop types go through the algo endpoint and come
    /// back with an `algo:` prefixed id so later calls find them again.
    ///
    /// Client ids default to a dashless UUID, which fits OKX's 32 character
    /// alphanumeric limit.
    #[instrument(skip(self, credentials, params), fields(exchange = "okx", symbol = %params.symbol))]
    pub async fn place_order(
        &self,
        credentials: &ExchangeCredentials,
        params: OrderParams,
    ) -> Result<OrderResult, ExchangeError> {
        params.validate()?;

        let client_id = params
            .client_order_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        let order_id = if params.order_type.is_stop() {
            let request = conversions::algo_order_request(&params, &client_id)?;
            let ack = self.rest.place_algo_order(credentials, &request).await?;
            Self::require_id(&ack.algo_id)?;
            conversions::algo_order_id(&ack.algo_id)
        } else {
            let request = conversions::order_request(&params, &client_id);
            let ack = self.rest.place_order(credentials, &request).await?;
            Self::require_id(&ack.ord_id)?;
            ack.ord_id
        };

        info!(order_id = %order_id, client_id = %client_id, "Order placed");
        Ok(conversions::accepted_order(
            &params,
            order_id,
            client_id,
            self.rest.now(),
        ))
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn cancel_order(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
        symbol: &str,
    ) -> Result<bool, ExchangeError> {
        let inst_id = conversions::to_inst_id(symbol);
        let ack = match OkxOrderRef::parse(order_id)? {
            OkxOrderRef::Regular(ord_id) => {
                self.rest.cancel_order(credentials, &inst_id, ord_id).await?
            }
            OkxOrderRef::Algo(algo_id) => {
                self.rest
                    .cancel_algo_order(credentials, &inst_id, algo_id)
                    .await?
            }
        };
        Ok(ack.s_code.is_empty() || ack.s_code == "0")
    }

    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_order_status(
        &self,
        credentials: &ExchangeCredentials,
        order_id: &str,
        symbol: &str,
    ) -> Result<OrderResult, ExchangeError> {
        match OkxOrderRef::parse(order_id)? {
            OkxOrderRef::Regular(ord_id) => {
                let inst_id = conversions::to_inst_id(symbol);
                let order = self.rest.get_order(credentials, &inst_id, ord_id).await?;
                conversions::convert_order(order)
            }
            OkxOrderRef::Algo(algo_id) => {
                let order = self.rest.get_algo_order(credentials, algo_id).await?;
                conversions::convert_algo_order(order)
            }
        }
    }

    /// Regular pending orders followed by untriggered stop orders
    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_open_orders(
        &self,
        credentials: &ExchangeCredentials,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let inst_id = symbol.map(conversions::to_inst_id);
        let (orders, algo_orders) = tokio::try_join!(
            self.rest.get_pending_orders(credentials, inst_id.as_deref()),
            self.rest
                .get_pending_algo_orders(credentials, inst_id.as_deref()),
        )?;

        orders
            .into_iter()
            .map(conversions::convert_order)
            .chain(algo_orders.into_iter().map(conversions::convert_algo_order))
            .collect()
    }

    fn require_id(id: &str) -> Result<(), ExchangeError> {
        if id.is_empty() {
            return Err(ExchangeError::ParseError(
                "OKX acknowledged the order without an id".to_string(),
            ));
        }
        Ok(())
    }
}
