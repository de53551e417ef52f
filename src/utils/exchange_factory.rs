use crate::core::config::{ConnectorConfig, ExchangeId};
use crate::core::errors::ExchangeError;
use crate::core::kernel::HttpTransport;
use crate::core::traits::ExchangeConnector;
use crate::exchanges::{coinbase::CoinbaseBuilder, okx::OkxBuilder};
use std::sync::Arc;

/// Factory for creating exchange connectors
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Every exchange profile this crate ships
    pub const fn supported_exchanges() -> &'static [ExchangeId] {
        &[ExchangeId::Coinbase, ExchangeId::Okx]
    }

    /// Create a connector for `exchange`
    ///
    /// Without an explicit config the documented production or sandbox
    /// endpoints are used. A config naming a different exchange is rejected.
    pub fn create_connector(
        exchange: ExchangeId,
        config: Option<ConnectorConfig>,
        sandbox: bool,
    ) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
        let config = config.unwrap_or_else(|| {
            if sandbox {
                ConnectorConfig::sandbox(exchange)
            } else {
                ConnectorConfig::production(exchange)
            }
        });
        Self::build(exchange, config, None)
    }

    /// Same as `create_connector`, sending every request through `transport`
    pub fn create_connector_with_transport(
        exchange: ExchangeId,
        config: ConnectorConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
        Self::build(exchange, config, Some(transport))
    }

    fn build(
        exchange: ExchangeId,
        config: ConnectorConfig,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Result<Box<dyn ExchangeConnector>, ExchangeError> {
        match exchange {
            ExchangeId::Coinbase => {
                let mut builder = CoinbaseBuilder::new().with_config(config);
                if let Some(transport) = transport {
                    builder = builder.with_transport(transport);
                }
                Ok(Box::new(builder.build()?))
            }
            ExchangeId::Okx => {
                let mut builder = OkxBuilder::new().with_config(config);
                if let Some(transport) = transport {
                    builder = builder.with_transport(transport);
                }
                Ok(Box::new(builder.build()?))
            }
        }
    }
}
