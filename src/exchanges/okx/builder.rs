use crate::core::config::{ConnectorConfig, ExchangeId};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Clock, HmacSigner, HttpTransport, RestClientBuilder};
use crate::exchanges::okx::{
    connector::OkxConnector,
    conversions::{OkxClassifier, EXCHANGE, OKX_SIGNING, SIMULATED_TRADING_HEADER},
    rest::OkxRest,
};
use std::sync::Arc;
use std::time::Duration;

/// Builder for OKX connectors
///
/// OKX serves demo trading from the production host; sandbox mode is selected
/// by sending `x-simulated-trading: 1` on every request.
pub struct OkxBuilder {
    config: ConnectorConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for OkxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OkxBuilder {
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::production(ExchangeId::Okx),
            transport: None,
            clock: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.config = self.config.with_max_retries(max_retries);
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<OkxConnector, ExchangeError> {
        if self.config.exchange != ExchangeId::Okx {
            return Err(ExchangeError::InvalidParameters(format!(
                "OKX builder received a {} configuration",
                self.config.exchange
            )));
        }

        let sandbox = self.config.sandbox;
        let mut rest = RestClientBuilder::new(
            EXCHANGE,
            self.config,
            Arc::new(HmacSigner::new(OKX_SIGNING)),
        )
        .with_classifier(Arc::new(OkxClassifier));
        if sandbox {
            rest = rest.with_default_header(SIMULATED_TRADING_HEADER, "1");
        }
        if let Some(transport) = self.transport {
            rest = rest.with_transport(transport);
        }
        if let Some(clock) = self.clock {
            rest = rest.with_clock(clock);
        }

        Ok(OkxConnector::new(OkxRest::new(rest.build()?)))
    }
}

/// Build an OKX connector from an injected configuration
pub fn build_connector(config: ConnectorConfig) -> Result<OkxConnector, ExchangeError> {
    OkxBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{MockReply, MockTransport};
    use crate::core::traits::ExchangeConnector;
    use reqwest::Method;
    use serde_json::json;

    fn ticker_reply() -> MockReply {
        MockReply::json(
            200,
            json!({
                "code": "0",
                "msg": "",
                "data": [{
                    "instId": "BTC-USDT",
                    "last": "43000",
                    "bidPx": "42999.9",
                    "askPx": "43000.1",
                    "open24h": "42000",
                    "high24h": "43500",
                    "low24h": "41800",
                    "vol24h": "1520.4",
                    "volCcy24h": "65000000",
                    "ts": "1700000000000"
                }]
            }),
        )
    }

    #[test]
    fn test_builder_defaults_to_production_host() {
        let builder = OkxBuilder::new();
        assert!(!builder.config.sandbox);
        assert_eq!(builder.config.base_url, "https://www.okx.com");
    }

    #[test]
    fn test_build_rejects_foreign_config() {
        let result = build_connector(ConnectorConfig::production(ExchangeId::Coinbase));
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_sandbox_sends_simulated_trading_header() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(Method::GET, "/api/v5/market/ticker", ticker_reply());

        let connector = OkxBuilder::new()
            .with_sandbox(true)
            .with_transport(transport.clone())
            .build()
            .unwrap();
        connector.get_market_data("BTCUSDT").await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.header(SIMULATED_TRADING_HEADER), Some("1"));
    }

    #[tokio::test]
    async fn test_production_omits_simulated_trading_header() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(Method::GET, "/api/v5/market/ticker", ticker_reply());

        let connector = OkxBuilder::new()
            .with_transport(transport.clone())
            .build()
            .unwrap();
        connector.get_market_data("BTCUSDT").await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.header(SIMULATED_TRADING_HEADER), None);
    }
}
