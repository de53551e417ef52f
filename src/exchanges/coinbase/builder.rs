use crate::core::config::{ConnectorConfig, ExchangeId};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Clock, HmacSigner, HttpTransport, RestClientBuilder};
use crate::exchanges::coinbase::{
    connector::CoinbaseConnector,
    conversions::{CoinbaseClassifier, COINBASE_SIGNING, EXCHANGE},
    rest::CoinbaseRest,
};
use std::sync::Arc;
use std::time::Duration;

/// Builder for Coinbase Exchange connectors
///
/// Defaults to production with a reqwest transport and the system clock.
pub struct CoinbaseBuilder {
    config: ConnectorConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for CoinbaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinbaseBuilder {
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::production(ExchangeId::Coinbase),
            transport: None,
            clock: None,
        }
    }

    /// Replace the whole connection configuration
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Switch between the production and sandbox endpoints
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        let base_url = if sandbox {
            ExchangeId::Coinbase.sandbox_url()
        } else {
            ExchangeId::Coinbase.production_url()
        };
        self.config.sandbox = sandbox;
        self.config = self.config.with_base_url(base_url);
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

    pub fn build(self) -> Result<CoinbaseConnector, ExchangeError> {
        if self.config.exchange != ExchangeId::Coinbase {
            return Err(ExchangeError::InvalidParameters(format!(
                "Coinbase builder received a {} configuration",
                self.config.exchange
            )));
        }

        let mut rest = RestClientBuilder::new(
            EXCHANGE,
            self.config,
            Arc::new(HmacSigner::new(COINBASE_SIGNING)),
        )
        .with_classifier(Arc::new(CoinbaseClassifier));
        if let Some(transport) = self.transport {
            rest = rest.with_transport(transport);
        }
        if let Some(clock) = self.clock {
            rest = rest.with_clock(clock);
        }

        Ok(CoinbaseConnector::new(CoinbaseRest::new(rest.build()?)))
    }
}

/// Build a Coinbase connector from an injected configuration
pub fn build_connector(config: ConnectorConfig) -> Result<CoinbaseConnector, ExchangeError> {
    CoinbaseBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::MockTransport;
    use crate::core::traits::ExchangeConnector;
    use crate::core::types::ConnectionState;

    #[test]
    fn test_builder_defaults() {
        let builder = CoinbaseBuilder::new();
        assert!(!builder.config.sandbox);
        assert_eq!(builder.config.base_url, "https://api.exchange.coinbase.com");
    }

    #[test]
    fn test_builder_sandbox_switch() {
        let builder = CoinbaseBuilder::new().with_sandbox(true);
        assert!(builder.config.sandbox);
        assert_eq!(
            builder.config.base_url,
            "https://api-public.sandbox.exchange.coinbase.com"
        );
    }

    #[test]
    fn test_builder_fluent_settings() {
        let builder = CoinbaseBuilder::new()
            .with_base_url("http://localhost:8080/")
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(1);
        assert_eq!(builder.config.base_url, "http://localhost:8080");
        assert_eq!(builder.config.timeout, Duration::from_secs(5));
        assert_eq!(builder.config.max_retries, 1);
    }

    #[test]
    fn test_build_with_mock_transport_starts_disconnected() {
        let connector = CoinbaseBuilder::new()
            .with_transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();
        assert_eq!(connector.exchange_name(), "coinbase");
        assert_eq!(connector.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_build_rejects_foreign_config() {
        let result = build_connector(ConnectorConfig::production(ExchangeId::Okx));
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }
}
