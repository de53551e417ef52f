use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Not connected: call connect() first")]
    NotConnected,

    #[error("Connection verification failed: {0}")]
    ConnectionError(#[source] Box<ExchangeError>),

    #[error("HTTP error: {code} - {message}")]
    HttpError {
        code: u16,
        message: String,
        raw_body: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Request timestamp rejected: {0}")]
    TimestampRejected(String),

    #[error("Market data fetch failed: {0}")]
    MarketDataError(#[source] Box<ExchangeError>),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ExchangeError {
    /// Whether a retry of an idempotent request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::Timeout(_) => true,
            Self::HttpError { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Retry hint supplied by the exchange, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<rust_decimal::Error> for ExchangeError {
    fn from(err: rust_decimal::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Public connector operations, carried by every surfaced error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    GetMarketData,
    GetOrderBook,
    PlaceOrder,
    CancelOrder,
    GetOrderStatus,
    GetOpenOrders,
    GetAccountInfo,
    SubscribePriceUpdates,
    UnsubscribePriceUpdates,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::GetMarketData => "get_market_data",
            Self::GetOrderBook => "get_order_book",
            Self::PlaceOrder => "place_order",
            Self::CancelOrder => "cancel_order",
            Self::GetOrderStatus => "get_order_status",
            Self::GetOpenOrders => "get_open_orders",
            Self::GetAccountInfo => "get_account_info",
            Self::SubscribePriceUpdates => "subscribe_price_updates",
            Self::UnsubscribePriceUpdates => "unsubscribe_price_updates",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol / order identifiers attached to a failed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub symbol: Option<String>,
    pub order_id: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.symbol, &self.order_id) {
            (None, None) => Ok(()),
            (Some(symbol), None) => write!(f, " [symbol={}]", symbol),
            (None, Some(order_id)) => write!(f, " [order_id={}]", order_id),
            (Some(symbol), Some(order_id)) => {
                write!(f, " [symbol={}, order_id={}]", symbol, order_id)
            }
        }
    }
}

/// Error returned across the connector boundary.
///
/// Wraps a classified [`ExchangeError`] with the operation that produced it and
/// any symbol / order id involved, so callers can log and display a specific
/// message without re-deriving the context.
#[derive(Error, Debug)]
#[error("{exchange} {operation}{context} failed: {source}")]
pub struct ConnectorError {
    pub exchange: &'static str,
    pub operation: Operation,
    pub context: ErrorContext,
    #[source]
    pub source: ExchangeError,
}

impl ConnectorError {
    pub fn new(exchange: &'static str, operation: Operation, source: ExchangeError) -> Self {
        Self {
            exchange,
            operation,
            context: ErrorContext::default(),
            source,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.context.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.context.order_id = Some(order_id.into());
        self
    }

    /// The classified error kind.
    pub fn kind(&self) -> &ExchangeError {
        &self.source
    }

    pub fn into_kind(self) -> ExchangeError {
        self.source
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.source.retry_after()
    }
}

/// Helper trait for attaching operation context to exchange results
pub trait ResultExt<T> {
    fn for_operation(self, exchange: &'static str, operation: Operation)
        -> Result<T, ConnectorError>;

    fn for_symbol(
        self,
        exchange: &'static str,
        operation: Operation,
        symbol: &str,
    ) -> Result<T, ConnectorError>;

    fn for_order(
        self,
        exchange: &'static str,
        operation: Operation,
        symbol: &str,
        order_id: &str,
    ) -> Result<T, ConnectorError>;
}

impl<T> ResultExt<T> for Result<T, ExchangeError> {
    fn for_operation(
        self,
        exchange: &'static str,
        operation: Operation,
    ) -> Result<T, ConnectorError> {
        self.map_err(|e| {
            tracing::warn!(exchange, operation = %operation, error = %e, "Operation failed");
            ConnectorError::new(exchange, operation, e)
        })
    }

    fn for_symbol(
        self,
        exchange: &'static str,
        operation: Operation,
        symbol: &str,
    ) -> Result<T, ConnectorError> {
        self.map_err(|e| {
            tracing::warn!(exchange, operation = %operation, symbol = %symbol, error = %e, "Operation failed");
            ConnectorError::new(exchange, operation, e).with_symbol(symbol)
        })
    }

    fn for_order(
        self,
        exchange: &'static str,
        operation: Operation,
        symbol: &str,
        order_id: &str,
    ) -> Result<T, ConnectorError> {
        self.map_err(|e| {
            tracing::warn!(
                exchange,
                operation = %operation,
                symbol = %symbol,
                order_id = %order_id,
                error = %e,
                "Order operation failed"
            );
            ConnectorError::new(exchange, operation, e)
                .with_symbol(symbol)
                .with_order_id(order_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ExchangeError::Timeout("slow".to_string()).is_transient());
        assert!(ExchangeError::NetworkError("reset".to_string()).is_transient());
        assert!(ExchangeError::HttpError {
            code: 503,
            message: "unavailable".to_string(),
            raw_body: String::new(),
        }
        .is_transient());
        assert!(!ExchangeError::HttpError {
            code: 400,
            message: "bad request".to_string(),
            raw_body: String::new(),
        }
        .is_transient());
        assert!(!ExchangeError::RateLimitExceeded {
            message: "slow down".to_string(),
            retry_after: None,
        }
        .is_transient());
    }

    #[test]
    fn test_connector_error_display_carries_context() {
        let err: Result<(), ExchangeError> = Err(ExchangeError::NotConnected);
        let err = err
            .for_order("coinbase", Operation::CancelOrder, "BTCUSD", "abc-123")
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("cancel_order"));
        assert!(message.contains("symbol=BTCUSD"));
        assert!(message.contains("order_id=abc-123"));
        assert!(matches!(err.kind(), ExchangeError::NotConnected));
    }

    #[test]
    fn test_retry_after_surfaces_through_wrapper() {
        let err = ConnectorError::new(
            "okx",
            Operation::GetMarketData,
            ExchangeError::RateLimitExceeded {
                message: "429".to_string(),
                retry_after: Some(Duration::from_secs(2)),
            },
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    }
}
