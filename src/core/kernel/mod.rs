//! Transport and authentication kernel shared by every exchange profile.
//!
//! Exchange modules supply data (a `SigningScheme`, an `ErrorClassifier`,
//! endpoint paths) and the kernel does the rest: URL building, signing with a
//! fresh clock reading per attempt, per-request timeouts, retries for
//! idempotent reads and response classification.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tradelink::core::config::{ConnectorConfig, ExchangeId};
//! use tradelink::core::kernel::{HmacSigner, RestClientBuilder};
//! use tradelink::exchanges::coinbase::conversions::COINBASE_SIGNING;
//!
//! # fn demo() -> Result<(), tradelink::ExchangeError> {
//! let rest = RestClientBuilder::new(
//!     "coinbase",
//!     ConnectorConfig::sandbox(ExchangeId::Coinbase),
//!     Arc::new(HmacSigner::new(COINBASE_SIGNING)),
//! )
//! .build()?;
//! # let _ = rest;
//! # Ok(())
//! # }
//! ```
pub mod mock;
pub mod rest;
pub mod signer;
pub mod transport;

pub use mock::{MockReply, MockTransport};
pub use rest::{
    extract_error_message, ErrorClassifier, RestClient, RestClientBuilder, StatusOnlyClassifier,
};
pub use signer::{
    Clock, FixedClock, HeaderNames, HmacSigner, KeyEncoding, SignRequest, SignedHeaders, Signer,
    SigningScheme, SystemClock, TimestampFormat,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
