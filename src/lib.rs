pub mod core;
pub mod exchanges;
pub mod utils;

pub use core::{
    config::{ConfigError, ConnectorConfig, ExchangeCredentials, ExchangeId},
    errors::{ConnectorError, ExchangeError, Operation},
    traits::{ExchangeConnector, PriceCallback},
    types::*,
};
pub use exchanges::coinbase::CoinbaseConnector;
pub use exchanges::okx::OkxConnector;
pub use utils::exchange_factory::ExchangeFactory;
