pub mod conversions;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;

pub use builder::{build_connector, CoinbaseBuilder};
pub use connector::{Account, CoinbaseConnector, Market, Trading};
pub use types::{
    CoinbaseAccount, CoinbaseOrder, CoinbaseOrderBook, CoinbaseOrderRequest, CoinbaseStats,
    CoinbaseTicker,
};
