pub mod conversions;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;

pub use builder::{build_connector, OkxBuilder};
pub use connector::{Account, Market, OkxConnector, Trading};
pub use types::{
    OkxAccountBalance, OkxAccountConfig, OkxAlgoOrder, OkxAlgoOrderRequest, OkxOrder, OkxOrderAck,
    OkxOrderBook, OkxOrderRequest, OkxResponse, OkxTicker,
};
