pub mod config;
pub mod errors;
pub mod kernel;
pub mod mapping;
pub mod session;
pub mod symbols;
pub mod traits;
pub mod types;
