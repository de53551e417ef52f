pub mod coinbase;
pub mod okx;
