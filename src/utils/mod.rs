pub mod exchange_factory;
