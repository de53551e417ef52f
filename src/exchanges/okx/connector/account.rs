use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::types::AccountInfo;
use crate::exchanges::okx::{conversions, rest::OkxRest};
use tracing::instrument;

/// OKX account implementation
#[derive(Debug, Clone)]
pub struct Account {
    rest: OkxRest,
}

impl Account {
    pub const fn new(rest: OkxRest) -> Self {
        Self { rest }
    }

    pub fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<(), ExchangeError> {
        self.rest.validate_credentials(credentials)
    }

    /// Balances and permissions come from two endpoints, fetched together
    #[instrument(skip(self, credentials), fields(exchange = "okx"))]
    pub async fn get_account_info(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<AccountInfo, ExchangeError> {
        let (balance, config) = tokio::try_join!(
            self.rest.get_balance(credentials),
            self.rest.get_account_config(credentials)
        )?;
        conversions::convert_account(balance, config)
    }
}
