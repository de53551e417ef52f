use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::types::AccountInfo;
use crate::exchanges::coinbase::{conversions, rest::CoinbaseRest};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct Account {
    rest: CoinbaseRest,
}

impl Account {
    pub const fn new(rest: CoinbaseRest) -> Self {
        Self { rest }
    }

    pub fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<(), ExchangeError> {
        self.rest.validate_credentials(credentials)
    }

    #[instrument(skip(self, credentials), fields(exchange = "coinbase"))]
    pub async fn get_account_info(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<AccountInfo, ExchangeError> {
        let accounts = self.rest.get_accounts(credentials).await?;
        conversions::convert_account(accounts)
    }
}
