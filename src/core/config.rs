use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;
use std::time::Duration;

/// Supported exchange profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Coinbase,
    Okx,
}

impl ExchangeId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coinbase => "coinbase",
            Self::Okx => "okx",
        }
    }

    /// Prefix used for environment variables (e.g. `COINBASE_API_KEY`)
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Coinbase => "COINBASE",
            Self::Okx => "OKX",
        }
    }

    pub const fn production_url(self) -> &'static str {
        match self {
            Self::Coinbase => "https://api.exchange.coinbase.com",
            Self::Okx => "https://www.okx.com",
        }
    }

    pub const fn sandbox_url(self) -> &'static str {
        match self {
            Self::Coinbase => "https://api-public.sandbox.exchange.coinbase.com",
            // OKX demo trading shares the production host and is selected by header
            Self::Okx => "https://www.okx.com",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExchangeId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coinbase" => Ok(Self::Coinbase),
            "okx" => Ok(Self::Okx),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "Unknown exchange: {}",
                other
            ))),
        }
    }
}

/// API credentials supplied by the caller.
///
/// Held by a connector only between `connect()` and `disconnect()`.
#[derive(Debug, Clone)]
pub struct ExchangeCredentials {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub passphrase: Option<Secret<String>>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeCredentials", 3)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field(
            "passphrase",
            &self.passphrase.as_ref().map(|_| "[REDACTED]"),
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeCredentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CredentialsHelper {
            api_key: String,
            secret_key: String,
            passphrase: Option<String>,
        }

        let helper = CredentialsHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            passphrase: helper.passphrase.map(Secret::new),
        })
    }
}

impl ExchangeCredentials {
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            passphrase: None,
        }
    }

    #[must_use]
    pub fn with_passphrase(mut self, passphrase: String) -> Self {
        self.passphrase = Some(Secret::new(passphrase));
        self
    }

    /// Create credentials from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `COINBASE_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (e.g., `COINBASE_SECRET_KEY`)
    /// - `{EXCHANGE}_PASSPHRASE` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);
        let passphrase_var = format!("{}_PASSPHRASE", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let passphrase = env::var(&passphrase_var).ok().filter(|p| !p.is_empty());

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            passphrase: passphrase.map(Secret::new),
        })
    }

    /// Create credentials from a .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create credentials from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        load_env_file(env_file_path)?;
        Self::from_env(exchange_prefix)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_ref().map(|p| p.expose_secret().as_str())
    }
}

/// Loads a .env file; a missing file is not an error.
#[cfg(feature = "env-file")]
fn load_env_file(env_file_path: &str) -> Result<(), ConfigError> {
    match dotenv::from_path(env_file_path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::InvalidConfiguration(format!(
            "Failed to load .env file '{}': {}",
            env_file_path, e
        ))),
    }
}

/// Connection settings injected into a connector at construction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub exchange: ExchangeId,
    pub base_url: String,
    pub sandbox: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retries for idempotent reads
    pub max_retries: usize,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub user_agent: String,
}

impl ConnectorConfig {
    #[must_use]
    pub fn production(exchange: ExchangeId) -> Self {
        Self::with_url(exchange, exchange.production_url().to_string(), false)
    }

    #[must_use]
    pub fn sandbox(exchange: ExchangeId) -> Self {
        Self::with_url(exchange, exchange.sandbox_url().to_string(), true)
    }

    fn with_url(exchange: ExchangeId, base_url: String, sandbox: bool) -> Self {
        Self {
            exchange,
            base_url,
            sandbox,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(2),
            user_agent: "tradelink/0.1".to_string(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// - `{EXCHANGE}_SANDBOX` (optional, defaults to false)
    /// - `{EXCHANGE}_BASE_URL` (optional override)
    pub fn from_env(exchange: ExchangeId) -> Result<Self, ConfigError> {
        let prefix = exchange.env_prefix();
        let sandbox_var = format!("{}_SANDBOX", prefix);
        let base_url_var = format!("{}_BASE_URL", prefix);

        let sandbox = match env::var(&sandbox_var) {
            Ok(value) => value.parse::<bool>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{} must be true or false, got '{}'",
                    sandbox_var, value
                ))
            })?,
            Err(_) => false,
        };

        let config = if sandbox {
            Self::sandbox(exchange)
        } else {
            Self::production(exchange)
        };

        Ok(match env::var(&base_url_var) {
            Ok(base_url) if !base_url.is_empty() => config.with_base_url(base_url),
            _ => config,
        })
    }

    /// Set custom base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
