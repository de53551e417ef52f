use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Headers to attach to a signed request
pub type SignedHeaders = Vec<(String, String)>;

/// Request metadata covered by a signature
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// Captured by the caller immediately before signing
    pub timestamp: DateTime<Utc>,
    pub method: &'a str,
    /// Request path including the query string, if any
    pub path: &'a str,
    /// Raw request body, empty for body-less requests
    pub body: &'a str,
}

/// Signer trait for request authentication
///
/// Implementations own the exchange-specific canonical string, key handling
/// and header names. Credentials are passed per call; a signer holds no
/// session state.
pub trait Signer: Send + Sync {
    /// Sign a request and return the authentication headers to include
    fn sign(
        &self,
        credentials: &ExchangeCredentials,
        request: &SignRequest<'_>,
    ) -> Result<SignedHeaders, ExchangeError>;

    /// Check credentials before any network call is made
    fn validate_credentials(&self, credentials: &ExchangeCredentials) -> Result<(), ExchangeError> {
        require_non_empty("api_key", credentials.api_key())?;
        require_non_empty("secret_key", credentials.secret_key())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ExchangeError> {
    if value.trim().is_empty() {
        return Err(ExchangeError::CredentialError(format!(
            "{} is required",
            field
        )));
    }
    Ok(())
}

/// Clock source for request timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant, for deterministic signatures in tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// How the secret key is turned into HMAC key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Secret is base64 and must be decoded first
    Base64,
    /// Secret bytes are used as-is
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Whole seconds since the epoch, e.g. `1700000000`
    EpochSeconds,
    /// ISO-8601 with milliseconds, e.g. `2023-11-14T22:13:20.000Z`
    Iso8601Millis,
}

/// Authentication header names of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderNames {
    pub api_key: &'static str,
    pub signature: &'static str,
    pub timestamp: &'static str,
    /// `None` for exchanges without a passphrase
    pub passphrase: Option<&'static str>,
}

/// Parameters of an HMAC-SHA256 / base64 signature scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningScheme {
    pub headers: HeaderNames,
    pub key_encoding: KeyEncoding,
    pub timestamp_format: TimestampFormat,
}

/// HMAC-SHA256 signer with a base64-encoded signature
///
/// Canonical string: `timestamp + METHOD + path + body`.
#[derive(Debug, Clone, Copy)]
pub struct HmacSigner {
    scheme: SigningScheme,
}

impl HmacSigner {
    pub const fn new(scheme: SigningScheme) -> Self {
        Self { scheme }
    }

    pub const fn scheme(&self) -> &SigningScheme {
        &self.scheme
    }

    pub fn format_timestamp(&self, timestamp: DateTime<Utc>) -> String {
        match self.scheme.timestamp_format {
            TimestampFormat::EpochSeconds => timestamp.timestamp().to_string(),
            TimestampFormat::Iso8601Millis => {
                timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
            }
        }
    }

    pub fn prehash(timestamp: &str, method: &str, path: &str, body: &str) -> String {
        format!(
            "{}{}{}{}",
            timestamp,
            method.to_ascii_uppercase(),
            path,
            body
        )
    }

    fn key_bytes(&self, secret: &str) -> Result<Vec<u8>, ExchangeError> {
        match self.scheme.key_encoding {
            KeyEncoding::Raw => Ok(secret.as_bytes().to_vec()),
            KeyEncoding::Base64 => general_purpose::STANDARD.decode(secret.trim()).map_err(|e| {
                ExchangeError::CredentialError(format!("secret_key is not valid base64: {}", e))
            }),
        }
    }

    /// Compute the base64 signature of a canonical string
    pub fn signature(&self, secret: &str, prehash: &str) -> Result<String, ExchangeError> {
        let key = self.key_bytes(secret)?;
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| ExchangeError::CredentialError(format!("Invalid secret key: {}", e)))?;
        mac.update(prehash.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign(
        &self,
        credentials: &ExchangeCredentials,
        request: &SignRequest<'_>,
    ) -> Result<SignedHeaders, ExchangeError> {
        let timestamp = self.format_timestamp(request.timestamp);
        let prehash = Self::prehash(&timestamp, request.method, request.path, request.body);
        let signature = self.signature(credentials.secret_key(), &prehash)?;

        let headers = &self.scheme.headers;
        let mut signed = vec![
            (headers.api_key.to_string(), credentials.api_key().to_string()),
            (headers.signature.to_string(), signature),
            (headers.timestamp.to_string(), timestamp),
        ];

        if let Some(passphrase_header) = headers.passphrase {
            let passphrase = credentials.passphrase().ok_or_else(|| {
                ExchangeError::CredentialError("passphrase is required".to_string())
            })?;
            signed.push((passphrase_header.to_string(), passphrase.to_string()));
        }

        Ok(signed)
    }

    fn validate_credentials(&self, credentials: &ExchangeCredentials) -> Result<(), ExchangeError> {
        require_non_empty("api_key", credentials.api_key())?;
        require_non_empty("secret_key", credentials.secret_key())?;
        if self.scheme.headers.passphrase.is_some() {
            require_non_empty("passphrase", credentials.passphrase().unwrap_or_default())?;
        }
        self.key_bytes(credentials.secret_key()).map(|_| ())
    }
}
