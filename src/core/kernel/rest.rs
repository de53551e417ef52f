use crate::core::config::{ConnectorConfig, ExchangeCredentials};
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{Clock, SignRequest, Signer, SystemClock};
use crate::core::kernel::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, instrument};

/// Exchange-specific response classification
///
/// Runs before the generic status handling, so an exchange can recognise
/// error envelopes returned with a 2xx status, timestamp rejections, or
/// rate-limit codes that do not use HTTP 429.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, status: u16, body: &str) -> Option<ExchangeError>;
}

/// Classifier that leaves everything to the generic rules
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnlyClassifier;

impl ErrorClassifier for StatusOnlyClassifier {
    fn classify(&self, _status: u16, _body: &str) -> Option<ExchangeError> {
        None
    }
}

/// Pulls a human readable message out of a JSON error body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn parse_retry_after(response: &HttpResponse) -> Option<Duration> {
    let seconds = response.header("Retry-After")?.trim().parse::<f64>().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

/// Whether a request may be sent again after a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    Idempotent,
    Never,
}

/// Signed JSON-over-HTTP client shared by every exchange profile
///
/// Builds URLs from the injected base URL, signs with the injected `Signer`
/// using a timestamp read from the `Clock` on every attempt, and classifies
/// responses into `ExchangeError`.
#[derive(Clone)]
pub struct RestClient {
    exchange: &'static str,
    config: ConnectorConfig,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn Signer>,
    clock: Arc<dyn Clock>,
    classifier: Arc<dyn ErrorClassifier>,
    default_headers: Vec<(String, String)>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("exchange", &self.exchange)
            .field("base_url", &self.config.base_url)
            .field("sandbox", &self.config.sandbox)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub const fn exchange(&self) -> &'static str {
        self.exchange
    }

    pub const fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Current time from the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<(), ExchangeError> {
        self.signer.validate_credentials(credentials)
    }

    /// Unauthenticated GET, retried on transient failures
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        self.request(Method::GET, path, query, None, None, Retry::Idempotent)
            .await
    }

    /// Signed GET, retried on transient failures
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        credentials: &ExchangeCredentials,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        self.request(
            Method::GET,
            path,
            query,
            None,
            Some(credentials),
            Retry::Idempotent,
        )
        .await
    }

    /// Signed POST with a JSON body. Never retried.
    pub async fn post_signed<T: DeserializeOwned>(
        &self,
        credentials: &ExchangeCredentials,
        path: &str,
        body: &Value,
    ) -> Result<T, ExchangeError> {
        let body = serde_json::to_string(body)
            .map_err(|e| ExchangeError::SerializationError(e.to_string()))?;
        self.request(
            Method::POST,
            path,
            &[],
            Some(&body),
            Some(credentials),
            Retry::Never,
        )
        .await
    }

    /// Signed DELETE. Never retried.
    pub async fn delete_signed<T: DeserializeOwned>(
        &self,
        credentials: &ExchangeCredentials,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExchangeError> {
        self.request(
            Method::DELETE,
            path,
            query,
            None,
            Some(credentials),
            Retry::Never,
        )
        .await
    }

    fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ExchangeError> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path)).map_err(|e| {
            ExchangeError::InvalidParameters(format!("Invalid request URL for {}: {}", path, e))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        // from_millis(2) doubles each step; the factor scales the first step
        // to the configured base delay
        let base_ms = u64::try_from(self.config.retry_base_delay.as_millis()).unwrap_or(u64::MAX);
        ExponentialBackoff::from_millis(2)
            .factor((base_ms / 2).max(1))
            .max_delay(self.config.retry_max_delay)
            .map(jitter)
            .take(self.config.max_retries)
    }

    #[instrument(
        skip(self, query, body, credentials),
        fields(exchange = self.exchange, method = %method, path = %path)
    )]
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&str>,
        credentials: Option<&ExchangeCredentials>,
        retry: Retry,
    ) -> Result<T, ExchangeError> {
        let url = self.build_url(path, query)?;

        let response = match retry {
            Retry::Never => self.send_once(&method, &url, body, credentials).await?,
            Retry::Idempotent => {
                let mut attempt = 0_usize;
                let (method, url) = (&method, &url);
                RetryIf::spawn(
                    self.retry_strategy(),
                    || {
                        attempt += 1;
                        let attempt = attempt;
                        async move {
                            if attempt > 1 {
                                debug!(attempt, "Retrying idempotent request");
                            }
                            self.send_once(method, url, body, credentials).await
                        }
                    },
                    ExchangeError::is_transient,
                )
                .await?
            }
        };

        serde_json::from_str(&response.body).map_err(|e| {
            ExchangeError::ParseError(format!(
                "Unexpected {} response shape for {}: {}",
                self.exchange, path, e
            ))
        })
    }

    /// One signed, timed, classified round trip
    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&str>,
        credentials: Option<&ExchangeCredentials>,
    ) -> Result<HttpResponse, ExchangeError> {
        let mut request = HttpRequest {
            method: method.clone(),
            url: url.clone(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: body.map(str::to_string),
        };
        request.headers.extend(self.default_headers.iter().cloned());

        if let Some(credentials) = credentials {
            let path = request.path_and_query();
            let signed = self.signer.sign(
                credentials,
                &SignRequest {
                    timestamp: self.clock.now(),
                    method: method.as_str(),
                    path: &path,
                    body: body.unwrap_or_default(),
                },
            )?;
            request.headers.extend(signed);
        }

        let response = tokio::time::timeout(self.config.timeout, self.transport.execute(request))
            .await
            .map_err(|_| {
                ExchangeError::Timeout(format!(
                    "{} {} exceeded {:?}",
                    method,
                    url.path(),
                    self.config.timeout
                ))
            })??;

        self.classify(response)
    }

    fn classify(&self, response: HttpResponse) -> Result<HttpResponse, ExchangeError> {
        if let Some(err) = self.classifier.classify(response.status, &response.body) {
            return Err(err);
        }

        if response.status == 429 {
            return Err(ExchangeError::RateLimitExceeded {
                message: extract_error_message(&response.body)
                    .unwrap_or_else(|| "HTTP 429 Too Many Requests".to_string()),
                retry_after: parse_retry_after(&response),
            });
        }

        if !response.is_success() {
            return Err(ExchangeError::HttpError {
                code: response.status,
                message: extract_error_message(&response.body)
                    .unwrap_or_else(|| format!("HTTP {}", response.status)),
                raw_body: response.body,
            });
        }

        Ok(response)
    }
}

/// Builder for `RestClient`
pub struct RestClientBuilder {
    exchange: &'static str,
    config: ConnectorConfig,
    signer: Arc<dyn Signer>,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Arc<dyn Clock>,
    classifier: Arc<dyn ErrorClassifier>,
    default_headers: Vec<(String, String)>,
}

impl RestClientBuilder {
    pub fn new(exchange: &'static str, config: ConnectorConfig, signer: Arc<dyn Signer>) -> Self {
        Self {
            exchange,
            config,
            signer,
            transport: None,
            clock: Arc::new(SystemClock),
            classifier: Arc::new(StatusOnlyClassifier),
            default_headers: Vec::new(),
        }
    }

    /// Use a custom transport instead of reqwest
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Header sent on every request, signed or not
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<RestClient, ExchangeError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };

        Ok(RestClient {
            exchange: self.exchange,
            config: self.config,
            transport,
            signer: self.signer,
            clock: self.clock,
            classifier: self.classifier,
            default_headers: self.default_headers,
        })
    }
}
