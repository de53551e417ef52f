use crate::core::config::ConnectorConfig;
use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::trace;

/// Fully prepared HTTP request, already signed
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Path plus query string, as covered by request signatures
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Executes HTTP requests
///
/// Implementations only move bytes; they never retry and never interpret
/// status codes. Failures to obtain a response map to `NetworkError` or
/// `Timeout`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError>;
}

/// `HttpTransport` backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ConnectorConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> ExchangeError {
    if err.is_timeout() {
        ExchangeError::Timeout(err.to_string())
    } else {
        ExchangeError::NetworkError(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| map_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|e| map_reqwest_error(&e))?;

        trace!(status, body = %body, "Response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query_preserves_repeated_keys() {
        let url = Url::parse_with_params(
            "https://api.example.com/orders",
            &[("status", "open"), ("status", "pending")],
        )
        .unwrap();
        let request = HttpRequest {
            method: Method::GET,
            url,
            headers: vec![("X-Key".to_string(), "k".to_string())],
            body: None,
        };
        assert_eq!(request.path_and_query(), "/orders?status=open&status=pending");
        assert_eq!(request.header("x-key"), Some("k"));
    }

    #[test]
    fn test_response_header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 429,
            headers: vec![("retry-after".to_string(), "3".to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("Retry-After"), Some("3"));
        assert!(!response.is_success());
    }
}
