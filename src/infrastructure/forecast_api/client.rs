use crate::domain::errors::ApiError;
use crate::domain::forecast::PredictionRequest;
use crate::domain::ports::{ApiCall, ForecastApi, ResponseBody};
use crate::infrastructure::http_client_factory::{HttpClientFactory, endpoint_url};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest error body kept in an [`ApiError::Status`] message.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// HTTP client for the forecasting backend.
///
/// Every call is a single attempt. Failures of any kind come back inside the
/// returned [`ApiCall`] together with the elapsed time; nothing is raised to
/// the caller.
#[derive(Clone)]
pub struct ForecastApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ForecastApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: HttpClientFactory::create_client(timeout),
            base_url,
            timeout,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// Issues one request and normalizes the result.
    pub async fn call(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> ApiCall {
        let start = Instant::now();
        let outcome = self.send(method, url, body, timeout).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(_) => info!(
                "ForecastApiClient: {} {} OK in {:.3}s",
                method,
                url,
                elapsed.as_secs_f64()
            ),
            Err(e) => warn!(
                "ForecastApiClient: {} {} failed in {:.3}s: {}",
                method,
                url,
                elapsed.as_secs_f64(),
                e
            ),
        }

        ApiCall { elapsed, outcome }
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<ResponseBody, ApiError> {
        let parsed = url::Url::parse(url).map_err(|e| ApiError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut request = self
            .client
            .request(method.into(), parsed)
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(&e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_error(&e, timeout))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY_CHARS),
            });
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => Ok(ResponseBody::Json(json)),
            Err(e) => {
                debug!("ForecastApiClient: non-JSON body from {}: {}", url, e);
                Ok(ResponseBody::Text(text))
            }
        }
    }
}

#[async_trait]
impl ForecastApi for ForecastApiClient {
    async fn health(&self) -> ApiCall {
        let url = self.url_for("health");
        self.call(HttpMethod::Get, &url, None, self.timeout).await
    }

    async fn metadata(&self) -> ApiCall {
        let url = self.url_for("metadata");
        self.call(HttpMethod::Get, &url, None, self.timeout).await
    }

    async fn predict(&self, request: &PredictionRequest) -> ApiCall {
        let url = self.url_for("predict");
        let body = match serde_json::to_value(request) {
            Ok(body) => body,
            Err(e) => {
                return ApiCall {
                    elapsed: Duration::ZERO,
                    outcome: Err(ApiError::Other {
                        reason: format!("failed to encode request: {}", e),
                    }),
                };
            }
        };
        self.call(HttpMethod::Post, &url, Some(&body), self.timeout)
            .await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn classify_error(err: &reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout {
            timeout_secs: timeout.as_secs_f64(),
        }
    } else if err.is_connect() {
        ApiError::Connection {
            reason: error_chain(err),
        }
    } else {
        ApiError::Other {
            reason: error_chain(err),
        }
    }
}

/// Flattens an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ForecastApiClient::new("http://127.0.0.1:8000/", Duration::from_secs(5));
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url_for("predict"), "http://127.0.0.1:8000/predict");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported_not_raised() {
        let client = ForecastApiClient::new("not a url", Duration::from_secs(1));
        let call = client.health().await;
        assert!(matches!(call.outcome, Err(ApiError::InvalidUrl { .. })));
        assert!(call.body().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let client = ForecastApiClient::new("ftp://example.com", Duration::from_secs(1));
        let call = client.metadata().await;
        let msg = call.error_message().unwrap();
        assert!(msg.contains("unsupported scheme"));
    }
}
