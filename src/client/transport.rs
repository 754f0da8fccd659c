//! HTTP transport shared by the resource and terminology clients
//!
//! This module owns the pooled HTTP session, authentication headers, and the
//! retry policy. The clients above it build FHIR-shaped requests and hand
//! them to [`HttpTransport::request`]; they never retry or classify status
//! codes themselves.

use crate::config::{RetryConfig, SecretString, ServerConfig};
use crate::domain::errors::RosettaError;
use crate::domain::result::Result;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// FHIR JSON media type sent as both Accept and Content-Type
const FHIR_JSON: &str = "application/fhir+json";

/// Maximum number of response-body bytes copied into error messages
const ERROR_BODY_LIMIT: usize = 500;

/// A completed HTTP exchange with a parsed JSON body
///
/// Only success (2xx) responses are represented; everything else is turned
/// into a [`RosettaError`] before it reaches a caller. An empty body parses
/// as [`Value::Null`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Pooled HTTP transport for one FHIR server
///
/// The underlying connection pool is shared across clones, so cloning is
/// cheap and concurrent calls from many tasks are safe. Connections are
/// released when the last clone is dropped; there is no separate shutdown
/// call.
///
/// # Retry policy
///
/// Transport failures (connect, DNS, timeout) and HTTP 5xx responses are
/// retried with exponential backoff up to `retry.max_attempts` total calls.
/// 4xx responses are terminal on the first response - the caller's input or
/// credentials are wrong and no amount of retrying fixes that.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<SecretString>,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Creates a transport for the given server
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Configuration`] if the base URL is not a
    /// valid http/https URL or the HTTP client cannot be constructed.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let url = Url::parse(&config.base_url).map_err(|e| {
            RosettaError::Configuration(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RosettaError::Configuration(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| RosettaError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Base URL of the server, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the transport sends basic-auth credentials
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        if let (Some(ref username), Some(ref password)) = (&self.username, &self.password) {
            let secret: &str = password.expose_secret().as_ref();
            let credentials = format!("{username}:{secret}");
            let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
            Some(format!("Basic {encoded}"))
        } else {
            None
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one logical request, retrying per the configured policy
    ///
    /// # Errors
    ///
    /// - [`RosettaError::Connection`] when the transport keeps failing
    /// - [`RosettaError::Operation`] for 5xx after retries are exhausted
    /// - [`RosettaError::Authentication`] / [`RosettaError::ResourceNotFound`]
    ///   / [`RosettaError::Validation`] for terminal 4xx responses
    /// - [`RosettaError::Protocol`] when a 2xx body is not valid JSON
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let url = self.url_for(path);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                method = %method,
                path = %path,
                attempt = attempt,
                "Sending request"
            );

            match self.dispatch(&method, &url, query, body).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return parse_success(status, response.text().await.unwrap_or_default());
                    }

                    if status.is_server_error() && attempt < max_attempts {
                        self.backoff(attempt, max_attempts, &format!("server returned {status}"))
                            .await;
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let message = response_message(status, &body_text);
                    tracing::debug!(
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        "Request failed"
                    );
                    return Err(RosettaError::from_status(status.as_u16(), message));
                }
                Err(e) => {
                    let message = describe_send_error(&e);
                    if attempt < max_attempts {
                        self.backoff(attempt, max_attempts, &message).await;
                        continue;
                    }
                    return Err(RosettaError::Connection(message));
                }
            }
        }
    }

    /// One HTTP attempt, no retry
    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("Accept", FHIR_JSON);

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(json) = body {
            request = request.json(json).header("Content-Type", FHIR_JSON);
        }

        if let Some(auth) = self.auth_header_value() {
            request = request.header("Authorization", auth);
        }

        request.send().await
    }

    async fn backoff(&self, attempt: usize, max_attempts: usize, reason: &str) {
        let delay_ms = backoff_delay_ms(&self.retry, attempt);
        crate::log_retry_attempt!(attempt, max_attempts, delay_ms, reason);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    /// GET returning the parsed body
    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        Ok(self.request(Method::GET, path, query, None).await?.body)
    }

    /// POST with a JSON body, returning the parsed response body
    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        Ok(self
            .request(Method::POST, path, &[], Some(body))
            .await?
            .body)
    }

    /// PUT with a JSON body, returning the parsed response body
    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        Ok(self.request(Method::PUT, path, &[], Some(body)).await?.body)
    }

    /// DELETE returning the response status
    pub(crate) async fn delete(&self, path: &str) -> Result<StatusCode> {
        Ok(self.request(Method::DELETE, path, &[], None).await?.status)
    }
}

/// Delay before the next attempt: initial * multiplier^(attempt-1), capped
fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    (delay as u64).min(retry.max_delay_ms)
}

fn parse_success(status: StatusCode, body_text: String) -> Result<TransportResponse> {
    let body = if body_text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body_text).map_err(|e| {
            RosettaError::Protocol(format!("{status} response body is not valid JSON: {e}"))
        })?
    };

    Ok(TransportResponse { status, body })
}

/// Extracts a human-readable message from an error response body
///
/// FHIR servers usually return an OperationOutcome; its first issue's
/// diagnostics (or details text) makes a far better message than raw JSON.
/// Anything else is passed through truncated.
fn response_message(status: StatusCode, body_text: &str) -> String {
    if let Ok(outcome) = serde_json::from_str::<Value>(body_text) {
        if outcome.get("resourceType").and_then(Value::as_str) == Some("OperationOutcome") {
            if let Some(issue) = outcome
                .get("issue")
                .and_then(Value::as_array)
                .and_then(|issues| issues.first())
            {
                let diagnostics = issue
                    .get("diagnostics")
                    .and_then(Value::as_str)
                    .or_else(|| {
                        issue
                            .get("details")
                            .and_then(|d| d.get("text"))
                            .and_then(Value::as_str)
                    });
                if let Some(text) = diagnostics {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        let mut snippet: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        if trimmed.chars().count() > ERROR_BODY_LIMIT {
            snippet.push_str("...");
        }
        format!("HTTP {status}: {snippet}")
    }
}

fn describe_send_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("transport error: {e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(config: &ServerConfig) -> HttpTransport {
        HttpTransport::new(config).unwrap()
    }

    #[test]
    fn test_transport_trims_trailing_slash() {
        let config = ServerConfig::new("https://tx.fhir.org/r4/");
        assert_eq!(transport(&config).base_url(), "https://tx.fhir.org/r4");
    }

    #[test]
    fn test_transport_rejects_invalid_base_url() {
        let err = HttpTransport::new(&ServerConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, RosettaError::Configuration(_)));

        let err = HttpTransport::new(&ServerConfig::new("ftp://example.com")).unwrap_err();
        assert!(matches!(err, RosettaError::Configuration(_)));
    }

    #[test]
    fn test_url_for_joins_paths() {
        let t = transport(&ServerConfig::new("https://fhir.example.com/r4"));
        assert_eq!(
            t.url_for("Patient/123"),
            "https://fhir.example.com/r4/Patient/123"
        );
        assert_eq!(
            t.url_for("/ValueSet/$expand"),
            "https://fhir.example.com/r4/ValueSet/$expand"
        );
    }

    #[test]
    fn test_auth_header_value() {
        let config = ServerConfig::new("https://fhir.example.com").with_basic_auth("user", "pass");
        let t = transport(&config);
        assert!(t.is_authenticated());
        // base64("user:pass")
        assert_eq!(t.auth_header_value().as_deref(), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_auth_header_absent_without_credentials() {
        let t = transport(&ServerConfig::new("https://fhir.example.com"));
        assert!(!t.is_authenticated());
        assert_eq!(t.auth_header_value(), None);
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 3000,
            backoff_multiplier: 2.0,
        };

        assert_eq!(backoff_delay_ms(&retry, 1), 1000);
        assert_eq!(backoff_delay_ms(&retry, 2), 2000);
        assert_eq!(backoff_delay_ms(&retry, 3), 3000);
        assert_eq!(backoff_delay_ms(&retry, 4), 3000);
    }

    #[test]
    fn test_parse_success_empty_body_is_null() {
        let response = parse_success(StatusCode::NO_CONTENT, String::new()).unwrap();
        assert_eq!(response.body, Value::Null);
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_parse_success_rejects_non_json() {
        let err = parse_success(StatusCode::OK, "<html>hi</html>".to_string()).unwrap_err();
        assert!(matches!(err, RosettaError::Protocol(_)));
    }

    #[test]
    fn test_response_message_prefers_operation_outcome_diagnostics() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "not-found", "diagnostics": "Unknown code 'XYZ'"}]
        }"#;
        assert_eq!(
            response_message(StatusCode::BAD_REQUEST, body),
            "Unknown code 'XYZ'"
        );
    }

    #[test]
    fn test_response_message_falls_back_to_details_text() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "invalid", "details": {"text": "Missing parameter"}}]
        }"#;
        assert_eq!(
            response_message(StatusCode::BAD_REQUEST, body),
            "Missing parameter"
        );
    }

    #[test]
    fn test_response_message_truncates_plain_bodies() {
        let long_body = "x".repeat(2 * ERROR_BODY_LIMIT);
        let message = response_message(StatusCode::BAD_GATEWAY, &long_body);
        assert!(message.starts_with("HTTP 502"));
        assert!(message.ends_with("..."));
        assert!(message.len() < long_body.len());
    }

    #[test]
    fn test_response_message_empty_body() {
        assert_eq!(
            response_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "HTTP 503 Service Unavailable"
        );
    }
}
