//! HTTP client with bounded retry of transient failures.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::io::Write;

/// Maximum number of attempts for a network operation.
const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 500;

/// Request failures that will not succeed on retry.
#[derive(Debug)]
pub enum RequestError {
    /// HTTP 401
    Unauthorized,
    /// HTTP 403 or 429
    RateLimited,
    /// HTTP 404
    NotFound(String),
    /// Other non-2xx client status
    Status(u16),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Unauthorized => {
                write!(f, "Authentication failed. Check your GITHUB_TOKEN.")
            }
            RequestError::RateLimited => {
                write!(
                    f,
                    "Rate limit exceeded. Try again later or set the GITHUB_TOKEN environment variable."
                )
            }
            RequestError::NotFound(url) => write!(f, "Not found: {}", url),
            RequestError::Status(code) => write!(f, "Request failed with HTTP {}", code),
        }
    }
}

impl std::error::Error for RequestError {}

/// Maps a non-success status to a non-retryable error, or `None` when the
/// request is worth retrying (5xx and other server-side conditions).
fn classify_status(status: StatusCode, url: &str) -> Option<RequestError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(RequestError::Unauthorized),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Some(RequestError::RateLimited),
        StatusCode::NOT_FOUND => Some(RequestError::NotFound(url.to_string())),
        s if s.is_client_error() => Some(RequestError::Status(s.as_u16())),
        _ => None,
    }
}

/// Verifies a 2xx status before the body is treated as a valid payload.
fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match classify_status(status, url) {
        Some(err) => Err(err.into()),
        None => Err(anyhow::anyhow!("HTTP {} from {}", status.as_u16(), url)),
    }
}

fn is_retryable(e: &anyhow::Error) -> bool {
    e.downcast_ref::<RequestError>().is_none()
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request with query parameters and deserializes the
    /// JSON response. Automatically retries on transient errors.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .context("Failed to send request")?;

            let response = check_status(response, url)?;

            response
                .json::<T>()
                .await
                .context("Failed to parse JSON response")
        })
        .await
    }

    /// Streams a GET response body into the writer produced by
    /// `create_writer`, returning the byte count. Each retry attempt starts
    /// over with a fresh writer, so a truncating writer keeps the staging
    /// file consistent across attempts.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading from {}...", url);

        self.with_retry("download", || async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .context("Failed to start download request")?;

            let mut response = check_status(response, url)?;

            let mut writer = create_writer()?;
            let mut downloaded_bytes: u64 = 0;

            while let Some(chunk) = response
                .chunk()
                .await
                .context("Failed to read chunk from download stream")?
            {
                writer
                    .write_all(&chunk)
                    .context("Failed to write chunk to file")?;
                downloaded_bytes += chunk.len() as u64;
            }

            debug!(
                "Downloaded {:.2} MB",
                downloaded_bytes as f64 / (1024.0 * 1024.0)
            );

            Ok(downloaded_bytes)
        })
        .await
    }

    /// Executes an async operation, retrying transient failures.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                        );
                        tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test?page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "test", "value": 42}"#)
            .create_async()
            .await;

        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct TestResponse {
            name: String,
            value: i32,
        }

        let client = HttpClient::new(Client::new());
        let result: TestResponse = client
            .get_json(&format!("{}/test", url), &[("page", "1")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.name, "test");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn test_get_json_not_found_is_non_retryable() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        // A 404 must fail on the first attempt, not after retries
        let mock = server
            .mock("GET", "/test")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: Result<serde_json::Value> =
            client.get_json(&format!("{}/test", url), &[]).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequestError>(),
            Some(RequestError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_download_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.bin")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let bytes = client
            .download(&format!("{}/file.bin", url), || Ok(std::io::sink()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12); // "test content" is 12 bytes
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.bin")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download(&format!("{}/file.bin", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        // Every attempt hits the 500; the client should exhaust its retries
        let mock = server
            .mock("GET", "/file.bin")
            .with_status(500)
            .expect(MAX_RETRIES)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download(&format!("{}/file.bin", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_transient_error() {
        let client = HttpClient::new(Client::new());
        let call_count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    if current < 2 {
                        Err::<&str, _>(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_non_retryable() {
        let client = HttpClient::new(Client::new());
        let call_count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Err::<(), _>(anyhow::Error::from(RequestError::Status(400)))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "u"),
            Some(RequestError::Unauthorized)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "u"),
            Some(RequestError::RateLimited)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "u"),
            Some(RequestError::NotFound(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "u"),
            Some(RequestError::Status(400))
        ));
        // Server errors stay retryable
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "u").is_none());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "u").is_none());
    }
}
