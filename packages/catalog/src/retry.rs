//! HTTP retry helpers for catalog downloads.
//!
//! [`send_json`] wraps `reqwest::RequestBuilder::send()` with exponential
//! backoff for transient failures: timeouts, connection resets, HTTP 429
//! and HTTP 5xx.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url)).await?;
//! ```

use std::time::Duration;

use reqwest::StatusCode;

use crate::CatalogError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s) the total wait before giving up
/// is 14 seconds.
const MAX_RETRIES: u32 = 3;

/// Backoff unit. Attempt `n` waits `BASE_DELAY * 2^n`.
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Accept,
    Retry,
    Fail,
}

impl From<StatusCode> for Disposition {
    fn from(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Self::Retry
        } else if status.is_client_error() {
            Self::Fail
        } else {
            Self::Accept
        }
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Errors
///
/// Returns [`CatalogError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, CatalogError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    send_json_with_backoff(&build_request, MAX_RETRIES, BASE_DELAY).await
}

#[allow(clippy::future_not_send)]
async fn send_json_with_backoff<F>(
    build_request: &F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<serde_json::Value, CatalogError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_with_retries(build_request, max_retries, base_delay).await?;
    let url = response.url().to_string();
    let status = response.status();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!(
            "Catalog JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        CatalogError::Json(e)
    })
}

/// Returns the first accepted response, sleeping `base_delay * 2^attempt`
/// before each retry.
#[allow(clippy::future_not_send)]
async fn send_with_retries<F>(
    build_request: &F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<reqwest::Response, CatalogError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        let outcome = build_request().send().await;
        let can_retry = attempt < max_retries;

        let failure = match outcome {
            Ok(response) => match Disposition::from(response.status()) {
                Disposition::Accept => return Ok(response),
                Disposition::Fail => {
                    return Err(CatalogError::Status {
                        message: format!("HTTP {}", response.status()),
                    });
                }
                Disposition::Retry if can_retry => format!("HTTP {}", response.status()),
                Disposition::Retry => {
                    return Err(CatalogError::Status {
                        message: format!(
                            "HTTP {} after {max_retries} retries",
                            response.status()
                        ),
                    });
                }
            },
            Err(e) if can_retry && is_transient(&e) => format!("transient error: {e}"),
            Err(e) => return Err(CatalogError::Http(e)),
        };

        attempt += 1;
        let delay = base_delay * 2u32.pow(attempt);
        log::warn!("  {failure}; retry {attempt}/{max_retries} in {delay:?}...");
        tokio::time::sleep(delay).await;
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::CannedServer;

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn statuses_are_classified() {
        assert_eq!(Disposition::from(StatusCode::OK), Disposition::Accept);
        assert_eq!(Disposition::from(StatusCode::NOT_MODIFIED), Disposition::Accept);
        assert_eq!(
            Disposition::from(StatusCode::TOO_MANY_REQUESTS),
            Disposition::Retry
        );
        assert_eq!(
            Disposition::from(StatusCode::BAD_GATEWAY),
            Disposition::Retry
        );
        assert_eq!(Disposition::from(StatusCode::NOT_FOUND), Disposition::Fail);
        assert_eq!(Disposition::from(StatusCode::FORBIDDEN), Disposition::Fail);
    }

    #[tokio::test]
    async fn server_error_then_success_is_retried() {
        let server = CannedServer::start(vec![(503, "busy"), (429, "slow down"), (200, "[1, 2]")]).await;
        let client = client();

        let value = send_json_with_backoff(&|| client.get(&server.url), 3, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!([1, 2]));
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn client_error_fails_without_retry() {
        let server = CannedServer::start(vec![(404, "missing"), (200, "[]")]).await;
        let client = client();

        let err = send_json_with_backoff(&|| client.get(&server.url), 3, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Status { ref message } if message.contains("404")));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let server = CannedServer::start(vec![(503, "busy")]).await;
        let client = client();

        let err = send_json_with_backoff(&|| client.get(&server.url), 2, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(
            matches!(err, CatalogError::Status { ref message } if message.contains("after 2 retries"))
        );
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn non_json_body_is_a_json_error() {
        let server = CannedServer::start(vec![(200, "<html>not json</html>")]).await;
        let client = client();

        let err = send_json_with_backoff(&|| client.get(&server.url), 3, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Json(_)));
        assert_eq!(server.hits(), 1);
    }
}
