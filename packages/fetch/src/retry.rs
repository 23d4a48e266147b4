//! HTTP retry with exponential backoff.
//!
//! Every Open-Meteo request goes through [`send_json`]. Connection errors,
//! timeouts, HTTP 429, and HTTP 5xx are retried; other 4xx statuses are
//! permanent and fail immediately.

use std::time::Duration;

use crate::FetchError;

/// Maximum number of retries after the first attempt.
///
/// Backoff doubles from 2s, so giving up takes 2 + 4 + 8 + 16 + 32 = 62s of
/// waiting on top of the request timeouts.
pub const MAX_RETRIES: u32 = 5;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends the request built by `build_request` and parses the body as JSON.
///
/// `build_request` is called once per attempt since a
/// [`reqwest::RequestBuilder`] is consumed by `send()`.
///
/// # Errors
///
/// Returns [`FetchError::Http`] for non-transient transport errors or
/// transport errors that persist after [`MAX_RETRIES`],
/// [`FetchError::Response`] for a non-retryable status or exhausted status
/// retries, and [`FetchError::Json`] if the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_with_retry(&build_request).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        log::error!(
            "JSON parse failed for {url} ({} bytes): {e}\n  body preview: {}",
            text.len(),
            preview(&text)
        );
        FetchError::Json(e)
    })
}

#[allow(clippy::future_not_send)]
async fn send_with_retry<F>(build_request: &F) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                if is_retryable_status(status) {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status}");
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Response {
                        message: format!("HTTP {status} after {MAX_RETRIES} retries"),
                    });
                }

                // Open-Meteo explains 400s in a JSON `reason` field.
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Response {
                    message: format!("HTTP {status}: {}", preview(&body)),
                });
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): 2s, 4s, 8s, ...
#[must_use]
pub const fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

/// Returns `true` for statuses worth retrying: 429 and every 5xx.
#[must_use]
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
