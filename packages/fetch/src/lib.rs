#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather data acquisition from the Open-Meteo APIs.
//!
//! [`forecast`] downloads the short-range hourly forecast and aggregates it
//! to daily extremes; [`historical`] downloads the multi-decade daily archive
//! used to build the climatology. Both go through [`retry`] for transient
//! failures and through the on-disk [`cache::ResponseCache`].

pub mod cache;
pub mod forecast;
pub mod historical;
pub mod progress;
pub mod registry;
pub mod retry;

use std::path::PathBuf;
use std::time::Duration;

use cache::ResponseCache;

/// Errors that can occur while fetching weather data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (cache read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested city is not in the registry.
    #[error("Unknown city '{0}'")]
    UnknownCity(String),

    /// The API answered with an error status or an unexpected payload.
    #[error("Response error: {message}")]
    Response {
        /// Description of what went wrong.
        message: String,
    },
}

/// Environment variable overriding the response cache directory.
pub const CACHE_DIR_ENV: &str = "HEATWAVE_CACHE_DIR";

/// Cache directory used when [`CACHE_DIR_ENV`] is unset.
pub const DEFAULT_CACHE_DIR: &str = ".cache";

/// Per-request timeout. Archive responses cover 30 years of daily values.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client plus response cache shared by the fetchers.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    cache: ResponseCache,
}

impl OpenMeteoClient {
    /// Creates a client caching responses under `cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("heatwave/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            cache: ResponseCache::new(cache_dir),
        })
    }

    /// Creates a client caching under `$HEATWAVE_CACHE_DIR`, or `.cache`
    /// when unset.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(std::env::var(CACHE_DIR_ENV).unwrap_or_else(|_| DEFAULT_CACHE_DIR.to_string()))
    }

    /// Returns the JSON body for `url`, from the cache if a fresh entry
    /// exists, otherwise from the network. Network responses are cached.
    ///
    /// `ttl` of `None` means cached entries never expire.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries or the
    /// response cannot be cached.
    pub async fn get_json(
        &self,
        url: &reqwest::Url,
        ttl: Option<Duration>,
    ) -> Result<serde_json::Value, FetchError> {
        if let Some(body) = self.cache.get(url.as_str(), ttl) {
            log::debug!("Cache hit for {url}");
            return Ok(body);
        }

        log::info!("Fetching {url}");
        let body = retry::send_json(|| self.http.get(url.clone())).await?;
        self.cache.put(url.as_str(), &body)?;

        Ok(body)
    }
}

/// Builds a request URL, mapping parse failures to [`FetchError::Response`].
pub(crate) fn build_url(base: &str, params: &[(&str, String)]) -> Result<reqwest::Url, FetchError> {
    reqwest::Url::parse_with_params(base, params).map_err(|e| FetchError::Response {
        message: format!("Invalid request URL {base}: {e}"),
    })
}

/// Takes the named array out of a JSON object.
pub(crate) fn json_array<'a>(
    section: &'a serde_json::Value,
    key: &str,
) -> Result<&'a Vec<serde_json::Value>, FetchError> {
    section
        .get(key)
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| FetchError::Response {
            message: format!("Response is missing the '{key}' array"),
        })
}

/// Checks for Open-Meteo's `{"error": true, "reason": ...}` payload.
pub(crate) fn check_api_error(body: &serde_json::Value) -> Result<(), FetchError> {
    if body.get("error").and_then(serde_json::Value::as_bool) == Some(true) {
        let reason = body
            .get("reason")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("no reason given");
        return Err(FetchError::Response {
            message: format!("Open-Meteo error: {reason}"),
        });
    }
    Ok(())
}
