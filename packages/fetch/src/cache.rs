//! On-disk JSON response cache.
//!
//! Each response body is stored as `{sha256(url)}.json` under the cache
//! directory. Freshness is judged from the file's modification time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest as _, Sha256};

use crate::FetchError;

/// Hex-encoded SHA-256 of `url`.
#[must_use]
pub fn cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// JSON response cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache entry for `url`.
    #[must_use]
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(url)))
    }

    /// Returns the cached body for `url` if present and younger than
    /// `ttl`. `None` as `ttl` accepts entries of any age.
    ///
    /// Unreadable or corrupt entries are treated as misses.
    #[must_use]
    pub fn get(&self, url: &str, ttl: Option<Duration>) -> Option<serde_json::Value> {
        let path = self.entry_path(url);
        let metadata = fs::metadata(&path).ok()?;

        if let Some(ttl) = ttl {
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok())
                .unwrap_or_default();
            if age > ttl {
                log::debug!("Cache entry {} expired ({age:?} old)", path.display());
                return None;
            }
        }

        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(body) => Some(body),
            Err(e) => {
                log::warn!("Ignoring corrupt cache entry {}: {e}", path.display());
                None
            }
        }
    }

    /// Stores `body` as the entry for `url`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Io`] if the cache directory or file cannot be
    /// written.
    pub fn put(&self, url: &str, body: &serde_json::Value) -> Result<(), FetchError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(url), serde_json::to_vec(body)?)?;
        Ok(())
    }
}
