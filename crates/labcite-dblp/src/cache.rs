//! Time-based file cache for API responses.
//!
//! Repeated runs within the expiry window reuse the cached response body
//! instead of re-fetching. Entries are keyed by request URL and expire based
//! on file modification time; a cache write failure only costs the caching,
//! never the fetch.

use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

/// Default time-to-live for cached responses: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Cached response body for `key`, unless the entry is missing or has
    /// outlived the TTL.
    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        let modified = fs::metadata(&path).ok()?.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age > self.ttl {
            return None;
        }
        let body = fs::read_to_string(&path).ok()?;
        debug!(key, "cache hit");
        Some(body)
    }

    pub fn put(&self, key: &str, body: &str) {
        if let Err(err) = self.try_put(key, body) {
            warn!(key, error = %err, "failed to write cache entry");
        }
    }

    fn try_put(&self, key: &str, body: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(key), body)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.dir.join(format!("{:016x}.xml", hasher.finish()))
    }
}
