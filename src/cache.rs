//! Upload cache for repeat runs.
//!
//! The daily job is often re-run for the same date (a fixed typo, a failed
//! site build). Re-uploading an unchanged cover costs an API call and bumps
//! the asset version, which changes the URL in front matter and churns the
//! git history of the post for nothing. This module lets the pipeline reuse
//! the previous URL when nothing that shapes it has changed.
//!
//! ## Cache keys
//!
//! Entries are keyed by public id and hold:
//!
//! - **`image_hash`**: SHA-256 of the PNG bytes that were uploaded.
//! - **`host_hash`**: SHA-256 of the host fingerprint (account, stored
//!   format, delivery transformation). Changing any of those settings
//!   invalidates every entry.
//! - **`url`**: the delivery URL returned by the upload.
//!
//! A hit requires both hashes to match.
//!
//! ## Storage
//!
//! JSON at `<root>/.lectionary-cache.json`. A missing, unreadable, or
//! version-mismatched file loads as an empty cache.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `daily` to force an upload. The fresh URL is still
//! recorded.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the cache file within the project root.
pub const CACHE_FILENAME: &str = ".lectionary-cache.json";

/// Version of the cache format. Bump to invalidate existing caches.
const CACHE_VERSION: u32 = 1;

/// A single uploaded cover.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub image_hash: String,
    pub host_hash: String,
    pub url: String,
}

/// On-disk map from public id to its last upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadCache {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl UploadCache {
    /// Create an empty cache (used for first runs and corrupt files).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the project root. Returns an empty cache if the file
    /// doesn't exist or can't be parsed.
    pub fn load(root: &Path) -> Self {
        let path = root.join(CACHE_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable upload cache"
                );
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            return Self::empty();
        }
        cache
    }

    /// Save to the project root.
    pub fn save(&self, root: &Path) -> io::Result<()> {
        let path = root.join(CACHE_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Previously delivered URL for `public_id`, if the same image was
    /// uploaded under the same host settings.
    pub fn find(&self, public_id: &str, image_hash: &str, host_hash: &str) -> Option<&str> {
        self.entries
            .get(public_id)
            .filter(|e| e.image_hash == image_hash && e.host_hash == host_hash)
            .map(|e| e.url.as_str())
    }

    /// Record the URL of a fresh upload, replacing any older entry.
    pub fn insert(
        &mut self,
        public_id: String,
        image_hash: String,
        host_hash: String,
        url: String,
    ) {
        self.entries.insert(
            public_id,
            CacheEntry {
                image_hash,
                host_hash,
                url,
            },
        );
    }
}

/// SHA-256 of a byte slice, as hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a host fingerprint, as hex.
pub fn hash_host(fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"host\0");
    hasher.update(fingerprint.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// How the cover URL was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Uploaded during this run.
    Uploaded,
    /// Reused from the upload cache.
    Cached,
    /// Upload disabled; existing cover (if any) kept.
    Skipped,
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Uploaded => write!(f, "uploaded"),
            UploadOutcome::Cached => write!(f, "cached"),
            UploadOutcome::Skipped => write!(f, "skipped"),
        }
    }
}
