// src/cache.rs
//! Persistent memoization of expensive, non-deterministic LLM derivations
//! (summary, pros/cons, similar products).
//!
//! The store is one JSON object in one file: loaded once when opened, held
//! in memory, and rewritten in full on every `put` via tmp + rename. Writes
//! are serialized behind a mutex; entries never expire. Tests use the
//! in-memory variant and swap nothing else.

use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Key suffix for per-subject review-summary entries.
pub const SUMMARY_SUFFIX: &str = "::summary";
/// Key suffix for per-subject fallback descriptions (no review data).
/// Distinct from [`SUMMARY_SUFFIX`] so a cached description can never be
/// served as a review summary once review data appears.
pub const DESCRIBE_SUFFIX: &str = "::describe";
/// Key suffix for per-subject similar-product entries.
pub const SIMILAR_SUFFIX: &str = "::similar";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is not a JSON object: {0}")]
    Format(#[from] serde_json::Error),
}

/// Process-wide result cache. Cheap to share via `Arc`.
#[derive(Debug)]
pub struct ResultCache {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<String, Value>>,
}

impl ResultCache {
    /// Open a file-backed cache, loading existing entries once. A missing
    /// file starts empty; an unreadable one starts empty with a warning
    /// (the next `put` overwrites it).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(map) => map,
            Err(CacheError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                HashMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "result cache loaded");
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Purely in-memory cache (tests, or running without persistence).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().expect("cache mutex poisoned").get(key).cloned()
    }

    /// Insert and persist. The full map is rewritten while the lock is held,
    /// so concurrent writers cannot lose each other's entries.
    pub fn put(&self, key: &str, value: Value) {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(key.to_string(), value);
        if let Some(path) = &self.path {
            if let Err(e) = persist_entries(path, &guard) {
                warn!(path = %path.display(), error = %e, "failed to persist cache");
            }
        }
    }

    /// Memoize an async derivation under `key`. A successful computation is
    /// stored and never re-run for the same key; later calls return the
    /// stored value without touching the collaborator. A failed computation
    /// is propagated uncached, so the caller's degraded substitute never
    /// sticks. A stored value that no longer deserializes as `T` is
    /// recomputed and overwritten.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(hit) = self.get(key) {
            match serde_json::from_value::<T>(hit) {
                Ok(v) => {
                    debug!(key, "cache hit");
                    return Ok(v);
                }
                Err(e) => warn!(key, error = %e, "cache entry unusable, recomputing"),
            }
        }
        let fresh = compute().await?;
        match serde_json::to_value(&fresh) {
            Ok(v) => self.put(key, v),
            Err(e) => warn!(key, error = %e, "derived value not serializable, not cached"),
        }
        Ok(fresh)
    }

    /// Key for a single-subject derivation: exact, case-sensitive
    /// concatenation of the subject and a discriminator suffix.
    pub fn subject_key(subject: &str, suffix: &str) -> String {
        format!("{subject}{suffix}")
    }

    /// Key for a derivation over a comment set: SHA-256 of the sorted,
    /// newline-joined texts. Sorting makes the fingerprint independent of
    /// input order, so a reshuffled batch is a guaranteed hit.
    pub fn comment_set_key(texts: &[String]) -> String {
        let mut sorted: Vec<&str> = texts.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let mut hasher = Sha256::new();
        hasher.update(sorted.join("\n").as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn load_entries(path: &Path) -> Result<HashMap<String, Value>, CacheError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn persist_entries(path: &Path, entries: &HashMap<String, Value>) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec(entries)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
