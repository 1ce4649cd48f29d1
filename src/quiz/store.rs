use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{info, warn};
use reqwest::header::{CACHE_CONTROL, PRAGMA};

use crate::quiz::{parser, ContentKind, FetchError, Record};

/// A named text resource and the format it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ContentSource {
    pub name: String,
    pub kind: ContentKind,
}

impl ContentSource {
    pub fn new(name: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.name.starts_with("http://") || self.name.starts_with("https://")
    }
}

/// Where raw content text comes from.
pub trait ContentFetcher {
    /// Reads the raw text of `source`. `bust_cache` asks every layer in between
    /// to skip its caches.
    fn fetch(
        &self,
        source: &ContentSource,
        bust_cache: bool,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches URLs over HTTP and everything else from the local file system.
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_remote(&self, source: &ContentSource, bust_cache: bool) -> Result<String, FetchError> {
        let url = if bust_cache {
            cache_busted_url(&source.name, unix_millis())
        } else {
            source.name.clone()
        };
        let http_error = |e: reqwest::Error| FetchError::Http {
            source_id: source.name.clone(),
            source: e,
        };

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(http_error)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                source_id: source.name.clone(),
                status: response.status().as_u16(),
            });
        }
        response.text().await.map_err(http_error)
    }
}

impl ContentFetcher for SourceFetcher {
    async fn fetch(&self, source: &ContentSource, bust_cache: bool) -> Result<String, FetchError> {
        if source.is_remote() {
            return self.fetch_remote(source, bust_cache).await;
        }
        tokio::fs::read_to_string(&source.name)
            .await
            .map_err(|e| FetchError::Io {
                source_id: source.name.clone(),
                source: e,
            })
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn cache_busted_url(url: &str, stamp: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}_={}", url, separator, stamp)
}

/// Parsed records per source name, kept for the life of the process.
///
/// The cache lock is never held across a fetch, so two overlapping loads of the
/// same source both land and the later one wins.
pub struct RecordStore<F> {
    fetcher: F,
    refresh_timeout: Duration,
    cache: Mutex<HashMap<String, Arc<Vec<Record>>>>,
}

impl<F: ContentFetcher> RecordStore<F> {
    pub fn new(fetcher: F, refresh_timeout: Duration) -> Self {
        Self {
            fetcher,
            refresh_timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the records of `source`, fetching only when nothing is cached or
    /// `force_refresh` is set. A forced refresh replaces the cached list even
    /// when the new one is empty.
    pub async fn load(&self, source: &ContentSource, force_refresh: bool) -> Result<Arc<Vec<Record>>, FetchError> {
        if !force_refresh {
            if let Some(records) = self.cached(&source.name) {
                return Ok(records);
            }
        }

        let raw = if force_refresh {
            tokio::time::timeout(self.refresh_timeout, self.fetcher.fetch(source, true))
                .await
                .map_err(|_| FetchError::TimedOut {
                    source_id: source.name.clone(),
                    timeout: self.refresh_timeout,
                })?
        } else {
            self.fetcher.fetch(source, false).await
        };
        let raw = raw.map_err(|e| {
            warn!("Loading {} failed: {}", source.name, e);
            e
        })?;

        let records = Arc::new(parser::parse(&raw, source.kind));
        info!(
            "Loaded {} {} records from {}",
            records.len(),
            source.kind.label(),
            source.name
        );
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(source.name.clone(), records.clone());
        }
        Ok(records)
    }

    pub fn cached(&self, name: &str) -> Option<Arc<Vec<Record>>> {
        self.cache.lock().ok()?.get(name).cloned()
    }

    pub fn invalidate(&self, name: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(name);
        }
    }
}
