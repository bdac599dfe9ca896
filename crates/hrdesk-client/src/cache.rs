//! On-disk cache for downloaded attachments.
//!
//! Each file is stored under its server id next to a small JSON sidecar
//! holding the fetch time. Freshness is checked lazily when an entry is read;
//! stale entries are deleted on the spot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hrdesk_core::Config;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::HrClient;
use crate::error::{ClientError, ClientResult};

const META_SUFFIX: &str = ".meta.json";

/// Sidecar describing a cached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheMeta {
    file_name: Option<String>,
    mime_type: Option<String>,
    fetched_at: DateTime<Utc>,
}

/// A file available on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    /// Where the bytes are.
    pub path: PathBuf,
    /// Original file name, if the server sent one.
    pub file_name: Option<String>,
    /// Content type, if the server sent one.
    pub mime_type: Option<String>,
    /// When the file was downloaded.
    pub fetched_at: DateTime<Utc>,
    /// Whether this came from the cache rather than the network.
    pub from_cache: bool,
}

/// Download cache keyed by file id.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    /// Create a cache in `dir` with the given freshness window.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Create a cache from the `cache` section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no cache directory can be determined.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        Ok(Self::new(config.cache_dir()?, config.cache_ttl()))
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn paths(&self, file_id: &str) -> (PathBuf, PathBuf) {
        let key = cache_key(file_id);
        (
            self.dir.join(&key),
            self.dir.join(format!("{key}{META_SUFFIX}")),
        )
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(self.ttl)
            .is_ok_and(|ttl| now.signed_duration_since(fetched_at) < ttl)
    }

    /// Look up a fresh entry. Stale or broken entries are removed.
    pub async fn get(&self, file_id: &str, now: DateTime<Utc>) -> Option<CachedFile> {
        let (data_path, meta_path) = self.paths(file_id);
        let raw = tokio::fs::read(&meta_path).await.ok()?;

        let meta = match serde_json::from_slice::<CacheMeta>(&raw) {
            Ok(meta) if self.is_fresh(meta.fetched_at, now) => meta,
            Ok(_) => {
                debug!(file_id, "Cached file expired");
                remove_pair(&data_path, &meta_path).await;
                return None;
            }
            Err(e) => {
                warn!(file_id, error = %e, "Discarding unreadable cache entry");
                remove_pair(&data_path, &meta_path).await;
                return None;
            }
        };

        if !tokio::fs::try_exists(&data_path).await.unwrap_or(false) {
            remove_pair(&data_path, &meta_path).await;
            return None;
        }

        Some(CachedFile {
            path: data_path,
            file_name: meta.file_name,
            mime_type: meta.mime_type,
            fetched_at: meta.fetched_at,
            from_cache: true,
        })
    }

    /// Store downloaded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the directory or files cannot be written.
    pub async fn put(
        &self,
        file_id: &str,
        bytes: &[u8],
        file_name: Option<String>,
        mime_type: Option<String>,
        now: DateTime<Utc>,
    ) -> ClientResult<CachedFile> {
        let (data_path, meta_path) = self.paths(file_id);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;
        tokio::fs::write(&data_path, bytes)
            .await
            .map_err(|source| io_error(&data_path, source))?;

        let meta = CacheMeta {
            file_name,
            mime_type,
            fetched_at: now,
        };
        let encoded = serde_json::to_vec(&meta).map_err(|source| ClientError::Decode {
            endpoint: "cache".to_string(),
            source,
        })?;
        tokio::fs::write(&meta_path, encoded)
            .await
            .map_err(|source| io_error(&meta_path, source))?;

        Ok(CachedFile {
            path: data_path,
            file_name: meta.file_name,
            mime_type: meta.mime_type,
            fetched_at: now,
            from_cache: false,
        })
    }

    /// Return the cached copy if fresh, otherwise download and store it.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the download fails or the bytes cannot be
    /// written anywhere.
    pub async fn get_or_fetch(&self, client: &HrClient, file_id: &str) -> ClientResult<CachedFile> {
        let now = Utc::now();
        if let Some(hit) = self.get(file_id, now).await {
            debug!(file_id, "Serving file from cache");
            return Ok(hit);
        }

        let download = client.download_file(file_id).await?;
        self.put(
            file_id,
            &download.bytes,
            download.file_name,
            download.mime_type,
            now,
        )
        .await
    }

    /// Delete every stale entry. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return 0;
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = name.strip_suffix(META_SUFFIX) else {
                continue;
            };
            let fresh = match tokio::fs::read(entry.path()).await {
                Ok(raw) => serde_json::from_slice::<CacheMeta>(&raw)
                    .is_ok_and(|meta| self.is_fresh(meta.fetched_at, now)),
                Err(_) => false,
            };
            if !fresh {
                remove_pair(&self.dir.join(key), &entry.path()).await;
                removed += 1;
            }
        }
        debug!(removed, "Purged expired cache entries");
        removed
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ClientError {
    ClientError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn remove_pair(data_path: &Path, meta_path: &Path) {
    let _ = tokio::fs::remove_file(data_path).await;
    let _ = tokio::fs::remove_file(meta_path).await;
}

/// File name for an id. Bytes outside `[A-Za-z0-9-]` become `_XX` so
/// distinct ids never share a slot.
fn cache_key(file_id: &str) -> String {
    use std::fmt::Write as _;

    let mut key = String::with_capacity(file_id.len());
    for byte in file_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            key.push(char::from(byte));
        } else {
            let _ = write!(key, "_{byte:02x}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn at(hour: u32) -> DateTime<Utc> {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            + chrono::Duration::hours(i64::from(hour))
    }

    #[tokio::test]
    async fn test_put_then_get_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);

        let stored = cache
            .put("F1", b"%PDF", Some("cert.pdf".into()), Some("application/pdf".into()), at(0))
            .await
            .unwrap();
        assert!(!stored.from_cache);

        let hit = cache.get("F1", at(23)).await.unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.file_name.as_deref(), Some("cert.pdf"));
        assert_eq!(tokio::fs::read(&hit.path).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_stale_entry_is_removed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);
        let stored = cache.put("F1", b"x", None, None, at(0)).await.unwrap();

        assert!(cache.get("F1", at(24)).await.is_none());
        assert!(!stored.path.exists());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);
        assert!(cache.get("nothing", at(0)).await.is_none());

        std::fs::write(dir.path().join("F2.meta.json"), "not json").unwrap();
        assert!(cache.get("F2", at(0)).await.is_none());
        assert!(!dir.path().join("F2.meta.json").exists());
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);
        let stored = cache.put("../etc/passwd", b"x", None, None, at(0)).await.unwrap();
        assert_eq!(stored.path.parent().unwrap(), dir.path());
    }

    #[test]
    fn test_cache_keys_do_not_collide() {
        assert_eq!(cache_key("F-12ab"), "F-12ab");
        assert_eq!(cache_key("a.b"), "a_2eb");
        assert_eq!(cache_key("a_b"), "a_5fb");
        assert_ne!(cache_key("a_2eb"), cache_key("a.b"));
    }

    #[tokio::test]
    async fn test_similar_ids_keep_separate_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);
        cache.put("a.b", b"dot", None, None, at(0)).await.unwrap();
        cache.put("a_b", b"underscore", None, None, at(0)).await.unwrap();

        let dot = cache.get("a.b", at(1)).await.unwrap();
        let underscore = cache.get("a_b", at(1)).await.unwrap();
        assert_eq!(std::fs::read(dot.path).unwrap(), b"dot");
        assert_eq!(std::fs::read(underscore.path).unwrap(), b"underscore");
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), DAY);
        cache.put("old", b"1", None, None, at(0)).await.unwrap();
        cache.put("new", b"2", None, None, at(20)).await.unwrap();

        assert_eq!(cache.purge_expired(at(30)).await, 1);
        assert!(cache.get("new", at(30)).await.is_some());
        assert!(!dir.path().join("old").exists());
    }
}
