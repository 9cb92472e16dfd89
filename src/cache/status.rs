// src/cache/status.rs
// =============================================================================
// This module implements the on-disk status cache.
//
// How it works:
// - One JSON file per property, under ./.cache/ in the working directory
// - The file maps URL -> UrlStatus (coverage state + timestamps)
// - load() reads the file if it exists, dump() writes it back
// - A disabled cache never touches disk and never returns a hit, which
//   makes every run behave like a first run
//
// Rust concepts:
// - BTreeMap: Ordered map, so the cache file diffs cleanly between runs
// - serde derive: The whole map serializes to JSON in one call
// =============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};

// Everything we remember about one URL
//
// All fields are optional: a record may hold only inspection data, only
// submission data, or both, depending on how far the URL got
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlStatus {
    /// Coverage state reported by URL inspection
    /// (e.g. "Submitted and indexed", "Crawled - currently not indexed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// When Google last crawled the URL, per URL inspection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_crawled_at: Option<DateTime<Utc>>,

    /// When we last ran URL inspection for this URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,

    /// When the URL was last submitted for indexing (notifyTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl UrlStatus {
    /// True if the URL was submitted for indexing within the given window
    pub fn submitted_within(&self, window: Duration) -> bool {
        match self.last_notified_at {
            Some(at) => Utc::now() - at <= window,
            None => false,
        }
    }

    /// True if the URL was inspected within the given window
    pub fn checked_within(&self, window: Duration) -> bool {
        match self.last_checked {
            Some(at) => Utc::now() - at <= window,
            None => false,
        }
    }
}

// The per-property cache
//
// When disabled, every method is a no-op and every lookup misses: the
// rest of the program doesn't need to know whether caching is on
pub struct StatusCache {
    site_url: String,
    path: PathBuf,
    entries: BTreeMap<String, UrlStatus>,
    enabled: bool,
}

impl StatusCache {
    /// Creates a cache for one property, stored under ./.cache/
    pub fn new(site_url: &str, enabled: bool) -> Self {
        Self::with_dir(site_url, enabled, Path::new(".cache"))
    }

    // Separate constructor so tests can point the cache at a scratch dir
    fn with_dir(site_url: &str, enabled: bool, dir: &Path) -> Self {
        let path = dir.join(format!("{}.json", cache_file_stem(site_url)));
        Self {
            site_url: site_url.to_string(),
            path,
            entries: BTreeMap::new(),
            enabled,
        }
    }

    /// Loads the cache file from disk, if there is one
    pub fn load(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        info!("Loading cache entry for {}", self.site_url);
        if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read cache file {}", self.path.display()))?;
            self.entries = serde_json::from_str(&contents)
                .with_context(|| format!("Corrupt cache file {}", self.path.display()))?;
        } else {
            info!("No cache entry found. Creating new cache entry...");
        }
        Ok(())
    }

    /// Writes the cache back to disk
    pub fn dump(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        info!("Saving cache entry for {}", self.site_url);
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cache file {}", self.path.display()))?;
        info!("Cache entry saved");
        Ok(())
    }

    /// Looks up a URL; always misses when the cache is disabled
    pub fn get(&self, url: &str) -> Option<&UrlStatus> {
        if !self.enabled {
            return None;
        }
        self.entries.get(url)
    }

    /// Stores (or replaces) the record for a URL
    pub fn put(&mut self, url: &str, status: UrlStatus) {
        if !self.enabled {
            return;
        }
        self.entries.insert(url.to_string(), status);
    }

    /// All URLs currently in the cache, in stable order
    pub fn urls(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Turns a site URL into a filesystem-safe file stem
//
// Examples:
//   "https://example.com/"       -> "https_example_com"
//   "sc-domain:example.com"      -> "sc_domain_example_com"
fn cache_file_stem(site_url: &str) -> String {
    site_url
        .replace("://", "_")
        .trim_matches('/')
        .replace('/', "_")
        .replace('.', "_")
        .replace(':', "_")
        .replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_stem_url_prefix() {
        assert_eq!(cache_file_stem("https://example.com/"), "https_example_com");
    }

    #[test]
    fn test_cache_file_stem_domain_property() {
        assert_eq!(
            cache_file_stem("sc-domain:example.com"),
            "sc_domain_example_com"
        );
    }

    #[test]
    fn test_cache_file_stem_with_path() {
        assert_eq!(
            cache_file_stem("https://example.com/blog/"),
            "https_example_com_blog"
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let site = "https://example.com/";

        let mut cache = StatusCache::with_dir(site, true, dir.path());
        cache.load().unwrap();
        assert!(cache.is_empty());

        cache.put(
            "https://example.com/page",
            UrlStatus {
                status: Some("Crawled - currently not indexed".to_string()),
                last_checked: Some(Utc::now()),
                ..Default::default()
            },
        );
        cache.dump().unwrap();

        let mut reloaded = StatusCache::with_dir(site, true, dir.path());
        reloaded.load().unwrap();
        let record = reloaded.get("https://example.com/page").unwrap();
        assert_eq!(
            record.status.as_deref(),
            Some("Crawled - currently not indexed")
        );
        assert_eq!(reloaded.urls(), vec!["https://example.com/page"]);
    }

    #[test]
    fn test_disabled_cache_never_hits_or_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = StatusCache::with_dir("https://example.com/", false, dir.path());

        cache.load().unwrap();
        cache.put("https://example.com/page", UrlStatus::default());
        assert!(cache.get("https://example.com/page").is_none());

        cache.dump().unwrap();
        // No file should appear in the scratch dir
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_corrupt_cache_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = StatusCache::with_dir("https://example.com/", true, dir.path());
        std::fs::write(&cache.path, "not json").unwrap();
        assert!(cache.load().is_err());
    }

    #[test]
    fn test_submitted_within() {
        let fresh = UrlStatus {
            last_notified_at: Some(Utc::now() - Duration::days(2)),
            ..Default::default()
        };
        assert!(fresh.submitted_within(Duration::days(14)));
        assert!(!fresh.submitted_within(Duration::days(1)));

        let never = UrlStatus::default();
        assert!(!never.submitted_within(Duration::days(14)));
    }

    #[test]
    fn test_checked_within() {
        let stale = UrlStatus {
            last_checked: Some(Utc::now() - Duration::days(30)),
            ..Default::default()
        };
        assert!(!stale.checked_within(Duration::days(14)));
        assert!(stale.checked_within(Duration::days(60)));
    }
}
