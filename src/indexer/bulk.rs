// src/indexer/bulk.rs
// =============================================================================
// This module runs a whole property through the indexing pipeline.
//
// Phases:
// 1. Load the status cache for the property
// 2. Discover candidate URLs (cache, sitemaps, or homepage links)
// 3. Skip URLs the cache says were submitted within the last 14 days
// 4. Inspect the remaining URLs' coverage (bounded concurrency, cached)
// 5. Submit the ones Google is not indexing yet, sequentially, stopping
//    at the daily publish quota
// 6. Persist the cache and report per-URL outcomes
//
// Quotas (from the API documentation):
// - 200 publish requests per day
// - 2000 URL inspections per day
//
// Per-URL failures never abort the batch; only setup failures (cache
// file unreadable, sitemap listing rejected) end the run early.
// =============================================================================

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use reqwest::Client;

use crate::auth::Authenticator;
use crate::cache::StatusCache;
use crate::discover;
use crate::gsc::{self, Indexer};

use super::report::{IndexingReport, SubmissionResult, SubmissionStatus};

// Daily API quotas
const PUBLISH_QUOTA: usize = 200;
const INSPECTION_QUOTA: usize = 2000;

// How many inspection requests run at once
const INSPECTION_CONCURRENCY: usize = 10;

// How long cached submission and inspection data stays fresh
const CACHE_TIMEOUT_DAYS: i64 = 14;

/// Submits the URLs of one property for indexing in Google Search Console
pub struct BulkIndexer {
    auth: Authenticator,
    site_url: String,
    use_cached_urls: bool,
    cache: StatusCache,
    http: Client,
}

impl BulkIndexer {
    /// Builds an indexer for a property
    ///
    /// Parameters:
    ///   auth: authenticator holding the service account credentials
    ///   property: GSC property (URL prefix or bare domain)
    ///   use_cache: whether the on-disk status cache participates
    ///   use_cached_urls: reuse the previous run's URL list instead of
    ///     loading sitemaps (only meaningful with the cache enabled)
    pub fn new(
        auth: Authenticator,
        property: &str,
        use_cache: bool,
        use_cached_urls: bool,
    ) -> Result<Self> {
        let site_url = gsc::site_url(property);
        let cache = StatusCache::new(&site_url, use_cache);
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            auth,
            site_url,
            use_cached_urls,
            cache,
            http,
        })
    }

    /// Runs the whole pipeline and returns the run report
    pub async fn index(&mut self) -> Result<IndexingReport> {
        self.cache.load()?;

        let urls = self.discover_urls().await?;
        if urls.is_empty() {
            warn!("❌ No URLs found for {}. Exiting...", self.site_url);
            return Ok(IndexingReport::empty(self.site_url.clone()));
        }
        info!("Found {} URLs", urls.len());

        // Recently submitted URLs are done without any network traffic
        let window = Duration::days(CACHE_TIMEOUT_DAYS);
        let (mut results, to_consider) = split_recently_submitted(&self.cache, &urls, window);
        if !results.is_empty() {
            info!(
                "🗃️ Skipping {} URLs submitted within the last {} days",
                results.len(),
                CACHE_TIMEOUT_DAYS
            );
        }

        let statuses = self.check_indexing_status(&to_consider).await?;
        self.cache.dump()?;

        let eligible: Vec<String> = statuses
            .into_iter()
            .filter(|(_, status)| gsc::is_indexable(status.as_deref()))
            .map(|(url, _)| url)
            .collect();

        if eligible.is_empty() {
            info!(
                "✨ No URLs are eligible for submission. \
                 They are already submitted or indexed"
            );
            return Ok(IndexingReport {
                property: self.site_url.clone(),
                total_urls: urls.len(),
                num_submitted: 0,
                results,
            });
        }

        info!("🔍 Found {} URLs for submission.", eligible.len());
        let num_submitted = self.submit(&eligible, &mut results).await?;
        self.cache.dump()?;

        info!("🚀 All done. Run this when you add new pages or update page content");
        Ok(IndexingReport {
            property: self.site_url.clone(),
            total_urls: urls.len(),
            num_submitted,
            results,
        })
    }

    // Produces the candidate URL list for this run
    //
    // Order of preference: the previous run's cached URLs (opt-in), the
    // property's sitemaps, and finally links found on the homepage
    async fn discover_urls(&mut self) -> Result<Vec<String>> {
        if self.use_cached_urls && !self.cache.is_empty() {
            info!("Using cached URLs from the previous run");
            return Ok(self.cache.urls());
        }

        let bearer = self.auth.bearer().await?;
        let sitemaps = gsc::list_sitemaps(&self.http, &self.site_url, &bearer).await?;

        let mut urls = Vec::new();
        if sitemaps.is_empty() {
            let home = gsc::home_url(&self.site_url);
            match discover::discover_from_homepage(&self.http, &home).await {
                Ok(pages) => urls.extend(pages),
                Err(e) => warn!("Homepage discovery failed: {}", e),
            }
        } else {
            for sitemap in &sitemaps {
                urls.extend(discover::collect_urls(&self.http, sitemap).await?);
            }
        }

        Ok(dedupe_preserving_order(urls))
    }

    // Determines the coverage status of every candidate, reusing cached
    // results where they are still trustworthy
    async fn check_indexing_status(
        &mut self,
        urls: &[String],
    ) -> Result<Vec<(String, Option<String>)>> {
        info!("Checking indexing status...");

        let window = Duration::days(CACHE_TIMEOUT_DAYS);
        let mut statuses = Vec::new();
        let mut to_recheck = Vec::new();
        for url in urls {
            match self.cache.get(url) {
                Some(state) if !needs_recheck(state, window) => {
                    statuses.push((url.clone(), state.status.clone()));
                }
                _ => to_recheck.push(url.clone()),
            }
        }

        if to_recheck.len() > INSPECTION_QUOTA {
            warn!(
                "❌ Daily inspection quota of {} URLs is exhausted! \
                 {} URLs stay unchecked until a later run",
                INSPECTION_QUOTA,
                to_recheck.len() - INSPECTION_QUOTA
            );
            to_recheck.truncate(INSPECTION_QUOTA);
        }

        if !to_recheck.is_empty() {
            let bearer = self.auth.bearer().await?;
            let indexer = Indexer::new(self.http.clone(), bearer, self.site_url.clone());

            // Run up to INSPECTION_CONCURRENCY inspections at once and
            // collect the results as they complete
            let inspections: Vec<_> = stream::iter(to_recheck.into_iter().map(|url| {
                let indexer = &indexer;
                async move {
                    let inspection = indexer.inspect(&url).await;
                    (url, inspection)
                }
            }))
            .buffer_unordered(INSPECTION_CONCURRENCY)
            .collect()
            .await;

            let now = Utc::now();
            for (url, inspection) in inspections {
                let mut state = self.cache.get(&url).cloned().unwrap_or_default();
                state.status = inspection.status.clone();
                state.last_crawled_at = inspection.last_crawled_at;
                state.last_checked = Some(now);
                self.cache.put(&url, state);

                statuses.push((url, inspection.status));
            }
        }

        Ok(statuses)
    }

    // Submits the eligible URLs one by one, appending an outcome per URL
    //
    // Returns the number of URLs actually submitted
    async fn submit(
        &mut self,
        urls: &[String],
        results: &mut Vec<SubmissionResult>,
    ) -> Result<usize> {
        let bearer = self.auth.bearer().await?;
        let indexer = Indexer::new(self.http.clone(), bearer, self.site_url.clone());

        let mut num_submitted = 0;
        for (idx, url) in urls.iter().enumerate() {
            if num_submitted >= PUBLISH_QUOTA {
                warn!(
                    "Daily request quota of {} URLs is exhausted! \
                     Try running this in a day",
                    PUBLISH_QUOTA
                );
                for remaining in &urls[idx..] {
                    results.push(SubmissionResult::new(
                        remaining.clone(),
                        SubmissionStatus::QuotaExceeded,
                        Some("daily publish quota reached".to_string()),
                    ));
                }
                break;
            }

            info!("👩‍💻 Working on {}", url);

            // A URL with notification metadata was submitted before; only
            // URLs without any get a fresh publish
            match indexer.notification_status(url).await {
                Ok(notification) => {
                    info!(
                        "🕛 URL is already submitted. It may take few days \
                         for Google to index"
                    );
                    if let Some(at) = notification.last_notified_at {
                        self.record_notification(url, at);
                    }
                    results.push(SubmissionResult::new(
                        url.clone(),
                        SubmissionStatus::AlreadySubmitted,
                        None,
                    ));
                }
                Err(_) => match indexer.publish(url).await {
                    Ok(notification) => {
                        num_submitted += 1;
                        info!("✅ Submitted for indexing. Should be indexed in few days.");
                        let at = notification.last_notified_at.unwrap_or_else(Utc::now);
                        self.record_notification(url, at);
                        results.push(SubmissionResult::new(
                            url.clone(),
                            SubmissionStatus::Submitted,
                            None,
                        ));
                    }
                    Err(e) => {
                        error!("Failed to submit {}: {}", url, e);
                        results.push(SubmissionResult::new(
                            url.clone(),
                            SubmissionStatus::Failed,
                            Some(e.to_string()),
                        ));
                    }
                },
            }
        }

        Ok(num_submitted)
    }

    // Remembers when a URL was last notified, so the next run can skip it
    fn record_notification(&mut self, url: &str, at: chrono::DateTime<Utc>) {
        let mut state = self.cache.get(url).cloned().unwrap_or_default();
        state.last_notified_at = Some(at);
        self.cache.put(url, state);
    }
}

// Splits candidates into (already handled, still to consider) based on
// the cached submission timestamps
//
// With the cache disabled every lookup misses, so everything lands in
// the second list and the whole pipeline runs fresh
fn split_recently_submitted(
    cache: &StatusCache,
    urls: &[String],
    window: Duration,
) -> (Vec<SubmissionResult>, Vec<String>) {
    let mut done = Vec::new();
    let mut to_consider = Vec::new();

    for url in urls {
        match cache.get(url) {
            Some(state) if state.submitted_within(window) => {
                done.push(SubmissionResult::new(
                    url.clone(),
                    SubmissionStatus::AlreadySubmitted,
                    Some(format!(
                        "submitted within the last {} days",
                        CACHE_TIMEOUT_DAYS
                    )),
                ));
            }
            _ => to_consider.push(url.clone()),
        }
    }

    (done, to_consider)
}

// A cached record is trusted only if the status is final (not indexable)
// and the inspection is recent; anything else gets re-inspected
fn needs_recheck(state: &crate::cache::UrlStatus, window: Duration) -> bool {
    gsc::is_indexable(state.status.as_deref()) || !state.checked_within(window)
}

// Removes duplicate URLs while keeping first-seen order
fn dedupe_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::UrlStatus;

    fn cache_with(url: &str, state: UrlStatus) -> StatusCache {
        let mut cache = StatusCache::new("https://example.com/", true);
        cache.put(url, state);
        cache
    }

    #[test]
    fn test_recently_submitted_urls_are_skipped() {
        let url = "https://example.com/page".to_string();
        let cache = cache_with(
            &url,
            UrlStatus {
                last_notified_at: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            },
        );

        let (done, to_consider) =
            split_recently_submitted(&cache, &[url.clone()], Duration::days(14));

        assert_eq!(done.len(), 1);
        assert_eq!(done[0].status, SubmissionStatus::AlreadySubmitted);
        assert!(to_consider.is_empty());
    }

    #[test]
    fn test_stale_submission_is_reconsidered() {
        let url = "https://example.com/page".to_string();
        let cache = cache_with(
            &url,
            UrlStatus {
                last_notified_at: Some(Utc::now() - Duration::days(30)),
                ..Default::default()
            },
        );

        let (done, to_consider) =
            split_recently_submitted(&cache, &[url.clone()], Duration::days(14));

        assert!(done.is_empty());
        assert_eq!(to_consider, vec![url]);
    }

    #[test]
    fn test_disabled_cache_reconsiders_everything() {
        let url = "https://example.com/page".to_string();
        let mut cache = StatusCache::new("https://example.com/", false);
        cache.put(
            &url,
            UrlStatus {
                last_notified_at: Some(Utc::now()),
                ..Default::default()
            },
        );

        let (done, to_consider) =
            split_recently_submitted(&cache, &[url.clone()], Duration::days(14));

        assert!(done.is_empty());
        assert_eq!(to_consider, vec![url]);
    }

    #[test]
    fn test_needs_recheck_for_unknown_url() {
        assert!(needs_recheck(&UrlStatus::default(), Duration::days(14)));
    }

    #[test]
    fn test_needs_recheck_when_still_indexable() {
        // Even a fresh check gets repeated if the status says Google has
        // not indexed the URL yet - it may have been indexed since
        let state = UrlStatus {
            status: Some("Crawled - currently not indexed".to_string()),
            last_checked: Some(Utc::now()),
            ..Default::default()
        };
        assert!(needs_recheck(&state, Duration::days(14)));
    }

    #[test]
    fn test_no_recheck_for_fresh_final_status() {
        let state = UrlStatus {
            status: Some("Submitted and indexed".to_string()),
            last_checked: Some(Utc::now() - Duration::days(2)),
            ..Default::default()
        };
        assert!(!needs_recheck(&state, Duration::days(14)));
    }

    #[test]
    fn test_recheck_when_stale() {
        let state = UrlStatus {
            status: Some("Submitted and indexed".to_string()),
            last_checked: Some(Utc::now() - Duration::days(60)),
            ..Default::default()
        };
        assert!(needs_recheck(&state, Duration::days(14)));
    }

    #[test]
    fn test_dedupe_preserving_order() {
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
            "https://example.com/a".to_string(),
        ];
        assert_eq!(
            dedupe_preserving_order(urls),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
