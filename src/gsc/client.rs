// src/gsc/client.rs
// =============================================================================
// This module is the client for Google's Indexing and URL Inspection APIs.
//
// Key functionality:
// - publish(): notify Google that a URL was added or updated
// - notification_status(): ask whether a URL was already submitted
// - inspect(): ask how Google currently covers a URL in its index
// - is_indexable(): which coverage states are worth submitting
//
// Rate limits:
// - The publish endpoint answers HTTP 429 when the per-minute quota is
//   exceeded; publish() backs off with a doubling delay and retries a
//   bounded number of times before giving up on the URL
// =============================================================================

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const INDEXING_API_BASE: &str = "https://indexing.googleapis.com/v3/urlNotifications";
const INSPECTION_API: &str = "https://searchconsole.googleapis.com/v1/urlInspection/index:inspect";

// How often we retry a rate-limited publish, and the initial pause
// (the pause doubles on every retry)
const RATE_LIMIT_RETRIES: u32 = 3;
const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_secs(10);

// Coverage states that mean "Google does not index this URL yet" -
// exactly these are worth a submission. Anything else (most importantly
// "Submitted and indexed") is left alone.
const INDEXABLE_STATUSES: [&str; 5] = [
    "Discovered - currently not indexed",
    "Crawled - currently not indexed",
    "URL is unknown to Google",
    "Forbidden",
    "Error",
];

/// Whether a coverage state makes the URL eligible for submission
///
/// An unknown state (inspection never ran or returned nothing) is not
/// eligible - we only submit URLs Google told us it isn't indexing
pub fn is_indexable(status: Option<&str>) -> bool {
    match status {
        Some(status) => INDEXABLE_STATUSES.contains(&status),
        None => false,
    }
}

// Request body for the publish endpoint
#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    url: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

// The notification metadata object returned by both the publish and the
// metadata endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlNotificationMetadata {
    latest_update: Option<UrlNotification>,
    latest_remove: Option<UrlNotification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlNotification {
    notify_time: Option<DateTime<Utc>>,
}

// The publish endpoint wraps the metadata one level deeper
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    url_notification_metadata: Option<UrlNotificationMetadata>,
}

/// What we know about a URL's most recent notification
#[derive(Debug, Clone, Default)]
pub struct NotificationStatus {
    pub last_notified_at: Option<DateTime<Utc>>,
}

// Request/response shapes for URL inspection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectRequest<'a> {
    inspection_url: &'a str,
    site_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectResponse {
    inspection_result: Option<InspectionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectionResult {
    index_status_result: Option<IndexStatusResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatusResult {
    coverage_state: Option<String>,
    last_crawl_time: Option<DateTime<Utc>>,
}

/// Result of inspecting one URL
#[derive(Debug, Clone, Default)]
pub struct UrlInspection {
    pub status: Option<String>,
    pub last_crawled_at: Option<DateTime<Utc>>,
}

impl UrlInspection {
    fn from_response(response: InspectResponse) -> Self {
        let result = response
            .inspection_result
            .and_then(|r| r.index_status_result);
        match result {
            Some(result) => Self {
                status: result.coverage_state,
                last_crawled_at: result.last_crawl_time,
            },
            None => Self::default(),
        }
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            last_crawled_at: None,
        }
    }
}

// Client for the indexing endpoints of one property
//
// Holds the bearer token and the site URL so callers only pass the URL
// they are working on
pub struct Indexer {
    http: Client,
    bearer: String,
    site_url: String,
}

impl Indexer {
    pub fn new(http: Client, bearer: String, site_url: String) -> Self {
        Self {
            http,
            bearer,
            site_url,
        }
    }

    /// Submits a URL to the Indexing API as updated content
    ///
    /// Retries on HTTP 429 with a doubling backoff; any other non-2xx
    /// status fails the URL (the caller logs it and moves on)
    pub async fn publish(&self, url: &str) -> Result<NotificationStatus> {
        let endpoint = format!("{}:publish", INDEXING_API_BASE);
        let body = PublishRequest {
            url,
            kind: "URL_UPDATED",
        };

        let mut delay = RATE_LIMIT_BASE_DELAY;
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .post(&endpoint)
                .bearer_auth(&self.bearer)
                .json(&body)
                .send()
                .await
                .context("Failed to reach the Indexing API")?;

            let status = response.status();
            if status.is_success() {
                let parsed: PublishResponse = response
                    .json()
                    .await
                    .context("Failed to parse the publish response")?;
                return Ok(notification_status(parsed.url_notification_metadata));
            }

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < RATE_LIMIT_RETRIES {
                attempt += 1;
                warn!(
                    "⏳ Rate limited while submitting {}. Pausing {}s before retry {}/{}",
                    url,
                    delay.as_secs(),
                    attempt,
                    RATE_LIMIT_RETRIES
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }

            return Err(anyhow!(
                "Failed to request indexing. Status code: {}",
                status.as_u16()
            ));
        }
    }

    /// Fetches the notification metadata for a URL
    ///
    /// A 200 means the URL was submitted before; any other status is an
    /// error, which the submission loop treats as "never submitted"
    pub async fn notification_status(&self, url: &str) -> Result<NotificationStatus> {
        let endpoint = format!("{}/metadata", INDEXING_API_BASE);

        let response = self
            .http
            .get(&endpoint)
            .query(&[("url", url)])
            .bearer_auth(&self.bearer)
            .send()
            .await
            .context("Failed to reach the Indexing API")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Failed to get status. Status code: {}",
                status.as_u16()
            ));
        }

        let metadata: UrlNotificationMetadata = response
            .json()
            .await
            .context("Failed to parse the notification metadata")?;
        Ok(notification_status(Some(metadata)))
    }

    /// Inspects how Google currently covers a URL
    ///
    /// Never fails the batch: a 403 becomes the "Forbidden" state, any
    /// other failure becomes "Error", mirroring the coverage states the
    /// eligibility filter already knows
    pub async fn inspect(&self, url: &str) -> UrlInspection {
        let body = InspectRequest {
            inspection_url: url,
            site_url: &self.site_url,
        };

        let response = match self
            .http
            .post(INSPECTION_API)
            .bearer_auth(&self.bearer)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to inspect {}: {}", url, e);
                return UrlInspection::with_status("Error");
            }
        };

        match response.status() {
            status if status.is_success() => match response.json::<InspectResponse>().await {
                Ok(parsed) => UrlInspection::from_response(parsed),
                Err(e) => {
                    warn!("Failed to parse inspection of {}: {}", url, e);
                    UrlInspection::with_status("Error")
                }
            },
            StatusCode::FORBIDDEN => UrlInspection::with_status("Forbidden"),
            _ => UrlInspection::with_status("Error"),
        }
    }
}

// Pulls the most recent notify time out of the metadata, preferring the
// latest update over the latest removal
fn notification_status(metadata: Option<UrlNotificationMetadata>) -> NotificationStatus {
    let last_notified_at = metadata.and_then(|m| {
        m.latest_update
            .and_then(|n| n.notify_time)
            .or_else(|| m.latest_remove.and_then(|n| n.notify_time))
    });
    NotificationStatus { last_notified_at }
}
