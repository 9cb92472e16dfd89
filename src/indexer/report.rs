// src/indexer/report.rs
// =============================================================================
// This module defines what a run reports back.
//
// Every URL that reached the submission phase gets a SubmissionResult;
// the IndexingReport wraps them together with the run totals. main.rs
// renders the report as a table or as JSON.
//
// Rust concepts:
// - serde tagging: The status enum serializes as {"status": "submitted"}
//   so the JSON output stays flat and script-friendly
// =============================================================================

use serde::{Deserialize, Serialize};

// The outcome for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Submitted to the Indexing API on this run
    Submitted,
    /// Google already has a notification for this URL (or the cache says
    /// we submitted it recently)
    AlreadySubmitted,
    /// The daily publish quota ran out before this URL's turn
    QuotaExceeded,
    /// The submission request failed
    Failed,
}

// The result of handling a single URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// The URL that was handled
    pub url: String,
    /// What happened to it
    #[serde(flatten)]
    pub status: SubmissionStatus,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmissionResult {
    pub fn new(url: impl Into<String>, status: SubmissionStatus, message: Option<String>) -> Self {
        Self {
            url: url.into(),
            status,
            message,
        }
    }

    /// Helper method to check whether the URL ended in a good state
    ///
    /// Quota exhaustion is not a failure - the URL just has to wait for
    /// the next run
    pub fn is_ok(&self) -> bool {
        !matches!(self.status, SubmissionStatus::Failed)
    }
}

// Everything one run produced
#[derive(Debug, Serialize)]
pub struct IndexingReport {
    /// The normalized property the run worked on
    pub property: String,
    /// How many candidate URLs discovery produced
    pub total_urls: usize,
    /// How many URLs were actually submitted this run
    pub num_submitted: usize,
    /// Per-URL outcomes for everything that reached the submission phase
    pub results: Vec<SubmissionResult>,
}

impl IndexingReport {
    pub fn empty(property: String) -> Self {
        Self {
            property,
            total_urls: 0,
            num_submitted: 0,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_ok() {
        let submitted = SubmissionResult::new(
            "https://example.com/page",
            SubmissionStatus::Submitted,
            None,
        );
        assert!(submitted.is_ok());

        let failed = SubmissionResult::new(
            "https://example.com/page",
            SubmissionStatus::Failed,
            Some("HTTP 500".to_string()),
        );
        assert!(!failed.is_ok());

        let quota = SubmissionResult::new(
            "https://example.com/page",
            SubmissionStatus::QuotaExceeded,
            None,
        );
        assert!(quota.is_ok());
    }

    #[test]
    fn test_result_serializes_flat() {
        let result = SubmissionResult::new(
            "https://example.com/page",
            SubmissionStatus::AlreadySubmitted,
            None,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["url"], "https://example.com/page");
        assert_eq!(json["status"], "already_submitted");
        assert!(json.get("message").is_none());
    }
}
