// src/gsc/site.rs
// =============================================================================
// This module normalizes Search Console properties and lists their
// registered sitemaps.
//
// Search Console knows two kinds of property:
// - URL-prefix: "https://example.com/" (always with a trailing slash)
// - Domain:     "sc-domain:example.com" (covers every scheme/subdomain)
//
// Callers can pass either a full URL or a bare domain; site_url() turns
// both into the exact identifier the APIs expect.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const SITEMAPS_API_BASE: &str = "https://www.googleapis.com/webmasters/v3/sites/";

// Normalizes a property into a Search Console site URL
//
// Examples:
//   "https://example.com"  -> "https://example.com/"
//   "https://example.com/" -> "https://example.com/"
//   "example.com"          -> "sc-domain:example.com"
pub fn site_url(property: &str) -> String {
    if property.starts_with("http://") || property.starts_with("https://") {
        if property.ends_with('/') {
            property.to_string()
        } else {
            format!("{}/", property)
        }
    } else {
        format!("sc-domain:{}", property)
    }
}

// The address of a property's homepage, used for page discovery when no
// sitemaps are registered
//
// URL-prefix properties are already an address; domain properties get
// https:// put in front
pub fn home_url(site_url: &str) -> String {
    match site_url.strip_prefix("sc-domain:") {
        Some(domain) => format!("https://{}/", domain),
        None => site_url.to_string(),
    }
}

// Response shape of the sitemaps list endpoint: {"sitemap": [{"path": ...}]}
// The key is absent entirely when no sitemaps are registered
#[derive(Debug, Deserialize)]
struct SitemapsResponse {
    #[serde(default)]
    sitemap: Vec<SitemapEntry>,
}

#[derive(Debug, Deserialize)]
struct SitemapEntry {
    path: String,
}

// Lists the sitemap URLs registered for a property
//
// Parameters:
//   http: shared HTTP client
//   site_url: normalized property identifier
//   bearer: access token with the webmasters.readonly scope
//
// A 403 means the service account was never added as a user of the
// property, which deserves its own message because it's the most common
// setup mistake
pub async fn list_sitemaps(http: &Client, site_url: &str, bearer: &str) -> Result<Vec<String>> {
    let url = format!("{}{}/sitemaps/", SITEMAPS_API_BASE, encode_site_url(site_url));

    let response = http
        .get(&url)
        .bearer_auth(bearer)
        .send()
        .await
        .context("Failed to reach the Search Console API")?;

    match response.status() {
        StatusCode::FORBIDDEN => Err(anyhow!(
            "The service account does not have permission to access this site"
        )),
        status if status.is_success() => {
            let body: SitemapsResponse = response
                .json()
                .await
                .context("Failed to parse the sitemaps response")?;
            Ok(body.sitemap.into_iter().map(|entry| entry.path).collect())
        }
        status => Err(anyhow!(
            "Failed to fetch sitemaps. Status code: {}",
            status.as_u16()
        )),
    }
}

// Form-encodes a site URL for use as a path segment
// ("https://example.com/" -> "https%3A%2F%2Fexample.com%2F")
fn encode_site_url(site_url: &str) -> String {
    url::form_urlencoded::byte_serialize(site_url.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_url_adds_trailing_slash() {
        assert_eq!(site_url("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_site_url_keeps_trailing_slash() {
        assert_eq!(site_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_site_url_http_prefix() {
        assert_eq!(site_url("http://example.com"), "http://example.com/");
    }

    #[test]
    fn test_site_url_bare_domain() {
        assert_eq!(site_url("example.com"), "sc-domain:example.com");
    }

    #[test]
    fn test_home_url_for_url_prefix() {
        assert_eq!(home_url("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_home_url_for_domain_property() {
        assert_eq!(home_url("sc-domain:example.com"), "https://example.com/");
    }

    #[test]
    fn test_encode_site_url() {
        assert_eq!(
            encode_site_url("https://example.com/"),
            "https%3A%2F%2Fexample.com%2F"
        );
    }

    #[test]
    fn test_sitemaps_response_parses() {
        let json = r#"{"sitemap": [
            {"path": "https://example.com/sitemap.xml", "isPending": false},
            {"path": "https://example.com/news-sitemap.xml"}
        ]}"#;
        let body: SitemapsResponse = serde_json::from_str(json).unwrap();
        let paths: Vec<String> = body.sitemap.into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/news-sitemap.xml"
            ]
        );
    }

    #[test]
    fn test_sitemaps_response_missing_key() {
        let body: SitemapsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.sitemap.is_empty());
    }
}
