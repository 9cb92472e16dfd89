// src/discover/pages.rs
// =============================================================================
// This module discovers page URLs from the property's homepage.
//
// It is the fallback for properties that have no sitemaps registered in
// Search Console: fetch the homepage, extract every same-domain link,
// and treat those (plus the homepage itself) as the candidate pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// We also use the `url` crate to:
// - Resolve relative URLs to absolute URLs
// - Compare domains so we never wander off the property
// =============================================================================

use anyhow::{anyhow, Result};
use log::info;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

// Discovers candidate pages by scanning the homepage for links
//
// Parameters:
//   http: shared HTTP client
//   home: the property homepage (URL-prefix form, trailing slash)
//
// Returns: the homepage followed by every same-domain link found on it,
// in document order (duplicates included; the caller deduplicates)
pub async fn discover_from_homepage(http: &Client, home: &str) -> Result<Vec<String>> {
    info!("🏠 No sitemaps registered. Discovering pages from {}", home);

    let response = http.get(home).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to fetch homepage {}: HTTP {}",
            home,
            response.status().as_u16()
        ));
    }

    let html = response.text().await?;

    let mut pages = vec![home.to_string()];
    pages.extend(extract_page_links(&html, home));
    Ok(pages)
}

// Extracts all same-domain page links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base_url: the URL of the page (for resolving relative links)
//
// Fragments are stripped so "/about#team" and "/about" land on the same
// cache entry
pub fn extract_page_links(html: &str, base_url: &str) -> Vec<String> {
    let mut links = Vec::new();

    let document = Html::parse_document(html);

    // Our selector is a constant and known to be valid, so unwrap is fine
    let selector = Selector::parse("a[href]").unwrap();

    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(url) = resolve_page_link(&base, href) {
                links.push(url);
            }
        }
    }

    links
}

// Resolves a link (possibly relative) to an absolute same-domain URL
//
// Returns None for anchors, non-HTTP schemes, other domains, and
// anything unparseable
fn resolve_page_link(base: &Url, href: &str) -> Option<String> {
    // Skip anchors and special protocols
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    if resolved.domain() != base.domain() {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_same_domain_links() {
        let html = r#"
            <a href="https://example.com/pricing">Pricing</a>
            <a href="/docs">Docs</a>
            <a href="https://other.com/page">Elsewhere</a>
        "#;
        let links = extract_page_links(html, "https://example.com/");
        assert_eq!(
            links,
            vec!["https://example.com/pricing", "https://example.com/docs"]
        );
    }

    #[test]
    fn test_extract_strips_fragments() {
        let html = r#"<a href="/about#team">Team</a>"#;
        let links = extract_page_links(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/about"]);
    }

    #[test]
    fn test_extract_skips_anchors_and_special_schemes() {
        let html = r##"
            <a href="#section">Jump</a>
            <a href="mailto:hi@example.com">Email</a>
            <a href="tel:+1234567890">Call</a>
            <a href="javascript:void(0)">Click</a>
        "##;
        let links = extract_page_links(html, "https://example.com/");
        assert!(links.is_empty());
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        let result = resolve_page_link(&base, "../pricing");
        assert_eq!(result, Some("https://example.com/pricing".to_string()));
    }

    #[test]
    fn test_resolve_rejects_other_domain() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(resolve_page_link(&base, "https://other.com/page"), None);
    }
}
