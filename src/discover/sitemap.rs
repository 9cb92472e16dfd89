// src/discover/sitemap.rs
// =============================================================================
// This module extracts page URLs from sitemaps.
//
// How it works:
// 1. Start with the sitemap URL in a queue
// 2. Fetch the document and parse it
// 3. A <urlset> contributes its page <loc> entries to the result
// 4. A <sitemapindex> queues its child sitemap <loc>s for fetching
// 5. Repeat until the queue is empty
//
// A visited set guards against sitemap indexes that (directly or not)
// point back at themselves.
//
// Only <loc> elements directly inside <url> or <sitemap> count - image
// and video sitemap extensions nest their own <loc> deeper and those are
// not page URLs.
//
// Rust concepts:
// - VecDeque + HashSet: Queue-driven traversal with cycle protection
// - quick-xml events: Streaming parse, no DOM needed
// =============================================================================

use std::collections::{HashSet, VecDeque};

use anyhow::{anyhow, Result};
use log::{info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

// A parsed sitemap document is one of two kinds
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// A sitemap index: the URLs point at further sitemaps
    Index(Vec<String>),
    /// A urlset: the URLs are page addresses
    UrlSet(Vec<String>),
}

// Collects all page URLs reachable from a sitemap
//
// Parameters:
//   http: shared HTTP client
//   sitemap_url: where to start (a urlset or a sitemap index)
//
// Documents that fail to fetch or parse are logged and skipped; the rest
// of the tree is still collected.
pub async fn collect_urls(http: &Client, sitemap_url: &str) -> Result<Vec<String>> {
    let mut queue = VecDeque::new();
    queue.push_back(sitemap_url.to_string());

    let mut visited = HashSet::new();
    let mut urls = Vec::new();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }

        let xml = match fetch_sitemap(http, &current).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Skipping sitemap {}: {}", current, e);
                continue;
            }
        };

        match parse_sitemap(&xml) {
            Ok(SitemapDocument::Index(children)) => {
                for child in children {
                    if !visited.contains(&child) {
                        queue.push_back(child);
                    }
                }
            }
            Ok(SitemapDocument::UrlSet(pages)) => urls.extend(pages),
            Err(e) => warn!("Skipping sitemap {}: {}", current, e),
        }
    }

    Ok(urls)
}

// Fetches a sitemap document
async fn fetch_sitemap(http: &Client, url: &str) -> Result<String> {
    info!("Fetching sitemap from {}", url);

    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to fetch sitemap. Status code: {}",
            response.status().as_u16()
        ));
    }

    Ok(response.text().await?)
}

// Parses one sitemap document
//
// The root element decides the kind: <sitemapindex> or <urlset>.
// Anything else is rejected.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // Whether the root was a sitemap index (None until the root is seen)
    let mut is_index: Option<bool> = None;
    // Local names of the currently open elements
    let mut open: Vec<String> = Vec::new();
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                if is_index.is_none() {
                    is_index = Some(match name.as_str() {
                        "sitemapindex" => true,
                        "urlset" => false,
                        other => {
                            return Err(anyhow!("Unrecognized sitemap root element <{}>", other))
                        }
                    });
                }
                open.push(name);
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Text(text)) => {
                if in_entry_loc(&open) {
                    let loc = text.unescape()?.trim().to_string();
                    if !loc.is_empty() {
                        locs.push(loc);
                    }
                }
            }
            Ok(Event::CData(text)) => {
                if in_entry_loc(&open) {
                    let loc = String::from_utf8_lossy(&text.into_inner())
                        .trim()
                        .to_string();
                    if !loc.is_empty() {
                        locs.push(loc);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(anyhow!("Malformed sitemap XML: {}", e)),
        }
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(locs)),
        Some(false) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(anyhow!("Empty sitemap document")),
    }
}

// True when the parser is inside a <loc> that belongs to a <url> or
// <sitemap> entry (and not, say, an <image:image> extension block)
fn in_entry_loc(open: &[String]) -> bool {
    let n = open.len();
    n >= 2 && open[n - 1] == "loc" && (open[n - 2] == "url" || open[n - 2] == "sitemap")
}

// Strips a namespace prefix: "image:loc" -> "loc"
fn local_name(name: &[u8]) -> String {
    let bytes = match name.iter().rposition(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    };
    String::from_utf8_lossy(bytes).into_owned()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is VecDeque?
//    - A double-ended queue
//    - push_back() adds to end, pop_front() removes from start
//    - Perfect for visiting a tree of sitemaps level by level
//
// 2. What is HashSet?
//    - A set of unique items (no duplicates)
//    - Very fast lookup: O(1) to check if item exists
//    - We use it to avoid fetching the same sitemap twice
//
// 3. How does quick-xml work?
//    - It emits events (Start, Text, End, ...) as it reads the document
//    - We never build a full tree; we just watch for the elements we need
//    - Namespaces arrive as literal prefixes ("image:loc"), which is why
//      local_name() strips them before comparing
//
// 4. Why track the open elements in a Vec?
//    - A <loc> only counts when its parent is <url> or <sitemap>
//    - The Vec of open element names is effectively the parser's path,
//      so checking the parent is just looking one slot back
// -----------------------------------------------------------------------------
