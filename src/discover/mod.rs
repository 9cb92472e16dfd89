// src/discover/mod.rs
// =============================================================================
// This module discovers the URLs of a property.
//
// Submodules:
// - sitemap: Fetches and parses sitemap XML, following sitemap indexes
// - pages: Collects same-domain links from the homepage, as a fallback
//   for properties with no registered sitemaps
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod pages;
mod sitemap;

// Re-export public items from submodules
pub use pages::{discover_from_homepage, extract_page_links};
pub use sitemap::{collect_urls, parse_sitemap, SitemapDocument};
