// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Unlike tools with several modes, this one has a single job (submit a
// property's URLs for indexing), so the CLI is a flat set of flags rather
// than subcommands.
// =============================================================================

use clap::Parser;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "gsc-bulk-indexer",
    version = "0.1.0",
    about = "Submit website URLs in bulk to Google Search Console for indexing",
    long_about = "gsc-bulk-indexer discovers the pages of a verified Search Console property \
                  (from its sitemaps, or the homepage as a fallback), checks which of them \
                  Google has not indexed yet, and submits those to the Indexing API. \
                  Results are cached on disk so re-runs skip recently submitted URLs."
)]
pub struct Cli {
    /// Google Search Console property to index
    ///
    /// Either URL-prefix form (https://example.com/) or a bare domain
    /// (example.com, for domain properties)
    #[arg(short, long)]
    pub property: String,

    /// Path to the service account credentials JSON file
    #[arg(short, long, default_value = "./service_account.json")]
    pub credentials_path: String,

    /// Disable the on-disk status cache
    ///
    /// Every URL is then inspected and submitted fresh, regardless of
    /// what previous runs did
    #[arg(long)]
    pub no_cache: bool,

    /// Use cached URLs from a previous run instead of loading sitemaps
    ///
    /// Speeds things up on repeat runs for the same property, but will
    /// not see any newly added pages
    #[arg(long)]
    pub use_cached_urls: bool,

    /// Output the submission report in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::parse_from(["gsc-bulk-indexer", "-p", "https://example.com"]);
        assert_eq!(cli.property, "https://example.com");
        assert_eq!(cli.credentials_path, "./service_account.json");
        assert!(!cli.no_cache);
        assert!(!cli.use_cached_urls);
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::parse_from([
            "gsc-bulk-indexer",
            "--property",
            "example.com",
            "--credentials-path",
            "/tmp/sa.json",
            "--no-cache",
            "--use-cached-urls",
            "--json",
        ]);
        assert_eq!(cli.property, "example.com");
        assert_eq!(cli.credentials_path, "/tmp/sa.json");
        assert!(cli.no_cache);
        assert!(cli.use_cached_urls);
        assert!(cli.json);
    }

    #[test]
    fn test_property_is_required() {
        let result = Cli::try_parse_from(["gsc-bulk-indexer"]);
        assert!(result.is_err());
    }
}
