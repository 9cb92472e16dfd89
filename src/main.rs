// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the service account credentials and fetch an access token
// 3. Run the bulk indexer for the property
// 4. Print the report and exit with proper code
//
// Exit codes:
//   0 = run completed (individual URLs may still have failed; see report)
//   1 = authentication failed, nothing was submitted
//   2 = unexpected error
// =============================================================================

// Module declarations - tells Rust about our other source files
mod auth; // src/auth/ - service account token exchange
mod cache; // src/cache/ - on-disk status cache
mod cli; // src/cli.rs - command-line parsing
mod discover; // src/discover/ - sitemap and homepage URL discovery
mod gsc; // src/gsc/ - Search Console / Indexing API clients
mod indexer; // src/indexer/ - bulk indexing orchestration

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};

use auth::Authenticator;
use cli::Cli;
use indexer::{BulkIndexer, IndexingReport, SubmissionStatus};

// The #[tokio::main] attribute transforms our async main into a real main
// function that runs our async code inside a tokio runtime
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    // Progress goes to stderr via the logger so --json output on stdout
    // stays parseable
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    debug!("🔐 Getting access token...");
    let mut authenticator = match Authenticator::from_file(&cli.credentials_path) {
        Ok(authenticator) => authenticator,
        Err(e) => {
            error!("❌ Failed to load credentials: {:#}", e);
            return Ok(1);
        }
    };

    // Prove the credentials work before doing any discovery; a bad key
    // must fail here, with zero submission attempts
    if let Err(e) = authenticator.bearer().await {
        error!("❌ Failed to get access token: {:#}", e);
        return Ok(1);
    }
    info!("🔐 Access token acquired");

    let mut bulk = BulkIndexer::new(
        authenticator,
        &cli.property,
        !cli.no_cache,
        cli.use_cached_urls,
    )?;

    let report = bulk.index().await?;

    print_report(&report, cli.json)?;

    Ok(0)
}

// Prints the report either as a table or JSON
fn print_report(report: &IndexingReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints the report as a human-readable table in the terminal
fn print_table(report: &IndexingReport) {
    if !report.results.is_empty() {
        println!("{:<60} {:<22} {:<30}", "URL", "STATUS", "MESSAGE");
        println!("{}", "=".repeat(112));

        for result in &report.results {
            let status_display = format_status(&result.status);
            let message = result.message.as_deref().unwrap_or("");

            // Truncate URL if too long for display
            let url_display = if result.url.len() > 57 {
                format!("{}...", &result.url[..57])
            } else {
                result.url.clone()
            };

            println!("{:<60} {:<22} {:<30}", url_display, status_display, message);
        }

        println!();
    }

    let already = report
        .results
        .iter()
        .filter(|r| r.status == SubmissionStatus::AlreadySubmitted)
        .count();
    let quota = report
        .results
        .iter()
        .filter(|r| r.status == SubmissionStatus::QuotaExceeded)
        .count();
    let failed = report.results.iter().filter(|r| !r.is_ok()).count();

    println!("📊 Summary for {}:", report.property);
    println!("   📋 URLs discovered: {}", report.total_urls);
    println!("   ✅ Submitted: {}", report.num_submitted);
    println!("   🕛 Already submitted: {}", already);
    if quota > 0 {
        println!("   ⏳ Waiting for quota: {}", quota);
    }
    println!("   ❌ Failed: {}", failed);
}

// Formats the status enum as a short labelled string
fn format_status(status: &SubmissionStatus) -> String {
    match status {
        SubmissionStatus::Submitted => "✅ SUBMITTED".to_string(),
        SubmissionStatus::AlreadySubmitted => "🕛 ALREADY SUBMITTED".to_string(),
        SubmissionStatus::QuotaExceeded => "⏳ QUOTA".to_string(),
        SubmissionStatus::Failed => "❌ FAILED".to_string(),
    }
}
