mod tmdb;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tmdb::{enrich_genres, RetryPolicy, TmdbClient, DEFAULT_BASE_URL};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Fetch popular movies from TMDB into a JSONL catalog")]
struct Cli {
    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Number of popular-list pages to fetch
    #[arg(long, env = "TMDB_PAGES", default_value_t = 8)]
    pages: u32,
    /// Output JSONL file path
    #[arg(long, default_value = "./data/catalog.jsonl")]
    output: String,
    /// API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Concurrent detail lookups
    #[arg(long, default_value_t = 8)]
    concurrency: usize,
    /// Attempts per request before giving up
    #[arg(long, default_value_t = 4)]
    retries: u32,
    /// Backoff step in milliseconds; the wait after attempt k is k steps
    #[arg(long, default_value_t = 1500)]
    backoff_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    if args.api_key.trim().is_empty() {
        return Err(anyhow!("TMDB_API_KEY is empty"));
    }
    prepare_output(Path::new(&args.output))?;

    let retry = RetryPolicy { max_attempts: args.retries, base_delay: Duration::from_millis(args.backoff_ms) };
    let client = Arc::new(TmdbClient::new(
        &args.base_url,
        args.api_key.clone(),
        Duration::from_secs(args.timeout_secs),
        retry,
    )?);
    tracing::info!(pages = args.pages, concurrency = args.concurrency, output = %args.output, "fetching catalog");

    let mut records = client.fetch_popular(args.pages).await?;
    if records.is_empty() {
        return Err(anyhow!("catalog returned no movies"));
    }
    enrich_genres(client.clone(), &mut records, args.concurrency).await;

    let mut out = BufWriter::new(
        File::create(&args.output).with_context(|| format!("creating {}", args.output))?,
    );
    for rec in &records {
        serde_json::to_writer(&mut out, rec)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let with_genres = records.iter().filter(|r| !r.genres.is_empty()).count();
    tracing::info!(movies = records.len(), with_genres, output = %args.output, "catalog written");
    Ok(())
}

/// Create the parent directory of the output file.
fn prepare_output(output: &Path) -> Result<()> {
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("a/b/catalog.jsonl");
        prepare_output(&out).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        prepare_output(Path::new("catalog.jsonl")).unwrap();
    }

    #[test]
    fn parent_that_is_a_file_names_the_directory() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = prepare_output(&blocker.join("catalog.jsonl")).unwrap_err();
        assert!(err.to_string().contains("creating output directory"));
        assert!(err.to_string().contains("blocker"));
    }
}
