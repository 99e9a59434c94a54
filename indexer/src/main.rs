use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use engine::persist::{save_artifact, save_meta, ArtifactPaths, MetaFile, ARTIFACT_VERSION};
use engine::record::CatalogRecord;
use engine::vectorizer::DEFAULT_MAX_FEATURES;
use engine::{Artifact, Item, ItemId, Vectorizer};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the item similarity artifact from a catalog dump", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the artifact from catalog JSON/JSONL files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output artifact directory
        #[arg(long)]
        output: String,
        /// Maximum vocabulary size
        #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
        max_features: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_features } => {
            build_artifact(Path::new(&input), Path::new(&output), max_features)
        }
    }
}

fn build_artifact(input: &Path, output: &Path, max_features: usize) -> Result<()> {
    if max_features == 0 {
        return Err(anyhow!("--max-features must be at least 1"));
    }
    let files = input_files(input);
    if files.is_empty() {
        return Err(anyhow!("no .json or .jsonl input found at {}", input.display()));
    }

    let mut records = Vec::new();
    for file in &files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(file, &mut records)?;
        } else {
            read_json(file, &mut records)?;
        }
    }
    let items = dedupe(records);
    tracing::info!(num_files = files.len(), num_items = items.len(), "ingested catalog");

    let (artifact, vocab) = Artifact::build(&items, &Vectorizer::new(max_features))
        .context("building similarity artifact")?;
    tracing::info!(num_items = artifact.len(), num_terms = vocab.len(), "built similarity matrix");

    let paths = ArtifactPaths::new(output);
    save_artifact(&paths, &artifact)?;
    let meta = MetaFile {
        num_items: artifact.len() as u64,
        num_terms: vocab.len() as u64,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: ARTIFACT_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output = %output.display(), "artifact build complete");
    Ok(())
}

fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn read_jsonl(file: &Path, out: &mut Vec<CatalogRecord>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let rec: CatalogRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        out.push(rec);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<CatalogRecord>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping json that is neither object nor array"),
    }
    Ok(())
}

/// Keep the first record per id, in input order.
fn dedupe(records: Vec<CatalogRecord>) -> Vec<Item> {
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    for rec in records {
        if !seen.insert(rec.id) {
            tracing::warn!(id = rec.id, "duplicate catalog id, keeping first occurrence");
            continue;
        }
        items.push(rec.into_item());
    }
    items
}
