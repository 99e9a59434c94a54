//! TMDB catalog source: popular-movie pages plus per-movie genre lookups,
//! every request wrapped in a bounded retry.

use anyhow::{anyhow, Result};
use engine::record::CatalogRecord;
use engine::ItemId;
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 4, base_delay: Duration::from_millis(1500) }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt `attempt` (1-based); grows linearly.
    pub fn delay(&self, attempt: u32) -> Duration { self.base_delay * attempt }
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed,
/// then return the last error.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::warn!(what, attempt, attempts, error = %e, "request failed");
                last = Some(e);
                if attempt < attempts {
                    sleep(policy.delay(attempt)).await;
                }
            }
        }
    }
    let err = last.unwrap_or_else(|| anyhow!("no attempts made"));
    Err(err.context(format!("{what}: giving up after {attempts} attempts")))
}

#[derive(Debug, Deserialize)]
struct PopularPage {
    #[serde(default)]
    results: Vec<PopularMovie>,
}

#[derive(Debug, Deserialize)]
struct PopularMovie {
    id: ItemId,
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    popularity: Option<f64>,
}

impl From<PopularMovie> for CatalogRecord {
    fn from(m: PopularMovie) -> Self {
        CatalogRecord {
            id: m.id,
            title: m.title.unwrap_or_default(),
            overview: m.overview.unwrap_or_default(),
            genres: Vec::new(),
            release_date: m.release_date.unwrap_or_default(),
            poster_path: m.poster_path.unwrap_or_default(),
            popularity: m.popularity.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    #[serde(default)]
    name: Option<String>,
}

pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key, retry })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        with_retry(self.retry, path, || {
            let req = self
                .http
                .get(url.as_str())
                .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
                .query(params);
            async move {
                let resp = req.send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(anyhow!("status {status}"));
                }
                Ok(resp.json::<T>().await?)
            }
        })
        .await
    }

    /// Popular movies from pages `1..=pages`, de-duplicated by id in first-seen order.
    /// Any page failing after retries aborts the fetch.
    pub async fn fetch_popular(&self, pages: u32) -> Result<Vec<CatalogRecord>> {
        let mut records = Vec::new();
        for page in 1..=pages {
            tracing::info!(page, "fetching popular page");
            let data: PopularPage = self.get_json("/movie/popular", &[("page", page.to_string())]).await?;
            records.extend(data.results.into_iter().map(CatalogRecord::from));
        }
        let records = dedupe_by_id(records);
        tracing::info!(num_movies = records.len(), "fetched movies");
        Ok(records)
    }

    pub async fn fetch_genres(&self, id: ItemId) -> Result<Vec<String>> {
        let details: MovieDetails = self.get_json(&format!("/movie/{id}"), &[]).await?;
        Ok(genre_names(details))
    }
}

fn genre_names(details: MovieDetails) -> Vec<String> {
    details
        .genres
        .into_iter()
        .filter_map(|g| g.name)
        .filter(|n| !n.trim().is_empty())
        .collect()
}

pub fn dedupe_by_id(records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
    let mut seen = HashSet::new();
    records.into_iter().filter(|r| seen.insert(r.id)).collect()
}

/// Fill in `genres` for every record using `concurrency` workers. A movie whose
/// lookup fails keeps empty genres; the rest of the batch is unaffected.
pub async fn enrich_genres(client: Arc<TmdbClient>, records: &mut [CatalogRecord], concurrency: usize) {
    let queue: Arc<Mutex<VecDeque<ItemId>>> = Arc::new(Mutex::new(records.iter().map(|r| r.id).collect()));
    let genres: Arc<Mutex<HashMap<ItemId, Vec<String>>>> = Arc::new(Mutex::new(HashMap::new()));
    let total = records.len();

    let mut workers = Vec::new();
    for _ in 0..concurrency.max(1).min(total.max(1)) {
        let client = client.clone();
        let queue = queue.clone();
        let genres = genres.clone();
        workers.push(tokio::spawn(async move {
            loop {
                let next = queue.lock().pop_front();
                let Some(id) = next else { break };
                let names = match client.fetch_genres(id).await {
                    Ok(names) => names,
                    Err(e) => {
                        tracing::warn!(id, error = %e, "failed to fetch details, leaving genres empty");
                        Vec::new()
                    }
                };
                let done = {
                    let mut g = genres.lock();
                    g.insert(id, names);
                    g.len()
                };
                if done % 50 == 0 {
                    tracing::info!(done, total, "fetching details");
                }
            }
        }));
    }
    for w in workers {
        if let Err(e) = w.await {
            tracing::warn!(error = %e, "detail worker aborted");
        }
    }

    let mut genres = genres.lock();
    for rec in records.iter_mut() {
        rec.genres = genres.remove(&rec.id).unwrap_or_default();
    }
}
