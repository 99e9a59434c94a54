use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use engine::persist::{load_artifact, ArtifactPaths};
use engine::{ItemId, Recommender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w342";

#[derive(Deserialize)]
pub struct RecommendParams {
    #[serde(default)]
    pub title: String,
    /// Kept as text so a malformed count falls back to the default instead of rejecting the request.
    #[serde(default)]
    pub n: Option<String>,
}

pub const DEFAULT_N: usize = 8;

impl RecommendParams {
    pub fn count(&self) -> usize {
        self.n
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_N)
    }
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub status: String,
    pub matched: Option<ItemId>,
    pub took_s: f64,
    pub results: Vec<RecommendHit>,
}

#[derive(Serialize)]
pub struct RecommendHit {
    pub id: ItemId,
    pub title: String,
    pub score: f32,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub image_base: Arc<str>,
}

impl AppState {
    fn image_url(&self, image_ref: Option<&str>) -> Option<String> {
        image_ref.filter(|r| !r.is_empty()).map(|r| format!("{}{}", self.image_base, r))
    }
}

/// Load the artifact and build the router. Fails, and the server refuses to
/// start, if the artifact is absent or inconsistent.
pub fn build_app(artifact_dir: &str, image_base: &str) -> Result<Router> {
    let (artifact, meta) = load_artifact(&ArtifactPaths::new(artifact_dir))?;
    let recommender = Recommender::new(artifact)?;
    tracing::info!(num_items = recommender.len(), created_at = %meta.created_at, "recommender ready");
    Ok(router(Arc::new(recommender), image_base))
}

pub fn router(recommender: Arc<Recommender>, image_base: &str) -> Router {
    let app_state = AppState { recommender, image_base: Arc::from(image_base) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler))
        .route("/titles", get(titles_handler))
        .route("/item/:id", get(item_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn recommend_handler(State(state): State<AppState>, Query(params): Query<RecommendParams>) -> Json<RecommendResponse> {
    let start = std::time::Instant::now();
    let out = state.recommender.recommend(&params.title, params.count());
    let results = out
        .items
        .into_iter()
        .map(|r| RecommendHit {
            image_url: state.image_url(r.image_ref.as_deref()),
            id: r.id,
            title: r.title,
            score: r.score,
        })
        .collect();
    let elapsed = start.elapsed();
    Json(RecommendResponse { query: params.title, status: out.status, matched: out.matched, took_s: elapsed.as_secs_f64(), results })
}

pub async fn titles_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.recommender.titles().into_iter().map(String::from).collect())
}

pub async fn item_handler(State(state): State<AppState>, Path(id): Path<ItemId>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match state.recommender.title(id) {
        Some(title) => Ok(Json(serde_json::json!({
            "id": id,
            "title": title,
            "image_url": state.image_url(state.recommender.image_ref(id)),
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no item {id}"))),
    }
}
