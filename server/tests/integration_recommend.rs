use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engine::persist::{save_artifact, save_meta, ArtifactPaths, MetaFile, ARTIFACT_VERSION};
use engine::{Artifact, Item, Vectorizer};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn item(id: u64, title: &str, text: &str, image: Option<&str>) -> Item {
    Item { id, title: title.into(), text: text.into(), image_ref: image.map(String::from) }
}

fn build_tiny_artifact(dir: &std::path::Path) {
    let items = vec![
        item(1, "Alpha", "space adventure action 2001", Some("/alpha.jpg")),
        item(2, "Beta", "space adventure drama 2002", Some("/beta.jpg")),
        item(3, "Gamma", "cooking competition reality 2010", None),
    ];
    let (artifact, vocab) = Artifact::build(&items, &Vectorizer::default()).unwrap();
    let paths = ArtifactPaths::new(dir);
    save_artifact(&paths, &artifact).unwrap();
    let meta = MetaFile {
        num_items: artifact.len() as u64,
        num_terms: vocab.len() as u64,
        created_at: "2024-01-01T00:00:00Z".into(),
        version: ARTIFACT_VERSION,
    };
    save_meta(&paths, &meta).unwrap();
}

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempdir().unwrap();
    build_tiny_artifact(dir.path());
    let app = server::build_app(&dir.path().to_string_lossy(), "https://img.test/w342").unwrap();
    (dir, app)
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn recommend_returns_ranked_results() {
    let (_dir, app) = app();
    let (status, json) = call(app, "/recommend?title=alpha&n=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Recommendations for 'Alpha'");
    assert_eq!(json["matched"], 1);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], 2);
    assert_eq!(arr[0]["image_url"], "https://img.test/w342/beta.jpg");
    assert_eq!(arr[1]["id"], 3);
    assert!(arr[1]["image_url"].is_null());
}

#[tokio::test]
async fn empty_and_unknown_queries_are_statuses() {
    let (_dir, app) = app();
    let (status, json) = call(app.clone(), "/recommend?title=&n=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "please enter a title");
    assert!(json["results"].as_array().unwrap().is_empty());

    let (status, json) = call(app, "/recommend?title=Nonexistent%20Title").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["status"].as_str().unwrap().contains("Nonexistent Title"));
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_count_falls_back_to_default() {
    let (_dir, app) = app();
    for uri in ["/recommend?title=Alpha&n=abc", "/recommend?title=Alpha&n=-3", "/recommend?title=Alpha&n="] {
        let (status, json) = call(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "Recommendations for 'Alpha'");
        // default of 8 clamps to the two other items
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn titles_and_items() {
    let (_dir, app) = app();
    let (_, json) = call(app.clone(), "/titles").await;
    assert_eq!(json, serde_json::json!(["Alpha", "Beta", "Gamma"]));

    let (status, json) = call(app.clone(), "/item/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Alpha");

    let (status, _) = call(app, "/item/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn refuses_to_start_without_artifact() {
    let dir = tempdir().unwrap();
    assert!(server::build_app(&dir.path().to_string_lossy(), "").is_err());
}
