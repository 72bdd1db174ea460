//! In-process HTTP tests for the analyze endpoint, with all collaborators
//! mocked. Shapes mirror what the frontend consumes.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

use review_radar::analyze::weights::WeightConfig;
use review_radar::api::{create_router, AppState};
use review_radar::cache::ResultCache;
use review_radar::collab::mock::{MockClassifier, MockSource, MockSummarizer};
use review_radar::collab::RawComment;
use review_radar::orchestrator::FetchOrchestrator;

fn raw(text: &str) -> RawComment {
    RawComment {
        text: text.to_string(),
        url: format!("https://reddit.com/c/{}", text.replace(' ', "_")),
        weight_factors: None,
    }
}

fn app_with(source: MockSource, classifier: MockClassifier, summarizer: MockSummarizer) -> Router {
    let orchestrator = Arc::new(FetchOrchestrator::new(
        Arc::new(source),
        Arc::new(classifier),
        Arc::new(summarizer),
        Arc::new(ResultCache::in_memory()),
        WeightConfig::default(),
        50,
    ));
    create_router(AppState { orchestrator })
}

async fn post_analyze(app: &Router, payload: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let app = app_with(
        MockSource::empty(),
        MockClassifier::default(),
        MockSummarizer::default(),
    );
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn analyze_returns_scored_shape() {
    let source = MockSource::with_comments(vec![
        raw("great battery"),
        raw("too expensive"),
    ]);
    let classifier = MockClassifier::with_payload(
        r#"{"great battery": [5, -1, -1, 4, 5], "too expensive": [-1, 1, -1, 2, 4]}"#,
    );
    let app = app_with(source, classifier, MockSummarizer::default());

    let (status, body) = post_analyze(&app, json!({"keyword": "phone"})).await;
    assert_eq!(status, StatusCode::OK);

    assert!(body["final_rating"].as_f64().unwrap() > 0.0);
    assert_eq!(body["subscores"].as_array().unwrap().len(), 4);
    assert_eq!(body["ai_summary"], "Buyers mostly like it.");
    assert_eq!(body["is_not_product"], false);

    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    // Each entry is a [text, url] pair.
    assert_eq!(comments[0].as_array().unwrap().len(), 2);
    assert_eq!(body["similar_products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn analyze_caps_comments_at_five() {
    let comments: Vec<RawComment> = (0..9).map(|i| raw(&format!("comment {i}"))).collect();
    // Index-keyed ratings for all nine.
    let payload: Value = (0..9)
        .map(|i| (i.to_string(), json!([3, 3, 3, 3, 3])))
        .collect::<serde_json::Map<_, _>>()
        .into();
    let app = app_with(
        MockSource::with_comments(comments),
        MockClassifier::with_payload(payload.to_string()),
        MockSummarizer::default(),
    );

    let (status, body) = post_analyze(&app, json!({"keyword": "phone"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn no_data_keeps_zeroed_scores_and_flag_false() {
    let app = app_with(
        MockSource::empty(),
        MockClassifier::default(),
        MockSummarizer::with_description("A solid niche product."),
    );

    let (status, body) = post_analyze(&app, json!({"keyword": "obscure gadget"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_rating"], 0.0);
    assert_eq!(body["subscores"], json!([0.0, 0.0, 0.0, 0.0]));
    assert_eq!(body["comments"], json!([]));
    assert_eq!(body["ai_summary"], "A solid niche product.");
    assert_eq!(body["is_not_product"], false);
}

#[tokio::test]
async fn not_a_product_sets_the_flag() {
    let app = app_with(
        MockSource::empty(),
        MockClassifier::default(),
        MockSummarizer::with_description("NOT_A_PRODUCT"),
    );

    let (status, body) = post_analyze(&app, json!({"keyword": "friendship"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_not_product"], true);
    assert_eq!(body["final_rating"], 0.0);
    assert!(body["ai_summary"].as_str().unwrap().contains("friendship"));
}

#[tokio::test]
async fn blank_keyword_is_rejected() {
    let app = app_with(
        MockSource::empty(),
        MockClassifier::default(),
        MockSummarizer::default(),
    );
    let (status, _) = post_analyze(&app, json!({"keyword": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
