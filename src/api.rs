// src/api.rs
//! HTTP surface: one analyze endpoint plus a health check. The wire shape
//! matches what the frontend expects; "no data" and "not a product" are
//! flagged explicitly, never signalled by status code.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::PUBLIC_METRIC_COUNT;
use crate::orchestrator::{FetchOrchestrator, Outcome};

/// How many ranked comments the response carries.
const RESPONSE_COMMENT_CAP: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FetchOrchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    keyword: String,
}

#[derive(serde::Serialize)]
struct AnalyzeResp {
    final_rating: f64,
    /// quality, cost, availability, utility
    subscores: [f64; PUBLIC_METRIC_COUNT],
    ai_summary: String,
    /// `[[text, url], ...]`, top-ranked first.
    comments: Vec<(String, String)>,
    pros: Vec<(String, String)>,
    cons: Vec<(String, String)>,
    similar_products: Vec<String>,
    is_not_product: bool,
}

impl From<Outcome> for AnalyzeResp {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Scored {
                mut ranked_comments,
                final_score,
                final_metrics,
                summary,
                pros,
                cons,
                similar_products,
            } => {
                ranked_comments.truncate(RESPONSE_COMMENT_CAP);
                Self {
                    final_rating: final_score,
                    subscores: final_metrics,
                    ai_summary: summary,
                    comments: ranked_comments,
                    pros,
                    cons,
                    similar_products,
                    is_not_product: false,
                }
            }
            Outcome::NoData {
                summary,
                similar_products,
            } => Self {
                final_rating: 0.0,
                subscores: [0.0; PUBLIC_METRIC_COUNT],
                ai_summary: summary,
                comments: Vec::new(),
                pros: Vec::new(),
                cons: Vec::new(),
                similar_products,
                is_not_product: false,
            },
            Outcome::NotAProduct { message } => Self {
                final_rating: 0.0,
                subscores: [0.0; PUBLIC_METRIC_COUNT],
                ai_summary: message,
                comments: Vec::new(),
                pros: Vec::new(),
                cons: Vec::new(),
                similar_products: Vec::new(),
                is_not_product: true,
            },
        }
    }
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<AnalyzeResp>, (StatusCode, &'static str)> {
    let keyword = body.keyword.trim();
    if keyword.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "keyword must not be empty"));
    }
    let outcome = state.orchestrator.analyze(keyword).await;
    Ok(Json(outcome.into()))
}
