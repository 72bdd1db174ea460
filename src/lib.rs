// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analyze;
pub mod api;
pub mod cache;
pub mod collab;
pub mod config;
pub mod orchestrator;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::cache::ResultCache;
pub use crate::orchestrator::{FetchOrchestrator, Outcome};
