//! Error types for the mindpace engine

use thiserror::Error;

/// Errors reported at the engine boundary.
///
/// The core scoring and extraction functions are total and never fail; these
/// variants cover JSON ingestion, request validation, and registry lookups,
/// plus the kinds boundary collaborators translate their own faults into.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dependency unavailable: {0}")]
    UnavailableDependency(String),
}
