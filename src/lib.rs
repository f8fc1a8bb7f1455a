//! Content pipeline for ocean-advocacy posts and letters.
//!
//! This crate drafts short-form content (social-feed posts, advocacy
//! letters) from structured marine-health data via an LLM call, attempts
//! delivery through an external channel, and appends an auditable history
//! record for every item. When generation fails, a deterministic fallback
//! template guarantees the pipeline still produces content; when delivery
//! fails, the outcome is recorded rather than raised. One batch report is
//! written per orchestration run.

pub mod config;
pub mod delivery;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod history;
pub mod http;
pub mod orchestrator;
pub mod producer;
pub mod sources;

// Re-export commonly used types
pub use domain::content::{
    BatchEntry, BatchReport, ContentKind, ContentOrigin, ContentRequest, DeliveryOutcome,
    GeneratedContent, HistoryRecord, ItemId, RunId,
};
pub use domain::profile::{AudienceProfile, SeverityLevel, SubjectData};
pub use error::{Result, TidecastError};
pub use fallback::FallbackComposer;
pub use http::{HttpClient, HttpResponse, MockHttpClient, OutboundRequest, ReqwestHttpClient};
pub use orchestrator::Orchestrator;

/// Get the tidecast history migrator
///
/// Returns a migrator that can be run against a connection pool.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
