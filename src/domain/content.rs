//! Content requests, generated content, delivery outcomes, and audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TidecastError};

use super::profile::{AudienceProfile, SubjectData};

/// Unique identifier for a content item in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for ItemId {
    fn from(uuid: Uuid) -> Self {
        ItemId(uuid)
    }
}

impl std::ops::Deref for ItemId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Unique identifier for one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        RunId(uuid)
    }
}

impl std::ops::Deref for RunId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The kind of content a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Short social-feed post
    Post,
    /// Long-form advocacy letter
    Letter,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Letter => "letter",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a piece of content was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentOrigin {
    /// Generated by the external LLM service
    Llm,
    /// Composed from the deterministic fallback template
    Fallback,
}

impl ContentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentOrigin::Llm => "llm",
            ContentOrigin::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ContentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of work for the pipeline: subject data plus the audience it is
/// written for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub id: ItemId,
    pub kind: ContentKind,
    pub subject: SubjectData,
    pub audience: AudienceProfile,
}

impl ContentRequest {
    pub fn new(kind: ContentKind, subject: SubjectData, audience: AudienceProfile) -> Self {
        Self {
            id: ItemId::from(Uuid::new_v4()),
            kind,
            subject,
            audience,
        }
    }

    /// Check the request's input constraints: non-empty subject data and a
    /// specified tone. Focus areas may be empty but are always present by
    /// construction.
    pub fn validate(&self) -> Result<()> {
        if self.subject.is_empty() {
            return Err(TidecastError::Validation(
                "subject data must be non-empty".to_string(),
            ));
        }
        if self.audience.tone.trim().is_empty() {
            return Err(TidecastError::Validation(format!(
                "audience profile '{}' does not specify a tone",
                self.audience.name
            )));
        }
        Ok(())
    }
}

/// Text produced for a request, by the LLM or the fallback composer.
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// The request this content was produced for
    pub request: ContentRequest,
    pub text: String,
    pub origin: ContentOrigin,
    pub produced_at: DateTime<Utc>,
}

/// Result of one delivery attempt. Delivery failure is data, not an error:
/// the recorder still runs on failed outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub succeeded: bool,
    /// Opaque identifier from the channel (post id, file path)
    pub channel_ref: Option<String>,
    pub error_detail: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DeliveryOutcome {
    pub fn success(channel_ref: Option<String>) -> Self {
        Self {
            succeeded: true,
            channel_ref,
            error_detail: None,
            attempted_at: Utc::now(),
        }
    }

    pub fn failure(error_detail: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            channel_ref: None,
            error_detail: Some(error_detail.into()),
            attempted_at: Utc::now(),
        }
    }
}

/// Append-only audit entry capturing one content item's full lifecycle
/// outcome. One per request; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub run_id: RunId,
    pub content: GeneratedContent,
    pub outcome: DeliveryOutcome,
    pub data_summary: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(run_id: RunId, content: GeneratedContent, outcome: DeliveryOutcome) -> Self {
        let data_summary = content.request.subject.summary();
        Self {
            run_id,
            content,
            outcome,
            data_summary,
            recorded_at: Utc::now(),
        }
    }
}

/// One entry in a batch report: the record plus whether it reached durable
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub record: HistoryRecord,
    pub persisted: bool,
    pub persistence_error: Option<String>,
}

/// Aggregate artifact for one orchestration run. Write-once: built after the
/// last item reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items that used fallback content.
    pub fn fallback_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.record.content.origin == ContentOrigin::Fallback)
            .count()
    }

    /// Number of items whose delivery succeeded.
    pub fn delivered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.record.outcome.succeeded)
            .count()
    }

    /// Number of items whose history append failed.
    pub fn persistence_failure_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.persisted).count()
    }
}
