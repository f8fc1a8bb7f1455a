//! Pipeline item states using the typestate pattern.
//!
//! Each content item progresses through distinct states, enforced at compile
//! time. The generic parameter `T` on [`Item`] represents the current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::content::{
    ContentOrigin, ContentRequest, DeliveryOutcome, GeneratedContent, HistoryRecord,
};

/// Marker trait for valid pipeline item states.
pub trait ItemState: Send + Sync {}

/// A content item moving through the pipeline.
///
/// Uses the typestate pattern to ensure type-safe state transitions: an
/// `Item<Producing>` can only be produced or fall back, an `Item<Drafted>`
/// can only be delivered, and so on.
#[derive(Debug, Clone, Serialize)]
pub struct Item<T: ItemState> {
    /// The current state of the item.
    pub state: T,
    /// The immutable request the item was created from.
    pub request: ContentRequest,
}

// ============================================================================
// Item States
// ============================================================================

/// Content is being produced. Initial state for every submitted request.
#[derive(Debug, Clone, Serialize)]
pub struct Producing {
    pub started_at: DateTime<Utc>,
}

impl ItemState for Producing {}

/// Content text exists, from the LLM or the fallback composer.
#[derive(Debug, Clone, Serialize)]
pub struct Drafted {
    pub text: String,
    pub origin: ContentOrigin,
    pub produced_at: DateTime<Utc>,
}

impl ItemState for Drafted {}

/// Delivery was attempted; the outcome (success or failure) is embedded.
#[derive(Debug, Clone, Serialize)]
pub struct Delivered {
    pub text: String,
    pub origin: ContentOrigin,
    pub produced_at: DateTime<Utc>,
    pub outcome: DeliveryOutcome,
}

impl ItemState for Delivered {}

/// The history record reached durable storage. Terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct Done {
    pub record: HistoryRecord,
}

impl ItemState for Done {}

/// The history append failed. Terminal state; the record survives in the
/// batch report so the failure stays visible.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailed {
    pub record: HistoryRecord,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl ItemState for RecordFailed {}

impl Item<Drafted> {
    /// Assemble the produced content together with its source request.
    pub fn content(&self) -> GeneratedContent {
        GeneratedContent {
            request: self.request.clone(),
            text: self.state.text.clone(),
            origin: self.state.origin,
            produced_at: self.state.produced_at,
        }
    }
}

impl Item<Delivered> {
    pub fn content(&self) -> GeneratedContent {
        GeneratedContent {
            request: self.request.clone(),
            text: self.state.text.clone(),
            origin: self.state.origin,
            produced_at: self.state.produced_at,
        }
    }
}

// ============================================================================
// Failure classification
// ============================================================================

/// Reason why content generation failed.
///
/// Every variant routes to the fallback composer; the distinction exists for
/// logs and metrics, not for retry policy (there is none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum GenerationFailure {
    /// Network error, timeout, or other transport-level failure.
    Transport { error: String },

    /// The generation service returned an error status code.
    HttpStatus { status: u16, body: String },

    /// The service responded but the completion text was empty.
    EmptyCompletion,

    /// The response body did not parse as a chat completion.
    MalformedCompletion { error: String },

    /// The request violated its input constraints before any call was made.
    InvalidRequest { detail: String },
}

impl GenerationFailure {
    /// Returns a human-readable error message for this failure.
    pub fn to_error_message(&self) -> String {
        match self {
            GenerationFailure::Transport { error } => {
                format!("Generation transport error: {}", error)
            }
            GenerationFailure::HttpStatus { status, body } => {
                format!("Generation service returned status {}: {}", status, body)
            }
            GenerationFailure::EmptyCompletion => {
                "Generation service returned an empty completion".to_string()
            }
            GenerationFailure::MalformedCompletion { error } => {
                format!("Generation response was malformed: {}", error)
            }
            GenerationFailure::InvalidRequest { detail } => {
                format!("Invalid content request: {}", detail)
            }
        }
    }
}

/// Result of attempting to produce content for an item.
///
/// On failure the item is handed back unchanged so the orchestrator can
/// route it to the fallback composer.
#[derive(Debug)]
pub enum ProduceResult {
    /// The LLM produced content.
    Drafted(Item<Drafted>),
    /// Generation failed; the item is still in `Producing`.
    Failed {
        item: Item<Producing>,
        reason: GenerationFailure,
    },
}
