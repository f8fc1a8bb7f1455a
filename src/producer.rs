//! Content producer backed by an LLM chat-completions service.
//!
//! The producer builds a deterministic prompt from the request, makes one
//! synchronous call through the [`HttpClient`] abstraction, and maps the
//! completion into [`GeneratedContent`]. It never retries and never falls
//! back; failures are classified and handed to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::domain::content::{ContentKind, ContentOrigin, ContentRequest, GeneratedContent};
use crate::domain::item::GenerationFailure;
use crate::http::{HttpClient, OutboundRequest};

/// Trait for producing content from a request.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Produce content for a request, or classify why that was impossible.
    ///
    /// No side effects beyond the outbound call; no local state mutation.
    async fn produce(
        &self,
        request: &ContentRequest,
    ) -> std::result::Result<GeneratedContent, GenerationFailure>;
}

/// Producer that calls an OpenAI-compatible chat-completions endpoint.
pub struct LlmProducer<H: HttpClient> {
    http: Arc<H>,
    config: GenerationConfig,
}

impl<H: HttpClient> LlmProducer<H> {
    pub fn new(http: Arc<H>, config: GenerationConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl<H: HttpClient> Producer for LlmProducer<H> {
    #[tracing::instrument(skip(self, request), fields(item_id = %request.id, kind = %request.kind, audience = %request.audience.name))]
    async fn produce(
        &self,
        request: &ContentRequest,
    ) -> std::result::Result<GeneratedContent, GenerationFailure> {
        if let Err(e) = request.validate() {
            return Err(GenerationFailure::InvalidRequest {
                detail: e.to_string(),
            });
        }

        let messages = chat_messages(request);
        let payload = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
        };
        let body = serde_json::to_string(&payload).map_err(|e| {
            GenerationFailure::InvalidRequest {
                detail: format!("payload serialization failed: {}", e),
            }
        })?;

        let outbound = OutboundRequest {
            endpoint: self.config.endpoint.clone(),
            method: "POST".to_string(),
            path: self.config.path.clone(),
            body,
        };

        let response = match self
            .http
            .execute(&outbound, &self.config.api_key, self.config.timeout_ms)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Err(GenerationFailure::Transport {
                    error: e.to_string(),
                })
            }
        };

        if response.status >= 400 {
            return Err(GenerationFailure::HttpStatus {
                status: response.status,
                body: response.body,
            });
        }

        let completion: ChatCompletion = serde_json::from_str(&response.body).map_err(|e| {
            GenerationFailure::MalformedCompletion {
                error: e.to_string(),
            }
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationFailure::EmptyCompletion);
        }

        tracing::info!(text_len = text.len(), "Generated content");

        Ok(GeneratedContent {
            request: request.clone(),
            text,
            origin: ContentOrigin::Llm,
            produced_at: Utc::now(),
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatTurn,
}

#[derive(Deserialize)]
struct ChatTurn {
    content: Option<String>,
}

// ============================================================================
// Prompts
// ============================================================================

const LETTER_SYSTEM_PROMPT: &str =
    "You are an expert marine conservation advocate and professional letter writer.";

fn chat_messages(request: &ContentRequest) -> Vec<ChatMessage> {
    match request.kind {
        ContentKind::Post => vec![ChatMessage {
            role: "user",
            content: post_prompt(request),
        }],
        ContentKind::Letter => vec![
            ChatMessage {
                role: "system",
                content: LETTER_SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: letter_prompt(request),
            },
        ],
    }
}

fn post_prompt(request: &ContentRequest) -> String {
    format!(
        "You are the ocean and you have to write a short post about your current condition, \
         based on satellite imagery and data analyzed by a machine learning model. \
         Only write the post, speaking as the ocean, and nothing else. Use hashtags if needed.\n\
         Data: {}",
        request.subject.summary()
    )
}

fn letter_prompt(request: &ContentRequest) -> String {
    let org = &request.audience;
    let subject = &request.subject;
    format!(
        "Write a professional advocacy letter for marine conservation from {name} to {audience}. \
         Do not use any personal names or positions.\n\n\
         CURRENT MARINE HEALTH DATA:\n\
         - Index: {index}/100\n\
         - Status: {severity}\n\
         - Region: {region}\n\
         - Urgency Level: {urgency}\n\
         - Recent Changes: {changes}\n\
         - Key Issues: {issues}\n\n\
         ORGANIZATION PROFILE:\n\
         - Name: {name}\n\
         - Target Audience: {audience}\n\
         - Tone: {tone}\n\
         - Focus Areas: {focus}\n\
         - Main Call to Action: {cta}\n\n\
         Make it compelling, data-driven, professional, 400-600 words.",
        name = org.name,
        audience = org.audience,
        index = subject.get_or("index", "n/a"),
        severity = subject.get_or("severity", "unknown"),
        region = subject.get_or("region", "our waters"),
        urgency = subject.get_or("urgency", "ASSESSMENT PENDING"),
        changes = subject.get_or("recent_changes", "no recent change data"),
        issues = subject.get_or("issues", "no issue data available"),
        tone = org.tone,
        focus = org.focus_areas.join(", "),
        cta = org.call_to_action,
    )
}
