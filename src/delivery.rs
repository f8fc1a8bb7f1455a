//! Delivery channels for generated content.
//!
//! A deliverer pushes content to an external channel and reports the outcome
//! as data. Nothing a channel does can raise past this boundary: transport,
//! auth, and rate-limit errors all become a failed [`DeliveryOutcome`], so
//! the recorder downstream always runs. Deliverers are not idempotent and
//! are never retried by the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::config::FeedConfig;
use crate::domain::content::{DeliveryOutcome, GeneratedContent};
use crate::http::{HttpClient, OutboundRequest};

/// Trait for pushing content to an external channel.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Attempt delivery. Always returns an outcome, never an error.
    async fn deliver(&self, content: &GeneratedContent) -> DeliveryOutcome;
}

// ============================================================================
// Social feed channel
// ============================================================================

/// Delivers content as a post to a social feed API.
pub struct FeedDeliverer<H: HttpClient> {
    http: Arc<H>,
    config: FeedConfig,
}

impl<H: HttpClient> FeedDeliverer<H> {
    pub fn new(http: Arc<H>, config: FeedConfig) -> Self {
        Self { http, config }
    }
}

/// Response shape of the feed post endpoint. The id is opaque to the
/// pipeline; anything unparseable is simply recorded without a channel ref.
#[derive(Deserialize)]
struct FeedPostResponse {
    data: Option<FeedPostData>,
}

#[derive(Deserialize)]
struct FeedPostData {
    id: Option<String>,
}

#[async_trait]
impl<H: HttpClient> Deliverer for FeedDeliverer<H> {
    #[tracing::instrument(skip(self, content), fields(item_id = %content.request.id))]
    async fn deliver(&self, content: &GeneratedContent) -> DeliveryOutcome {
        let body = serde_json::json!({ "text": content.text }).to_string();
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
                tracing::warn!(error = %e, "Feed post failed");
                return DeliveryOutcome::failure(e.to_string());
            }
        };

        if response.status >= 400 {
            tracing::warn!(status = response.status, "Feed rejected the post");
            return DeliveryOutcome::failure(format!(
                "feed returned status {}: {}",
                response.status, response.body
            ));
        }

        let channel_ref = serde_json::from_str::<FeedPostResponse>(&response.body)
            .ok()
            .and_then(|parsed| parsed.data)
            .and_then(|data| data.id);

        tracing::info!(channel_ref = channel_ref.as_deref().unwrap_or("-"), "Posted to feed");
        DeliveryOutcome::success(channel_ref)
    }
}

// ============================================================================
// Letter file channel
// ============================================================================

/// Delivers content by writing a letter file under the output directory.
///
/// File names follow `letter_{audience_slug}_{timestamp}.txt`.
pub struct LetterDeliverer {
    output_dir: PathBuf,
}

impl LetterDeliverer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl Deliverer for LetterDeliverer {
    #[tracing::instrument(skip(self, content), fields(item_id = %content.request.id))]
    async fn deliver(&self, content: &GeneratedContent) -> DeliveryOutcome {
        let filename = format!(
            "letter_{}_{}.txt",
            audience_slug(&content.request.audience.name),
            Utc::now().format("%Y%m%d_%H%M%S"),
        );
        let path = self.output_dir.join(filename);

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            tracing::warn!(error = %e, "Could not create output directory");
            return DeliveryOutcome::failure(format!(
                "creating {} failed: {}",
                self.output_dir.display(),
                e
            ));
        }

        match tokio::fs::write(&path, content.text.as_bytes()).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Wrote letter");
                DeliveryOutcome::success(Some(path.display().to_string()))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Letter write failed");
                DeliveryOutcome::failure(format!("writing {} failed: {}", path.display(), e))
            }
        }
    }
}

/// Lowercase the audience name and collapse non-alphanumerics to underscores.
fn audience_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !slug.is_empty() {
            slug.push('_');
            last_was_sep = true;
        }
    }
    if slug.ends_with('_') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{ContentKind, ContentOrigin, ContentRequest};
    use crate::domain::profile::{AudienceProfile, SubjectData};
    use crate::http::{HttpResponse, MockHttpClient};

    fn content(text: &str) -> GeneratedContent {
        GeneratedContent {
            request: ContentRequest::new(
                ContentKind::Letter,
                SubjectData::new().with("severity", "Poor"),
                AudienceProfile {
                    name: "Ocean Policy Institute".to_string(),
                    audience: "Policy Makers".to_string(),
                    tone: "formal".to_string(),
                    focus_areas: vec![],
                    call_to_action: "act".to_string(),
                    contact: None,
                },
            ),
            text: text.to_string(),
            origin: ContentOrigin::Llm,
            produced_at: Utc::now(),
        }
    }

    #[test]
    fn test_audience_slug() {
        assert_eq!(audience_slug("Ocean Policy Institute"), "ocean_policy_institute");
        assert_eq!(audience_slug("  Coastal -- Alliance! "), "coastal_alliance");
    }

    #[tokio::test]
    async fn test_letter_deliverer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let deliverer = LetterDeliverer::new(dir.path().to_path_buf());

        let outcome = deliverer.deliver(&content("Dear Policy Makers, ...")).await;

        assert!(outcome.succeeded);
        let path = outcome.channel_ref.expect("channel ref is the file path");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Dear Policy Makers, ...");
        assert!(path.contains("letter_ocean_policy_institute_"));
    }

    #[tokio::test]
    async fn test_feed_deliverer_parses_post_id() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "POST /2/tweets",
            Ok(HttpResponse {
                status: 201,
                body: r#"{"data":{"id":"1850","text":"..."}}"#.to_string(),
            }),
        );

        let deliverer = FeedDeliverer::new(Arc::new(mock.clone()), FeedConfig::default());
        let outcome = deliverer.deliver(&content("The ocean speaks.")).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.channel_ref.as_deref(), Some("1850"));

        let calls = mock.get_calls();
        assert!(calls[0].body.contains("The ocean speaks."));
    }

    #[tokio::test]
    async fn test_feed_deliverer_converts_auth_error_to_outcome() {
        let mock = MockHttpClient::new();
        mock.add_response(
            "POST /2/tweets",
            Ok(HttpResponse {
                status: 401,
                body: "unauthorized".to_string(),
            }),
        );

        let deliverer = FeedDeliverer::new(Arc::new(mock), FeedConfig::default());
        let outcome = deliverer.deliver(&content("The ocean speaks.")).await;

        assert!(!outcome.succeeded);
        let detail = outcome.error_detail.unwrap();
        assert!(detail.contains("401"));
    }

    #[tokio::test]
    async fn test_feed_deliverer_converts_transport_error_to_outcome() {
        // No response configured: the mock client errors
        let deliverer = FeedDeliverer::new(Arc::new(MockHttpClient::new()), FeedConfig::default());
        let outcome = deliverer.deliver(&content("The ocean speaks.")).await;

        assert!(!outcome.succeeded);
        assert!(outcome.error_detail.is_some());
    }
}
