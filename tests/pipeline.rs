//! End-to-end pipeline tests with a mock HTTP client and temp storage.

use std::sync::Arc;

use async_trait::async_trait;

use tidecast::config::{self, FeedConfig, GenerationConfig};
use tidecast::delivery::{FeedDeliverer, LetterDeliverer};
use tidecast::history::{HistoryStore, SqliteHistoryStore};
use tidecast::producer::LlmProducer;
use tidecast::{
    AudienceProfile, ContentKind, ContentOrigin, ContentRequest, HistoryRecord, HttpResponse,
    MockHttpClient, Orchestrator, SubjectData, TidecastError,
};

fn subject() -> SubjectData {
    SubjectData::new()
        .with("severity", "high")
        .with("region", "Pacific")
}

fn policy_profile() -> AudienceProfile {
    AudienceProfile {
        name: "Policy".to_string(),
        audience: "Policy Makers".to_string(),
        tone: "formal".to_string(),
        focus_areas: vec!["policy reform".to_string()],
        call_to_action: "act now".to_string(),
        contact: None,
    }
}

fn completion_body(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
    .to_string()
}

fn producer(mock: &MockHttpClient) -> Arc<LlmProducer<MockHttpClient>> {
    Arc::new(LlmProducer::new(
        Arc::new(mock.clone()),
        GenerationConfig::default(),
    ))
}

async fn history_rows(store: &SqliteHistoryStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM history")
        .fetch_one(store.pool())
        .await
        .expect("count query")
}

/// A history store that fails for one specific audience, for injecting
/// persistence failures.
struct FailingStore<S> {
    inner: S,
    fail_for_audience: String,
}

#[async_trait]
impl<S: HistoryStore> HistoryStore for FailingStore<S> {
    async fn append(&self, record: &HistoryRecord) -> tidecast::Result<()> {
        if record.content.request.audience.name == self.fail_for_audience {
            return Err(TidecastError::Other(anyhow::anyhow!(
                "history storage unavailable"
            )));
        }
        self.inner.append(record).await
    }
}

#[test_log::test(tokio::test)]
async fn test_generated_post_is_delivered_and_recorded() {
    let mock = MockHttpClient::new();
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: completion_body("The ocean speaks."),
        }),
    );
    mock.add_response(
        "POST /2/tweets",
        Ok(HttpResponse {
            status: 201,
            body: r#"{"data":{"id":"1850","text":"The ocean speaks."}}"#.to_string(),
        }),
    );

    let store = Arc::new(SqliteHistoryStore::in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(
        producer(&mock),
        Arc::new(FeedDeliverer::new(Arc::new(mock.clone()), FeedConfig::default())),
        store.clone(),
    );

    let request = ContentRequest::new(ContentKind::Post, subject(), policy_profile());
    let report = orchestrator.run(vec![request]).await;

    assert_eq!(report.len(), 1);
    let entry = &report.entries[0];
    assert_eq!(entry.record.content.text, "The ocean speaks.");
    assert_eq!(entry.record.content.origin, ContentOrigin::Llm);
    assert!(entry.record.outcome.succeeded);
    assert_eq!(entry.record.outcome.channel_ref.as_deref(), Some("1850"));
    assert!(entry.persisted);

    // One generation call, one delivery call
    assert_eq!(mock.call_count(), 2);
    assert_eq!(history_rows(&store).await, 1);
}

#[test_log::test(tokio::test)]
async fn test_generation_failure_falls_back_deterministically() {
    // No generation response configured: the call fails at the transport level
    let mock = MockHttpClient::new();

    let output = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteHistoryStore::in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(
        producer(&mock),
        Arc::new(LetterDeliverer::new(output.path().to_path_buf())),
        store.clone(),
    );

    let request = ContentRequest::new(ContentKind::Letter, subject(), policy_profile());
    let report = orchestrator.run(vec![request]).await;

    assert_eq!(report.len(), 1);
    let entry = &report.entries[0];
    assert_eq!(entry.record.content.origin, ContentOrigin::Fallback);
    assert!(entry.record.content.text.contains("Policy"));
    // The fallback letter still got delivered and recorded
    assert!(entry.record.outcome.succeeded);
    assert!(entry.persisted);
    assert_eq!(history_rows(&store).await, 1);

    // Same input composes byte-identical text
    let again = tidecast::FallbackComposer.compose(&entry.record.content.request);
    assert_eq!(again.text, entry.record.content.text);
}

#[test_log::test(tokio::test)]
async fn test_delivery_rejection_is_recorded_and_run_continues() {
    let mock = MockHttpClient::new();
    // Generation succeeds for both items
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: completion_body("First post."),
        }),
    );
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: completion_body("Second post."),
        }),
    );
    // The feed rejects the first post with an auth error, accepts the second
    mock.add_response(
        "POST /2/tweets",
        Ok(HttpResponse {
            status: 401,
            body: "unauthorized".to_string(),
        }),
    );
    mock.add_response(
        "POST /2/tweets",
        Ok(HttpResponse {
            status: 201,
            body: r#"{"data":{"id":"1851"}}"#.to_string(),
        }),
    );

    let store = Arc::new(SqliteHistoryStore::in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(
        producer(&mock),
        Arc::new(FeedDeliverer::new(Arc::new(mock.clone()), FeedConfig::default())),
        store.clone(),
    );

    let requests = vec![
        ContentRequest::new(ContentKind::Post, subject(), policy_profile()),
        ContentRequest::new(ContentKind::Post, subject(), policy_profile()),
    ];
    let report = orchestrator.run(requests).await;

    assert_eq!(report.len(), 2);

    let first = &report.entries[0];
    assert!(!first.record.outcome.succeeded);
    let detail = first.record.outcome.error_detail.as_deref().unwrap();
    assert!(!detail.is_empty());
    assert!(detail.contains("401"));
    assert!(first.persisted, "failed delivery must still be recorded");

    let second = &report.entries[1];
    assert!(second.record.outcome.succeeded);
    assert!(second.persisted);

    // Both records reached storage despite the failed delivery
    assert_eq!(history_rows(&store).await, 2);
    assert_eq!(report.delivered_count(), 1);
}

#[test_log::test(tokio::test)]
async fn test_persistence_failure_is_isolated_per_item() {
    let mock = MockHttpClient::new();
    for text in ["Letter one.", "Letter two.", "Letter three."] {
        mock.add_response(
            "POST /chat/completions",
            Ok(HttpResponse {
                status: 200,
                body: completion_body(text),
            }),
        );
    }

    let profiles = config::letter_profiles();
    assert_eq!(profiles.len(), 3);
    let failing_audience = profiles[1].name.clone();

    let output = tempfile::tempdir().unwrap();
    let sqlite = SqliteHistoryStore::in_memory().await.unwrap();
    let pool = sqlite.pool().clone();
    let store = Arc::new(FailingStore {
        inner: sqlite,
        fail_for_audience: failing_audience.clone(),
    });

    let orchestrator = Orchestrator::new(
        producer(&mock),
        Arc::new(LetterDeliverer::new(output.path().to_path_buf())),
        store,
    );

    let reading_subject = subject();
    let requests: Vec<ContentRequest> = profiles
        .into_iter()
        .map(|p| ContentRequest::new(ContentKind::Letter, reading_subject.clone(), p))
        .collect();

    let report = orchestrator.run(requests).await;

    // One entry per request, exactly one persistence failure
    assert_eq!(report.len(), 3);
    assert_eq!(report.persistence_failure_count(), 1);

    let failed: Vec<_> = report.entries.iter().filter(|e| !e.persisted).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(
        failed[0].record.content.request.audience.name,
        failing_audience
    );
    assert!(failed[0].persistence_error.is_some());

    // The other two rows made it to storage
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[test_log::test(tokio::test)]
async fn test_every_request_yields_exactly_one_record() {
    let mock = MockHttpClient::new();
    // Four generation outcomes: success, server error, empty completion,
    // malformed body. Only the first avoids the fallback.
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: completion_body("A healthy reading."),
        }),
    );
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 503,
            body: "overloaded".to_string(),
        }),
    );
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: completion_body(""),
        }),
    );
    mock.add_response(
        "POST /chat/completions",
        Ok(HttpResponse {
            status: 200,
            body: "not json".to_string(),
        }),
    );

    let output = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteHistoryStore::in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(
        producer(&mock),
        Arc::new(LetterDeliverer::new(output.path().to_path_buf())),
        store.clone(),
    );

    let requests: Vec<ContentRequest> = (0..4)
        .map(|_| ContentRequest::new(ContentKind::Letter, subject(), policy_profile()))
        .collect();
    let ids: Vec<_> = requests.iter().map(|r| r.id).collect();

    let report = orchestrator.run(requests).await;

    // No item dropped, none duplicated
    assert_eq!(report.len(), 4);
    let reported: Vec<_> = report
        .entries
        .iter()
        .map(|e| e.record.content.request.id)
        .collect();
    assert_eq!(reported, ids);

    assert_eq!(report.fallback_count(), 3);
    assert_eq!(history_rows(&store).await, 4);
}
