//! Sequential pipeline orchestration.
//!
//! The orchestrator runs the item state machine once per content request, in
//! declared order, and aggregates every terminal item into one
//! [`BatchReport`]. Failures are isolated per item: a generation failure
//! falls back, a delivery failure is recorded, and a persistence failure is
//! flagged in the report — nothing aborts the remaining items.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use crate::domain::content::{BatchEntry, BatchReport, ContentRequest, RunId};
use crate::domain::item::{Item, ProduceResult};
use crate::delivery::Deliverer;
use crate::fallback::FallbackComposer;
use crate::history::HistoryStore;
use crate::producer::Producer;

/// Runs the generation → delivery → record pipeline over a batch of
/// requests.
pub struct Orchestrator<P: ?Sized, D: ?Sized, S: ?Sized> {
    producer: Arc<P>,
    deliverer: Arc<D>,
    store: Arc<S>,
    composer: FallbackComposer,
}

impl<P, D, S> Orchestrator<P, D, S>
where
    P: Producer + ?Sized,
    D: Deliverer + ?Sized,
    S: HistoryStore + ?Sized,
{
    pub fn new(producer: Arc<P>, deliverer: Arc<D>, store: Arc<S>) -> Self {
        Self {
            producer,
            deliverer,
            store,
            composer: FallbackComposer,
        }
    }

    /// Run every request to a terminal state, sequentially, and aggregate
    /// the results.
    ///
    /// Always yields a report with exactly one entry per submitted request.
    pub async fn run(&self, requests: Vec<ContentRequest>) -> BatchReport {
        let run_id = RunId::from(Uuid::new_v4());
        tracing::info!(run_id = %run_id, items = requests.len(), "Starting orchestration run");

        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            entries.push(self.run_item(run_id, request).await);
        }

        let report = BatchReport {
            run_id,
            generated_at: Utc::now(),
            entries,
        };

        tracing::info!(
            run_id = %run_id,
            items = report.len(),
            fallbacks = report.fallback_count(),
            delivered = report.delivered_count(),
            record_failures = report.persistence_failure_count(),
            "Orchestration run finished"
        );

        report
    }

    /// Drive one item through the state machine to a terminal state.
    #[tracing::instrument(skip(self, request), fields(run_id = %run_id, item_id = %request.id, audience = %request.audience.name))]
    async fn run_item(&self, run_id: RunId, request: ContentRequest) -> BatchEntry {
        let item = Item::new(request);

        let drafted = match item.produce(self.producer.as_ref()).await {
            ProduceResult::Drafted(item) => item,
            ProduceResult::Failed { item, reason } => {
                tracing::warn!(
                    reason = %reason.to_error_message(),
                    "Generation failed, composing fallback content"
                );
                item.fall_back(&self.composer)
            }
        };

        let delivered = drafted.deliver(self.deliverer.as_ref()).await;
        if !delivered.state.outcome.succeeded {
            tracing::warn!(
                error = delivered.state.outcome.error_detail.as_deref().unwrap_or("unknown"),
                "Delivery failed, recording the outcome anyway"
            );
        }

        match delivered.record(self.store.as_ref(), run_id).await {
            Ok(done) => {
                counter!(
                    "tidecast_items_total",
                    "origin" => done.state.record.content.origin.as_str(),
                    "status" => "done"
                )
                .increment(1);
                BatchEntry {
                    record: done.state.record,
                    persisted: true,
                    persistence_error: None,
                }
            }
            Err(failed) => {
                let failed = *failed;
                counter!(
                    "tidecast_items_total",
                    "origin" => failed.state.record.content.origin.as_str(),
                    "status" => "record_failed"
                )
                .increment(1);
                tracing::error!(
                    error = %failed.state.error,
                    "History append failed; record survives in the batch report only"
                );
                BatchEntry {
                    record: failed.state.record,
                    persisted: false,
                    persistence_error: Some(failed.state.error),
                }
            }
        }
    }
}
