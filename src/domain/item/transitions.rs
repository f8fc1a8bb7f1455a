//! State transitions for pipeline items using the typestate pattern.
//!
//! Transitions consume the item and return it in its next state:
//!
//! ```text
//! Item<Producing> ──produce()───> Item<Drafted>   (origin: Llm)
//!       │
//!       └──fall_back()──> Item<Drafted>           (origin: Fallback, infallible)
//!
//! Item<Drafted> ──deliver()──> Item<Delivered>    (outcome embedded, never an error)
//!
//! Item<Delivered> ──record()──> Item<Done>
//!                 ──record()──> Item<RecordFailed>
//! ```
//!
//! `Done` and `RecordFailed` are terminal. There is no retry and no
//! cancellation: an item that starts producing always reaches a terminal
//! state.

use metrics::counter;

use crate::delivery::Deliverer;
use crate::domain::content::{HistoryRecord, RunId};
use crate::fallback::FallbackComposer;
use crate::history::HistoryStore;
use crate::producer::Producer;

use super::state::{
    Delivered, Done, Drafted, Item, ProduceResult, Producing, RecordFailed,
};

impl Item<Producing> {
    pub fn new(request: crate::domain::content::ContentRequest) -> Self {
        Item {
            state: Producing {
                started_at: chrono::Utc::now(),
            },
            request,
        }
    }

    /// Ask the producer for content.
    ///
    /// The producer does not retry and does not fall back; on failure the
    /// item comes back untouched together with the failure reason, and the
    /// caller decides what to do with it.
    pub async fn produce<P: Producer + ?Sized>(self, producer: &P) -> ProduceResult {
        match producer.produce(&self.request).await {
            Ok(content) => ProduceResult::Drafted(Item {
                state: Drafted {
                    text: content.text,
                    origin: content.origin,
                    produced_at: content.produced_at,
                },
                request: self.request,
            }),
            Err(reason) => ProduceResult::Failed { item: self, reason },
        }
    }

    /// Compose deterministic fallback content. Never fails.
    pub fn fall_back(self, composer: &FallbackComposer) -> Item<Drafted> {
        counter!(
            "tidecast_fallbacks_total",
            "kind" => self.request.kind.as_str()
        )
        .increment(1);

        let content = composer.compose(&self.request);
        tracing::debug!(
            item_id = %self.request.id,
            text_len = content.text.len(),
            "Composed fallback content"
        );

        Item {
            state: Drafted {
                text: content.text,
                origin: content.origin,
                produced_at: content.produced_at,
            },
            request: self.request,
        }
    }
}

impl Item<Drafted> {
    /// Attempt delivery through the channel.
    ///
    /// Delivery failure is data: the outcome lands in the next state either
    /// way, because the recorder must still run.
    pub async fn deliver<D: Deliverer + ?Sized>(self, deliverer: &D) -> Item<Delivered> {
        let outcome = deliverer.deliver(&self.content()).await;

        if !outcome.succeeded {
            counter!(
                "tidecast_delivery_failures_total",
                "kind" => self.request.kind.as_str()
            )
            .increment(1);
        }

        Item {
            state: Delivered {
                text: self.state.text,
                origin: self.state.origin,
                produced_at: self.state.produced_at,
                outcome,
            },
            request: self.request,
        }
    }
}

impl Item<Delivered> {
    /// Append the history record for this item.
    ///
    /// A persistence failure is surfaced, not swallowed: the item lands in
    /// `RecordFailed` carrying the record that could not be stored.
    pub async fn record<S: HistoryStore + ?Sized>(
        self,
        store: &S,
        run_id: RunId,
    ) -> std::result::Result<Item<Done>, Box<Item<RecordFailed>>> {
        let record = HistoryRecord::new(run_id, self.content(), self.state.outcome.clone());

        match store.append(&record).await {
            Ok(()) => Ok(Item {
                state: Done { record },
                request: self.request,
            }),
            Err(e) => {
                counter!("tidecast_record_failures_total").increment(1);
                Err(Box::new(Item {
                    state: RecordFailed {
                        record,
                        error: e.to_string(),
                        failed_at: chrono::Utc::now(),
                    },
                    request: self.request,
                }))
            }
        }
    }
}
