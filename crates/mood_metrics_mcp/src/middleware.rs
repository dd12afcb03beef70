//! Logging and metrics around a [`MoodStore`].

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use mood_metrics::{MoodError, MoodPatch, MoodRecord, MoodStore, NewMoodRecord};
use tracing::debug;

/// Wraps a store and records timing, outcome and call counts per operation.
#[derive(Clone)]
pub struct LoggingStore<S: MoodStore> {
    inner: Arc<S>,
}

impl<S: MoodStore> LoggingStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_logging<F, Fut, T>(
        &self,
        operation: F,
        name: &'static str,
    ) -> Result<T, MoodError>
    where
        F: FnOnce(Arc<S>) -> Fut,
        Fut: std::future::Future<Output = Result<T, MoodError>>,
    {
        let start = Instant::now();
        debug!(op = name, "store call started");

        let result = operation(self.inner.clone()).await;

        let elapsed = start.elapsed();
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("mood_store_calls_total", "op" => name, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("mood_store_call_seconds", "op" => name).record(elapsed.as_secs_f64());
        match &result {
            Ok(_) => debug!(op = name, ?elapsed, "store call finished"),
            Err(e) => debug!(op = name, ?elapsed, error = %e, "store call failed"),
        }
        result
    }
}

#[async_trait::async_trait]
impl<S: MoodStore> MoodStore for LoggingStore<S> {
    async fn query_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodRecord>, MoodError> {
        self.with_logging(
            |store| async move { store.query_records(user_id, since).await },
            "query_records",
        )
        .await
    }

    async fn create_record(&self, record: NewMoodRecord) -> Result<MoodRecord, MoodError> {
        self.with_logging(
            |store| async move { store.create_record(record).await },
            "create_record",
        )
        .await
    }

    async fn update_record(&self, id: &str, patch: MoodPatch) -> Result<MoodRecord, MoodError> {
        self.with_logging(
            |store| async move { store.update_record(id, patch).await },
            "update_record",
        )
        .await
    }

    async fn delete_record(&self, id: &str) -> Result<(), MoodError> {
        self.with_logging(
            |store| async move { store.delete_record(id).await },
            "delete_record",
        )
        .await
    }
}
