//! In-process [`MoodStore`] used for local runs and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{MoodError, MoodPatch, MoodRecord, MoodStore, NewMoodRecord};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct InMemoryMoodStore {
    records: Arc<RwLock<BTreeMap<String, MoodRecord>>>,
    clock: Clock,
}

impl Default for InMemoryMoodStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryMoodStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMoodStore").finish_non_exhaustive()
    }
}

impl InMemoryMoodStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            clock: Arc::new(clock),
        }
    }

    /// Seed the store with existing records, keyed by their ids.
    pub fn with_records(records: impl IntoIterator<Item = MoodRecord>) -> Self {
        let map: BTreeMap<String, MoodRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: Arc::new(RwLock::new(map)),
            clock: Arc::new(Utc::now),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MoodStore for InMemoryMoodStore {
    async fn query_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodRecord>, MoodError> {
        let guard = self.records.read().await;
        let mut out: Vec<MoodRecord> = guard
            .values()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(out)
    }

    async fn create_record(&self, record: NewMoodRecord) -> Result<MoodRecord, MoodError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created = record.into_record(id.clone(), (self.clock)());
        self.records.write().await.insert(id, created.clone());
        tracing::debug!(id = %created.id, user_id = %created.user_id, "stored mood record");
        Ok(created)
    }

    async fn update_record(&self, id: &str, patch: MoodPatch) -> Result<MoodRecord, MoodError> {
        let mut guard = self.records.write().await;
        let record = guard
            .get_mut(id)
            .ok_or_else(|| MoodError::NotFound(format!("mood record {id}")))?;
        patch.apply(record, (self.clock)());
        Ok(record.clone())
    }

    async fn delete_record(&self, id: &str) -> Result<(), MoodError> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MoodError::NotFound(format!("mood record {id}")))
    }
}
