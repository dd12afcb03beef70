//! Mood tracking operations on top of a [`MoodStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

use mood_metrics::aggregate::local_date;
use mood_metrics::config::AggregatorConfig;
use mood_metrics::retry::RetryPolicy;
use mood_metrics::validation::{validate_new, validate_patch};
use mood_metrics::{
    DailySeries, MetricStats, MoodError, MoodPatch, MoodRecord, MoodStore, MoodSummary,
    NewMoodRecord, Window, build_daily_series, metric_stats, summarize_at,
};

use crate::error::{McpError, McpResult};

/// Everything the weekly chart screen shows, from a single fetch.
#[derive(Clone, Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub series: DailySeries,
    pub summary: MoodSummary,
    pub metrics: MetricStats,
}

#[derive(Clone)]
pub struct MoodTracker {
    store: Arc<dyn MoodStore>,
    config: AggregatorConfig,
    retry: RetryPolicy,
}

impl MoodTracker {
    pub fn new(store: Arc<dyn MoodStore>, config: AggregatorConfig) -> Self {
        Self {
            store,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// The configured default window, or `days` when given.
    pub fn window(&self, days: Option<u32>) -> Window {
        Window::Days(days.unwrap_or(self.config.window_days))
    }

    pub async fn log_mood(&self, record: NewMoodRecord) -> McpResult<MoodRecord> {
        validate_new(&record)?;
        let created = self.store.create_record(record).await?;
        tracing::info!(id = %created.id, user_id = %created.user_id, "logged mood");
        Ok(created)
    }

    pub async fn update_mood(&self, id: &str, patch: MoodPatch) -> McpResult<MoodRecord> {
        if id.trim().is_empty() {
            return Err(McpError::InvalidArgument("record id is required".into()));
        }
        if patch.is_empty() {
            return Err(McpError::InvalidArgument("nothing to update".into()));
        }
        validate_patch(&patch)?;
        Ok(self.store.update_record(id, patch).await?)
    }

    pub async fn delete_mood(&self, id: &str) -> McpResult<()> {
        if id.trim().is_empty() {
            return Err(McpError::InvalidArgument("record id is required".into()));
        }
        self.store.delete_record(id).await?;
        tracing::info!(id, "deleted mood record");
        Ok(())
    }

    /// Records for `user_id` in `window` ending at `reference`. A blank user
    /// id yields no records rather than an error.
    ///
    /// The store only bounds the start; records created on a local day after
    /// the reference's are dropped here so every view sees the same window.
    pub async fn fetch_window(
        &self,
        user_id: &str,
        window: Window,
        reference: DateTime<Utc>,
    ) -> McpResult<Vec<MoodRecord>> {
        if user_id.trim().is_empty() {
            tracing::warn!("mood query without a user id, returning no records");
            return Ok(Vec::new());
        }
        let since = window.since(reference, self.config.series.utc_offset)?;
        let mut records = self
            .retry
            .retry_async_when(
                || self.store.query_records(user_id, since),
                MoodError::is_transient,
            )
            .await?;
        let offset = self.config.series.utc_offset;
        let last_day = local_date(reference, offset);
        records.retain(|r| local_date(r.created_at, offset) <= last_day);
        tracing::debug!(
            user_id,
            days = window.days(),
            count = records.len(),
            "fetched window"
        );
        Ok(records)
    }

    pub async fn summary(
        &self,
        user_id: &str,
        window: Window,
        reference: DateTime<Utc>,
    ) -> McpResult<MoodSummary> {
        let records = self.fetch_window(user_id, window, reference).await?;
        Ok(summarize_at(&records, reference)?)
    }

    pub async fn daily_series(
        &self,
        user_id: &str,
        window: Window,
        reference: DateTime<Utc>,
    ) -> McpResult<DailySeries> {
        let records = self.fetch_window(user_id, window, reference).await?;
        Ok(build_daily_series(
            &records,
            window.days(),
            reference,
            &self.config.series,
        )?)
    }

    pub async fn weekly_report(
        &self,
        user_id: &str,
        reference: DateTime<Utc>,
    ) -> McpResult<WeeklyReport> {
        let window = Window::Weekly;
        let records = self.fetch_window(user_id, window, reference).await?;
        Ok(WeeklyReport {
            series: build_daily_series(&records, window.days(), reference, &self.config.series)?,
            summary: summarize_at(&records, reference)?,
            metrics: metric_stats(&records)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use mood_metrics::Mood;
    use mood_metrics::memory::InMemoryMoodStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn rec(id: &str, user: &str, mood: Mood, days_ago: i64) -> MoodRecord {
        NewMoodRecord::new(user, mood).into_record(id.into(), now() - TimeDelta::days(days_ago))
    }

    fn tracker(records: Vec<MoodRecord>) -> MoodTracker {
        let store = InMemoryMoodStore::with_records(records);
        MoodTracker::new(Arc::new(store), AggregatorConfig::default())
    }

    /// Fails with 503 a fixed number of times, then answers with no records.
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl MoodStore for FlakyStore {
        async fn query_records(
            &self,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<MoodRecord>, MoodError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(MoodError::from_status(503, "unavailable".into()))
            } else {
                Ok(vec![])
            }
        }
        async fn create_record(&self, _r: NewMoodRecord) -> Result<MoodRecord, MoodError> {
            Err(MoodError::from_status(400, "read only".into()))
        }
        async fn update_record(&self, id: &str, _p: MoodPatch) -> Result<MoodRecord, MoodError> {
            Err(MoodError::NotFound(id.into()))
        }
        async fn delete_record(&self, id: &str) -> Result<(), MoodError> {
            Err(MoodError::NotFound(id.into()))
        }
    }

    #[tokio::test]
    async fn blank_user_returns_no_records() {
        let t = tracker(vec![rec("a", "u1", Mood::Good, 0)]);
        let records = t.fetch_window("  ", Window::Weekly, now()).await.unwrap();
        assert!(records.is_empty());
        let s = t.summary("", Window::Weekly, now()).await.unwrap();
        assert_eq!(s.total_entries, 0);
        assert_eq!(s.last_updated, now());
    }

    #[tokio::test]
    async fn window_excludes_older_records_and_other_users() {
        let t = tracker(vec![
            rec("a", "u1", Mood::VeryGood, 1),
            rec("b", "u1", Mood::Bad, 6),
            rec("c", "u1", Mood::VeryBad, 7),
            rec("d", "u2", Mood::Good, 1),
        ]);
        let s = t.summary("u1", Window::Weekly, now()).await.unwrap();
        assert_eq!(s.total_entries, 2);
        assert_eq!(s.average_mood, 3.5);
    }

    #[tokio::test]
    async fn window_ends_on_the_reference_day() {
        let mut later_today = rec("today", "u1", Mood::Good, 0);
        later_today.created_at = now() + TimeDelta::hours(6);
        let t = tracker(vec![
            rec("a", "u1", Mood::VeryGood, 1),
            later_today,
            rec("future", "u1", Mood::VeryBad, -20),
        ]);

        let records = t.fetch_window("u1", Window::Weekly, now()).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "today"]);

        let s = t.summary("u1", Window::Weekly, now()).await.unwrap();
        assert_eq!(s.total_entries, 2);
        assert_eq!(s.last_updated, now());

        let report = t.weekly_report("u1", now()).await.unwrap();
        let present = report.series.present.iter().filter(|p| **p).count();
        assert_eq!(report.summary.total_entries as usize, present);
        assert_eq!(report.summary.mood_distribution.total(), 2);
    }

    #[tokio::test]
    async fn weekly_report_combines_views() {
        let mut a = rec("a", "u1", Mood::Good, 0);
        a.sleep_hours = Some(7.0);
        let t = tracker(vec![a, rec("b", "u1", Mood::Neutral, 2)]);
        let report = t.weekly_report("u1", now()).await.unwrap();
        assert_eq!(report.series.len(), 7);
        assert_eq!(report.series.mood[6], 4.0);
        assert_eq!(report.series.mood[4], 3.0);
        assert_eq!(report.summary.total_entries, 2);
        assert_eq!(report.metrics.sleep_hours.count, 1);
    }

    #[tokio::test]
    async fn log_mood_validates_before_writing() {
        let store = Arc::new(InMemoryMoodStore::new());
        let t = MoodTracker::new(store.clone(), AggregatorConfig::default());
        let mut bad = NewMoodRecord::new("u1", Mood::Good);
        bad.stress_level = Some(9);
        assert!(matches!(
            t.log_mood(bad).await,
            Err(McpError::Validation(_))
        ));
        assert!(store.is_empty().await);

        t.log_mood(NewMoodRecord::new("u1", Mood::Good))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let t = tracker(vec![rec("a", "u1", Mood::Good, 0)]);
        assert!(matches!(
            t.update_mood("a", MoodPatch::default()).await,
            Err(McpError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn transient_query_failures_are_retried() {
        let store = Arc::new(FlakyStore {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let t =
            MoodTracker::new(store.clone(), AggregatorConfig::default()).with_retry(RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(1),
            });
        let records = t.fetch_window("u1", Window::Weekly, now()).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let store = Arc::new(FlakyStore {
            failures: 0,
            calls: AtomicU32::new(0),
        });
        let t = MoodTracker::new(store, AggregatorConfig::default());
        let err = t.delete_mood("x").await.unwrap_err();
        assert!(matches!(err, McpError::Store(MoodError::NotFound(_))));
    }
}
