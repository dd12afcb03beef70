//! Mood records, the `MoodStore` collaborator trait and the daily-metrics aggregator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod aggregate;
pub mod config;
pub mod firestore;
pub mod http_client;
pub mod labels;
pub mod memory;
pub mod retry;
pub mod summary;
pub mod validation;

pub use aggregate::{
    DailySeries, LabelStyle, MAX_WINDOW_DAYS, Placeholders, SeriesMetric, SeriesOptions, TieBreak,
    Window, build_daily_series, build_daily_series_now,
};
pub use labels::Locale;
pub use summary::{
    MetricStat, MetricStats, MoodDistribution, MoodSummary, metric_stats, summarize, summarize_at,
};
pub use validation::ValidationError;

#[derive(Debug, Error)]
pub enum MoodError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("store returned status {status}: {body}")]
    Api { status: u16, body: String },
}

impl MoodError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => MoodError::NotFound(body),
            401 | 403 => MoodError::Auth(body),
            _ => MoodError::Api { status, body },
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MoodError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MoodError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Five-point ordinal mood scale, worst to best.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryBad,
    Bad,
    Neutral,
    Good,
    VeryGood,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::VeryBad,
        Mood::Bad,
        Mood::Neutral,
        Mood::Good,
        Mood::VeryGood,
    ];

    /// Ordinal score, `VeryBad = 1` through `VeryGood = 5`.
    pub fn score(self) -> u8 {
        match self {
            Mood::VeryBad => 1,
            Mood::Bad => 2,
            Mood::Neutral => 3,
            Mood::Good => 4,
            Mood::VeryGood => 5,
        }
    }

    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            1 => Some(Mood::VeryBad),
            2 => Some(Mood::Bad),
            3 => Some(Mood::Neutral),
            4 => Some(Mood::Good),
            5 => Some(Mood::VeryGood),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::VeryBad => "very_bad",
            Mood::Bad => "bad",
            Mood::Neutral => "neutral",
            Mood::Good => "good",
            Mood::VeryGood => "very_good",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    /// Accepts canonical names (`very_good`), display labels in any supported
    /// locale (`Çok İyi`, `Very good`) and scores (`1`..`5`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        labels::parse_mood(s).ok_or_else(|| ValidationError::UnrecognizedMood(s.to_string()))
    }
}

/// The mood a stored record carries. Stores hand back whatever the document
/// held, so values outside the scale are kept rather than dropped and are
/// rejected later by validation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MoodValue {
    Recognized(Mood),
    Unrecognized(String),
}

impl MoodValue {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<Mood>() {
            Ok(m) => MoodValue::Recognized(m),
            Err(_) => MoodValue::Unrecognized(raw.to_string()),
        }
    }

    pub fn from_score(score: i64) -> Self {
        match Mood::from_score(score) {
            Some(m) => MoodValue::Recognized(m),
            None => MoodValue::Unrecognized(score.to_string()),
        }
    }

    pub fn mood(&self) -> Option<Mood> {
        match self {
            MoodValue::Recognized(m) => Some(*m),
            MoodValue::Unrecognized(_) => None,
        }
    }
}

impl From<Mood> for MoodValue {
    fn from(mood: Mood) -> Self {
        MoodValue::Recognized(mood)
    }
}

impl Serialize for MoodValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MoodValue::Recognized(m) => serializer.serialize_str(m.as_str()),
            MoodValue::Unrecognized(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for MoodValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => MoodValue::parse(&s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MoodValue::from_score(i),
                None => MoodValue::Unrecognized(n.to_string()),
            },
            other => MoodValue::Unrecognized(other.to_string()),
        })
    }
}

/// One logged observation. Several records may exist for the same day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub mood: Option<MoodValue>,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<u8>,
    #[serde(
        default,
        alias = "waterIntake",
        skip_serializing_if = "Option::is_none"
    )]
    pub water_intake_liters: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MoodRecord {
    /// The recognized mood, if any.
    pub fn mood(&self) -> Option<Mood> {
        self.mood.as_ref().and_then(MoodValue::mood)
    }
}

/// Payload for creating a record; the store assigns id and timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMoodRecord {
    pub user_id: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub stress_level: Option<u8>,
    #[serde(default)]
    pub water_intake_liters: Option<f64>,
}

impl NewMoodRecord {
    pub fn new(user_id: impl Into<String>, mood: Mood) -> Self {
        Self {
            user_id: user_id.into(),
            mood: Some(mood),
            ..Default::default()
        }
    }

    pub fn into_record(self, id: String, now: DateTime<Utc>) -> MoodRecord {
        MoodRecord {
            id,
            user_id: self.user_id,
            mood: self.mood.map(MoodValue::from),
            note: self.note,
            tags: self.tags,
            sleep_hours: self.sleep_hours,
            stress_level: self.stress_level,
            water_intake_liters: self.water_intake_liters,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodPatch {
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub stress_level: Option<u8>,
    #[serde(default)]
    pub water_intake_liters: Option<f64>,
}

impl MoodPatch {
    pub fn is_empty(&self) -> bool {
        self.field_paths().is_empty()
    }

    /// Document field names this patch writes, `updatedAt` excluded.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.mood.is_some() {
            paths.push("mood");
        }
        if self.note.is_some() {
            paths.push("note");
        }
        if self.tags.is_some() {
            paths.push("tags");
        }
        if self.sleep_hours.is_some() {
            paths.push("sleepHours");
        }
        if self.stress_level.is_some() {
            paths.push("stressLevel");
        }
        if self.water_intake_liters.is_some() {
            paths.push("waterIntakeLiters");
        }
        paths
    }

    pub fn apply(&self, record: &mut MoodRecord, now: DateTime<Utc>) {
        if let Some(m) = self.mood {
            record.mood = Some(MoodValue::Recognized(m));
        }
        if let Some(note) = &self.note {
            record.note = Some(note.clone());
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
        if let Some(v) = self.sleep_hours {
            record.sleep_hours = Some(v);
        }
        if let Some(v) = self.stress_level {
            record.stress_level = Some(v);
        }
        if let Some(v) = self.water_intake_liters {
            record.water_intake_liters = Some(v);
        }
        record.updated_at = now;
    }
}

/// The external store records live in.
///
/// `query_records` must return only the given user's records created at or
/// after `since`, ascending by `created_at` with ties ordered by id.
#[async_trait]
pub trait MoodStore: Send + Sync + 'static {
    async fn query_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodRecord>, MoodError>;
    async fn create_record(&self, record: NewMoodRecord) -> Result<MoodRecord, MoodError>;
    async fn update_record(&self, id: &str, patch: MoodPatch) -> Result<MoodRecord, MoodError>;
    async fn delete_record(&self, id: &str) -> Result<(), MoodError>;
}
