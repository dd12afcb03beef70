use std::str::FromStr;

use chrono::FixedOffset;
use secrecy::SecretString;

use crate::MoodError;
use crate::aggregate::{MAX_WINDOW_DAYS, SeriesOptions, Window};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_COLLECTION: &str = "moods";

/// Calendar and rendering settings for the aggregator.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatorConfig {
    /// Window used when a caller does not name one.
    pub window_days: u32,
    pub series: SeriesOptions,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_days: Window::Weekly.days(),
            series: SeriesOptions::default(),
        }
    }
}

fn parse_var<T: FromStr>(
    get: &mut impl FnMut(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, MoodError>
where
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| MoodError::Config(format!("{key}: {e}"))),
        _ => Ok(None),
    }
}

impl AggregatorConfig {
    pub fn from_env() -> Result<Self, MoodError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Reads settings through `get` so tests need not touch the process env.
    /// Unset variables keep their defaults.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, MoodError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(days) = parse_var::<u32>(&mut get, "MOOD_WINDOW_DAYS")? {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(MoodError::Config(format!(
                    "MOOD_WINDOW_DAYS must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
                )));
            }
            cfg.window_days = days;
        }
        if let Some(minutes) = parse_var::<i32>(&mut get, "MOOD_UTC_OFFSET_MINUTES")? {
            cfg.series.utc_offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    MoodError::Config(format!("MOOD_UTC_OFFSET_MINUTES {minutes} out of range"))
                })?;
        }
        if let Some(tb) = parse_var(&mut get, "MOOD_TIE_BREAK")? {
            cfg.series.tie_break = tb;
        }
        if let Some(v) = parse_var(&mut get, "MOOD_PLACEHOLDER_MOOD")? {
            cfg.series.placeholders.mood = v;
        }
        if let Some(v) = parse_var(&mut get, "MOOD_PLACEHOLDER_METRIC")? {
            cfg.series.placeholders.metric = v;
        }
        if let Some(locale) = parse_var(&mut get, "MOOD_LOCALE")? {
            cfg.series.locale = locale;
        }
        if let Some(style) = parse_var(&mut get, "MOOD_LABEL_STYLE")? {
            cfg.series.label_style = style;
        }
        Ok(cfg)
    }
}

/// Connection settings for the Firestore REST store.
#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter.
    pub api_key: Option<SecretString>,
    /// Firebase ID token, sent as a bearer token.
    pub id_token: Option<SecretString>,
    pub base_url: String,
    pub collection: String,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: None,
            id_token: None,
            base_url: DEFAULT_BASE_URL.into(),
            collection: DEFAULT_COLLECTION.into(),
        }
    }

    pub fn from_env() -> Result<Self, MoodError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, MoodError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let project_id = get("MOOD_FIRESTORE_PROJECT_ID")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| MoodError::Config("MOOD_FIRESTORE_PROJECT_ID missing".into()))?;
        let secret = |v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .map(|s| SecretString::new(s.into()))
        };
        Ok(Self {
            project_id,
            api_key: secret(get("MOOD_FIRESTORE_API_KEY")),
            id_token: secret(get("MOOD_FIRESTORE_ID_TOKEN")),
            base_url: get("MOOD_FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            collection: get("MOOD_FIRESTORE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.into()),
        })
    }

    /// `{base}/v1/projects/{project}/databases/(default)/documents`
    pub fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}
