//! Field rules for mood records.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::{MoodPatch, MoodRecord, MoodValue, NewMoodRecord};

pub const MAX_NOTE_CHARS: usize = 500;
pub const MAX_TAGS: usize = 10;
pub const STRESS_RANGE: RangeInclusive<u8> = 1..=5;
pub const MAX_SLEEP_HOURS: f64 = 24.0;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("unrecognized mood value {0:?}")]
    UnrecognizedMood(String),
    #[error("note is {len} characters long, at most {max} allowed")]
    NoteTooLong { len: usize, max: usize },
    #[error("{count} tags given, at most {max} allowed")]
    TooManyTags { count: usize, max: usize },
    #[error("stress level {0} is outside 1..=5")]
    StressOutOfRange(u8),
    #[error("{field} has invalid value {value}")]
    InvalidMetric { field: &'static str, value: f64 },
    #[error("user id is required")]
    MissingUserId,
    #[error(
        "window must span between 1 and {} days",
        crate::aggregate::MAX_WINDOW_DAYS
    )]
    InvalidWindow,
    #[error("record {index}: {source}")]
    AtIndex {
        index: usize,
        source: Box<ValidationError>,
    },
}

fn check_note(note: Option<&str>) -> Result<(), ValidationError> {
    if let Some(note) = note {
        let len = note.chars().count();
        if len > MAX_NOTE_CHARS {
            return Err(ValidationError::NoteTooLong {
                len,
                max: MAX_NOTE_CHARS,
            });
        }
    }
    Ok(())
}

fn check_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags {
            count: tags.len(),
            max: MAX_TAGS,
        });
    }
    Ok(())
}

fn check_metrics(
    sleep_hours: Option<f64>,
    stress_level: Option<u8>,
    water_intake_liters: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(v) = sleep_hours
        && !(v.is_finite() && (0.0..=MAX_SLEEP_HOURS).contains(&v))
    {
        return Err(ValidationError::InvalidMetric {
            field: "sleepHours",
            value: v,
        });
    }
    if let Some(s) = stress_level
        && !STRESS_RANGE.contains(&s)
    {
        return Err(ValidationError::StressOutOfRange(s));
    }
    if let Some(v) = water_intake_liters
        && !(v.is_finite() && v >= 0.0)
    {
        return Err(ValidationError::InvalidMetric {
            field: "waterIntakeLiters",
            value: v,
        });
    }
    Ok(())
}

/// Checks a stored record. A missing mood is allowed; an unrecognized one is not.
pub fn validate_record(record: &MoodRecord) -> Result<(), ValidationError> {
    if let Some(MoodValue::Unrecognized(raw)) = &record.mood {
        return Err(ValidationError::UnrecognizedMood(raw.clone()));
    }
    check_note(record.note.as_deref())?;
    check_tags(&record.tags)?;
    check_metrics(
        record.sleep_hours,
        record.stress_level,
        record.water_intake_liters,
    )
}

/// Validates a whole snapshot, reporting the first offending record.
pub fn validate_all(records: &[MoodRecord]) -> Result<(), ValidationError> {
    for (index, record) in records.iter().enumerate() {
        validate_record(record).map_err(|e| ValidationError::AtIndex {
            index,
            source: Box::new(e),
        })?;
    }
    Ok(())
}

pub fn validate_new(record: &NewMoodRecord) -> Result<(), ValidationError> {
    if record.user_id.trim().is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    check_note(record.note.as_deref())?;
    check_tags(&record.tags)?;
    check_metrics(
        record.sleep_hours,
        record.stress_level,
        record.water_intake_liters,
    )
}

pub fn validate_patch(patch: &MoodPatch) -> Result<(), ValidationError> {
    check_note(patch.note.as_deref())?;
    if let Some(tags) = &patch.tags {
        check_tags(tags)?;
    }
    check_metrics(
        patch.sleep_hours,
        patch.stress_level,
        patch.water_intake_liters,
    )
}
