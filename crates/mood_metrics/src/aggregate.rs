//! Fixed-length per-day chart series over a trailing window.
//!
//! Days are civil dates in the configured calendar (a fixed UTC offset), so a
//! record logged at 23:30 local time lands on that local day no matter what
//! the UTC date is. The window always ends on the local date of the reference
//! instant and is returned oldest first.

use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::MoodRecord;
use crate::labels::{Locale, weekday_short};
use crate::validation::{ValidationError, validate_all};

/// Longest window the aggregator builds buckets for.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Which record represents a day when several were logged on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Highest `updated_at`, then latest `created_at`, then later input position.
    #[default]
    LastWriteWins,
    /// First record in input order.
    FirstEncountered,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_write_wins" | "last_write" | "last" => Ok(TieBreak::LastWriteWins),
            "first_encountered" | "first_seen" | "first" => Ok(TieBreak::FirstEncountered),
            other => Err(format!("unknown tie-break policy {other:?}")),
        }
    }
}

/// Values used for days (or metrics) nothing was recorded for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Placeholders {
    pub mood: f64,
    pub metric: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// `d/m`, e.g. `7/3`.
    #[default]
    DayMonth,
    /// Short weekday name in the configured locale.
    Weekday,
}

impl FromStr for LabelStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day_month" | "date" => Ok(LabelStyle::DayMonth),
            "weekday" => Ok(LabelStyle::Weekday),
            other => Err(format!("unknown label style {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesOptions {
    pub utc_offset: FixedOffset,
    pub tie_break: TieBreak,
    pub placeholders: Placeholders,
    pub label_style: LabelStyle,
    pub locale: Locale,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            tie_break: TieBreak::default(),
            placeholders: Placeholders::default(),
            label_style: LabelStyle::default(),
            locale: Locale::default(),
        }
    }
}

/// Trailing windows the app reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    Weekly,
    Monthly,
    Days(u32),
}

impl Window {
    pub fn days(self) -> u32 {
        match self {
            Window::Weekly => 7,
            Window::Monthly => 30,
            Window::Days(n) => n,
        }
    }

    /// Start of the oldest day in the window, as a UTC instant. Records
    /// created at or after this belong to the window.
    pub fn since(
        self,
        reference: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<DateTime<Utc>, ValidationError> {
        let dates = window_dates(self.days(), reference, offset)?;
        let first = dates[0];
        let start = first
            .and_hms_opt(0, 0, 0)
            .and_then(|ndt| ndt.and_local_timezone(offset).single())
            .ok_or(ValidationError::InvalidWindow)?;
        Ok(start.with_timezone(&Utc))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    Mood,
    SleepHours,
    StressLevel,
    WaterIntakeLiters,
}

/// Chart data for a window. Every vector has one entry per day, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    pub dates: Vec<NaiveDate>,
    pub labels: Vec<String>,
    /// Whether a record was found for the day.
    pub present: Vec<bool>,
    pub mood: Vec<f64>,
    pub sleep_hours: Vec<f64>,
    pub stress_level: Vec<f64>,
    pub water_intake_liters: Vec<f64>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn values(&self, metric: SeriesMetric) -> &[f64] {
        match metric {
            SeriesMetric::Mood => &self.mood,
            SeriesMetric::SleepHours => &self.sleep_hours,
            SeriesMetric::StressLevel => &self.stress_level,
            SeriesMetric::WaterIntakeLiters => &self.water_intake_liters,
        }
    }
}

pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// The `window_days` local dates ending at the reference's local date.
/// Windows outside `1..=MAX_WINDOW_DAYS` are rejected.
pub fn window_dates(
    window_days: u32,
    reference: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<NaiveDate>, ValidationError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(ValidationError::InvalidWindow);
    }
    let end = local_date(reference, offset);
    (0..window_days)
        .rev()
        .map(|back| {
            end.checked_sub_signed(TimeDelta::days(i64::from(back)))
                .ok_or(ValidationError::InvalidWindow)
        })
        .collect()
}

fn day_label(date: NaiveDate, options: &SeriesOptions) -> String {
    match options.label_style {
        LabelStyle::DayMonth => format!("{}/{}", date.day(), date.month()),
        LabelStyle::Weekday => weekday_short(date.weekday(), options.locale).to_string(),
    }
}

fn newer(candidate: &MoodRecord, current: &MoodRecord) -> bool {
    (candidate.updated_at, candidate.created_at) >= (current.updated_at, current.created_at)
}

/// Build one value per day per metric for the `window_days` days ending at
/// `reference`.
///
/// The whole snapshot is validated first; one malformed record fails the call.
pub fn build_daily_series(
    records: &[MoodRecord],
    window_days: u32,
    reference: DateTime<Utc>,
    options: &SeriesOptions,
) -> Result<DailySeries, ValidationError> {
    validate_all(records)?;
    let dates = window_dates(window_days, reference, options.utc_offset)?;
    let first = dates[0];

    let mut chosen: Vec<Option<&MoodRecord>> = vec![None; dates.len()];
    for record in records {
        let offset_days = (local_date(record.created_at, options.utc_offset) - first).num_days();
        let Ok(idx) = usize::try_from(offset_days) else {
            continue;
        };
        let Some(slot) = chosen.get_mut(idx) else {
            continue;
        };
        let replace = match *slot {
            None => true,
            Some(current) => options.tie_break == TieBreak::LastWriteWins && newer(record, current),
        };
        if replace {
            *slot = Some(record);
        }
    }

    let ph = options.placeholders;
    let mut series = DailySeries {
        labels: dates.iter().map(|d| day_label(*d, options)).collect(),
        dates,
        present: Vec::with_capacity(chosen.len()),
        mood: Vec::with_capacity(chosen.len()),
        sleep_hours: Vec::with_capacity(chosen.len()),
        stress_level: Vec::with_capacity(chosen.len()),
        water_intake_liters: Vec::with_capacity(chosen.len()),
    };
    for day in chosen {
        series.present.push(day.is_some());
        series.mood.push(
            day.and_then(MoodRecord::mood)
                .map_or(ph.mood, |m| f64::from(m.score())),
        );
        series
            .sleep_hours
            .push(day.and_then(|r| r.sleep_hours).unwrap_or(ph.metric));
        series.stress_level.push(
            day.and_then(|r| r.stress_level)
                .map_or(ph.metric, f64::from),
        );
        series
            .water_intake_liters
            .push(day.and_then(|r| r.water_intake_liters).unwrap_or(ph.metric));
    }

    tracing::trace!(
        window_days,
        records = records.len(),
        days_present = series.present.iter().filter(|p| **p).count(),
        "built daily series"
    );
    Ok(series)
}

pub fn build_daily_series_now(
    records: &[MoodRecord],
    window_days: u32,
    options: &SeriesOptions,
) -> Result<DailySeries, ValidationError> {
    build_daily_series(records, window_days, Utc::now(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mood, MoodValue, NewMoodRecord};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn rec(id: &str, mood: Mood, created: DateTime<Utc>) -> MoodRecord {
        NewMoodRecord::new("u1", mood).into_record(id.into(), created)
    }

    #[test]
    fn empty_input_yields_placeholders() {
        let opts = SeriesOptions {
            placeholders: Placeholders {
                mood: 3.0,
                metric: -1.0,
            },
            ..Default::default()
        };
        let s = build_daily_series(&[], 7, at(2025, 3, 7, 12, 0), &opts).unwrap();
        assert_eq!(s.len(), 7);
        assert_eq!(s.mood, vec![3.0; 7]);
        assert_eq!(s.sleep_hours, vec![-1.0; 7]);
        assert_eq!(s.present, vec![false; 7]);
        assert_eq!(s.dates[0], NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(s.labels[6], "7/3");
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = build_daily_series(&[], 0, at(2025, 3, 7, 12, 0), &SeriesOptions::default());
        assert_eq!(err, Err(ValidationError::InvalidWindow));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let opts = SeriesOptions::default();
        let reference = at(2025, 3, 7, 12, 0);
        let year = build_daily_series(&[], MAX_WINDOW_DAYS, reference, &opts).unwrap();
        assert_eq!(year.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(
            build_daily_series(&[], MAX_WINDOW_DAYS + 1, reference, &opts),
            Err(ValidationError::InvalidWindow)
        );
        assert_eq!(
            build_daily_series(&[], 50_000_000, reference, &opts),
            Err(ValidationError::InvalidWindow)
        );
        assert_eq!(
            Window::Days(u32::MAX).since(reference, opts.utc_offset),
            Err(ValidationError::InvalidWindow)
        );
    }

    #[test]
    fn records_land_on_their_day_and_outliers_are_ignored() {
        let reference = at(2025, 3, 7, 12, 0);
        let mut r1 = rec("a", Mood::Good, at(2025, 3, 5, 9, 0));
        r1.sleep_hours = Some(7.5);
        r1.stress_level = Some(2);
        let old = rec("b", Mood::Bad, at(2025, 2, 1, 9, 0));
        let future = rec("c", Mood::Bad, at(2025, 3, 9, 9, 0));
        let s = build_daily_series(&[old, r1, future], 7, reference, &SeriesOptions::default())
            .unwrap();
        assert_eq!(s.mood, vec![0.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0]);
        assert_eq!(s.sleep_hours[4], 7.5);
        assert_eq!(s.stress_level[4], 2.0);
        assert_eq!(s.water_intake_liters[4], 0.0);
        assert_eq!(s.present.iter().filter(|p| **p).count(), 1);
    }

    #[test]
    fn last_write_wins_uses_updated_at() {
        let reference = at(2025, 3, 7, 20, 0);
        let early = rec("a", Mood::VeryBad, at(2025, 3, 7, 8, 0));
        let mut edited = rec("b", Mood::VeryGood, at(2025, 3, 7, 7, 0));
        edited.updated_at = at(2025, 3, 7, 19, 0);
        let later = rec("c", Mood::Neutral, at(2025, 3, 7, 9, 0));

        let opts = SeriesOptions::default();
        let s = build_daily_series(
            &[early.clone(), edited.clone(), later.clone()],
            1,
            reference,
            &opts,
        )
        .unwrap();
        assert_eq!(s.mood, vec![5.0]);

        let first = SeriesOptions {
            tie_break: TieBreak::FirstEncountered,
            ..Default::default()
        };
        let s = build_daily_series(&[early, edited, later], 1, reference, &first).unwrap();
        assert_eq!(s.mood, vec![1.0]);
    }

    #[test]
    fn full_tie_prefers_later_input() {
        let reference = at(2025, 3, 7, 20, 0);
        let a = rec("a", Mood::Bad, at(2025, 3, 7, 8, 0));
        let b = rec("b", Mood::Good, at(2025, 3, 7, 8, 0));
        let s = build_daily_series(&[a, b], 1, reference, &SeriesOptions::default()).unwrap();
        assert_eq!(s.mood, vec![4.0]);
    }

    #[test]
    fn day_boundaries_follow_configured_offset() {
        // 22:30 UTC on the 6th is 01:30 on the 7th at UTC+3.
        let r = rec("a", Mood::Good, at(2025, 3, 6, 22, 30));
        let reference = at(2025, 3, 7, 12, 0);

        let utc = build_daily_series(
            std::slice::from_ref(&r),
            2,
            reference,
            &SeriesOptions::default(),
        )
        .unwrap();
        assert_eq!(utc.present, vec![true, false]);

        let plus3 = SeriesOptions {
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
            ..Default::default()
        };
        let local = build_daily_series(&[r], 2, reference, &plus3).unwrap();
        assert_eq!(local.present, vec![false, true]);
    }

    #[test]
    fn missing_mood_uses_placeholder_but_keeps_metrics() {
        let reference = at(2025, 3, 7, 12, 0);
        let mut r = rec("a", Mood::Good, at(2025, 3, 7, 8, 0));
        r.mood = None;
        r.water_intake_liters = Some(2.0);
        let opts = SeriesOptions {
            placeholders: Placeholders {
                mood: 3.0,
                metric: 0.0,
            },
            ..Default::default()
        };
        let s = build_daily_series(&[r], 1, reference, &opts).unwrap();
        assert_eq!(s.mood, vec![3.0]);
        assert_eq!(s.water_intake_liters, vec![2.0]);
        assert_eq!(s.present, vec![true]);
    }

    #[test]
    fn invalid_record_fails_whole_series() {
        let mut r = rec("a", Mood::Good, at(2025, 3, 7, 8, 0));
        r.mood = Some(MoodValue::Unrecognized("great".into()));
        let err = build_daily_series(&[r], 7, at(2025, 3, 7, 12, 0), &SeriesOptions::default());
        assert!(matches!(
            err,
            Err(ValidationError::AtIndex { index: 0, .. })
        ));
    }

    #[test]
    fn weekday_labels_use_locale() {
        let opts = SeriesOptions {
            label_style: LabelStyle::Weekday,
            locale: Locale::Tr,
            ..Default::default()
        };
        // 2025-03-03 is a Monday.
        let s = build_daily_series(&[], 7, at(2025, 3, 9, 12, 0), &opts).unwrap();
        assert_eq!(
            s.labels,
            vec!["Pzt", "Sal", "Çar", "Per", "Cum", "Cmt", "Paz"]
        );
    }

    #[test]
    fn window_since_is_local_midnight_of_first_day() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let since = Window::Weekly.since(at(2025, 3, 7, 12, 0), offset).unwrap();
        // 2025-03-01T00:00+03:00
        assert_eq!(since, at(2025, 2, 28, 21, 0));
        assert_eq!(Window::Monthly.days(), 30);
        assert_eq!(
            Window::Days(0).since(at(2025, 3, 7, 12, 0), offset),
            Err(ValidationError::InvalidWindow)
        );
    }

    #[test]
    fn values_selects_metric() {
        let s =
            build_daily_series(&[], 3, at(2025, 3, 7, 12, 0), &SeriesOptions::default()).unwrap();
        assert_eq!(s.values(SeriesMetric::StressLevel).len(), 3);
        assert!(!s.is_empty());
    }
}
