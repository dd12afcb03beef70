//! Mood distribution, ordinal average, top tags and per-metric statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, validate_all};
use crate::{Mood, MoodRecord};

pub const TOP_TAGS: usize = 5;

/// Occurrence count for each of the five moods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodDistribution {
    pub very_bad: u32,
    pub bad: u32,
    pub neutral: u32,
    pub good: u32,
    pub very_good: u32,
}

impl MoodDistribution {
    pub fn get(&self, mood: Mood) -> u32 {
        match mood {
            Mood::VeryBad => self.very_bad,
            Mood::Bad => self.bad,
            Mood::Neutral => self.neutral,
            Mood::Good => self.good,
            Mood::VeryGood => self.very_good,
        }
    }

    fn bump(&mut self, mood: Mood) {
        let slot = match mood {
            Mood::VeryBad => &mut self.very_bad,
            Mood::Bad => &mut self.bad,
            Mood::Neutral => &mut self.neutral,
            Mood::Good => &mut self.good,
            Mood::VeryGood => &mut self.very_good,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        Mood::ALL.iter().map(|m| self.get(*m)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mood, u32)> + '_ {
        Mood::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    /// Records with a mood. Records without one still contribute tags.
    pub total_entries: u32,
    pub mood_distribution: MoodDistribution,
    /// Mean score on the 1..5 scale, `0` when there are no entries.
    pub average_mood: f64,
    pub most_common_tags: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Summarize a snapshot; an empty snapshot reports the current time as
/// `last_updated`.
pub fn summarize(records: &[MoodRecord]) -> Result<MoodSummary, ValidationError> {
    summarize_at(records, Utc::now())
}

pub fn summarize_at(
    records: &[MoodRecord],
    now: DateTime<Utc>,
) -> Result<MoodSummary, ValidationError> {
    validate_all(records)?;

    let mut distribution = MoodDistribution::default();
    let mut score_total: u64 = 0;
    for mood in records.iter().filter_map(MoodRecord::mood) {
        distribution.bump(mood);
        score_total += u64::from(mood.score());
    }
    let total_entries = distribution.total();
    let average_mood = if total_entries > 0 {
        score_total as f64 / f64::from(total_entries)
    } else {
        0.0
    };

    let last_updated = records.iter().map(|r| r.updated_at).max().unwrap_or(now);

    Ok(MoodSummary {
        total_entries,
        mood_distribution: distribution,
        average_mood,
        most_common_tags: top_tags(records, TOP_TAGS),
        last_updated,
    })
}

/// Most frequent tags, ties kept in first-seen order.
pub fn top_tags(records: &[MoodRecord], limit: usize) -> Vec<String> {
    let mut order: Vec<(&str, u32)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        match index.get(tag.as_str()) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(tag.as_str(), order.len());
                order.push((tag.as_str(), 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(limit)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricStat {
    /// Records that measured this metric.
    pub count: u32,
    pub mean: Option<f64>,
    pub total: f64,
}

impl MetricStat {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (count, total) = values.fold((0u32, 0.0), |(n, sum), v| (n + 1, sum + v));
        Self {
            count,
            mean: (count > 0).then(|| total / f64::from(count)),
            total,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub sleep_hours: MetricStat,
    pub stress_level: MetricStat,
    pub water_intake_liters: MetricStat,
}

/// Per-metric count, mean and total. Unmeasured values are left out rather
/// than counted as zero.
pub fn metric_stats(records: &[MoodRecord]) -> Result<MetricStats, ValidationError> {
    validate_all(records)?;
    Ok(MetricStats {
        sleep_hours: MetricStat::from_values(records.iter().filter_map(|r| r.sleep_hours)),
        stress_level: MetricStat::from_values(
            records.iter().filter_map(|r| r.stress_level).map(f64::from),
        ),
        water_intake_liters: MetricStat::from_values(
            records.iter().filter_map(|r| r.water_intake_liters),
        ),
    })
}
