//! Display labels, weekday names and suggestions. Used only at the
//! presentation boundary; the aggregator works on [`Mood`] values.

use std::str::FromStr;

use chrono::Weekday;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Mood;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "tr" => Ok(Locale::Tr),
            other => Err(format!("unsupported locale {other:?}")),
        }
    }
}

impl Mood {
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Mood::VeryBad) => "Very bad",
            (Locale::En, Mood::Bad) => "Bad",
            (Locale::En, Mood::Neutral) => "Neutral",
            (Locale::En, Mood::Good) => "Good",
            (Locale::En, Mood::VeryGood) => "Very good",
            (Locale::Tr, Mood::VeryBad) => "Çok Kötü",
            (Locale::Tr, Mood::Bad) => "Kötü",
            (Locale::Tr, Mood::Neutral) => "Normal",
            (Locale::Tr, Mood::Good) => "İyi",
            (Locale::Tr, Mood::VeryGood) => "Çok İyi",
        }
    }
}

/// Resolve a canonical name, a label in any locale, or a score.
pub(crate) fn parse_mood(raw: &str) -> Option<Mood> {
    let s = raw.trim();
    if let Ok(score) = s.parse::<i64>() {
        return Mood::from_score(score);
    }
    let folded = fold(s);
    Mood::ALL.into_iter().find(|m| {
        m.as_str() == folded
            || fold(m.label(Locale::En)) == folded
            || fold(m.label(Locale::Tr)) == folded
    })
}

// `İ` lowercases to `i` plus a combining dot; drop the dot so `İyi` and `iyi` match.
fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| *c != '\u{307}')
        .collect()
}

pub fn weekday_short(day: Weekday, locale: Locale) -> &'static str {
    match locale {
        Locale::En => match day {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        },
        Locale::Tr => match day {
            Weekday::Mon => "Pzt",
            Weekday::Tue => "Sal",
            Weekday::Wed => "Çar",
            Weekday::Thu => "Per",
            Weekday::Fri => "Cum",
            Weekday::Sat => "Cmt",
            Weekday::Sun => "Paz",
        },
    }
}

const SUGGESTIONS_EN: [&[&str]; 4] = [
    &[
        "Be gentle with yourself, this may be a hard day.",
        "Talking to someone you love might help.",
        "Writing your feelings down in your journal can bring relief.",
    ],
    &[
        "A short meditation session can lift your mood.",
        "Make yourself a drink you like and take a break.",
        "Try some deep breathing exercises.",
    ],
    &[
        "A short walk can stretch this good feeling.",
        "Enjoy the moment with some music you love.",
        "Consider giving yourself a small reward today.",
    ],
    &[
        "Channel this energy into something creative.",
        "Would you like to share this moment with someone you love?",
        "Write something in your journal to keep this positive energy.",
    ],
];

const SUGGESTIONS_TR: [&[&str]; 4] = [
    &[
        "Kendine nazik davran, bu zor bir gün olabilir.",
        "Sevdiğin biriyle konuşmak iyi gelebilir.",
        "Duygularını günlüğüne dökmek rahatlatıcı olabilir.",
    ],
    &[
        "Kısa bir meditasyon seansı ruh halini yükseltebilir.",
        "Sevdiğin bir içecek hazırlayıp mola verebilirsin.",
        "Derin nefes alma egzersizleri yapmayı deneyebilirsin.",
    ],
    &[
        "Kısa bir yürüyüş yaparak bu iyi hissi uzatabilirsin.",
        "Sevdiğin bir müzik dinleyerek bu anın tadını çıkarabilirsin.",
        "Bugün kendine küçük bir ödül vermeyi düşünebilirsin.",
    ],
    &[
        "Bu enerjiyi yaratıcı bir aktiviteye yönlendirebilirsin.",
        "Sevdiğin biriyle bu güzel anı paylaşmak ister misin?",
        "Bu olumlu enerjiyi not etmek için günlüğüne bir şeyler yazabilirsin.",
    ],
];

/// Activity suggestions for a logged mood. `VeryBad` shares the `Bad` list.
pub fn suggestions(mood: Mood, locale: Locale) -> &'static [&'static str] {
    let idx = match mood {
        Mood::VeryBad | Mood::Bad => 0,
        Mood::Neutral => 1,
        Mood::Good => 2,
        Mood::VeryGood => 3,
    };
    match locale {
        Locale::En => SUGGESTIONS_EN[idx],
        Locale::Tr => SUGGESTIONS_TR[idx],
    }
}
