use mood_metrics::Mood;
use mood_metrics::labels::{Locale, suggestions};
use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn weekly_mood_review_prompt(user_id: &str, days: u32) -> GetPromptResult {
    GetPromptResult::new(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Review my mood over the past {days} days (user id {user_id}).\n\nInclude:\n1. How my mood moved day to day, and any days with no entry\n2. Average mood and the mood distribution\n3. Tags that show up most and whether they line up with good or bad days\n4. Sleep, stress and water trends where I recorded them\n5. Two or three gentle, practical suggestions\n\nUse get_daily_series with days={days} for the chart data, get_mood_summary for the distribution and tags, and get_weekly_report when the window is a week. Treat placeholder values on days marked not present as missing, not as zero."
            ),
        )])
    .with_description(format!("Mood review over the past {} days", days))
}

pub fn mood_check_in_prompt(mood: Mood, locale: Locale) -> GetPromptResult {
    let ideas = suggestions(mood, locale)
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");
    GetPromptResult::new(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "I'm feeling \"{}\" right now.\n\nAsk me briefly what contributed to it and whether I slept well, then offer one of these ideas:\n{ideas}\n\nOffer to record the entry with log_mood (mood \"{}\") including any tags, sleep hours, stress level (1-5) or water intake I mention.",
                mood.label(locale),
                mood.as_str()
            ),
        )])
    .with_description(format!("Check-in for a {} mood", mood.label(Locale::En)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_in_lists_localized_suggestions() {
        let p = mood_check_in_prompt(Mood::Bad, Locale::Tr);
        let text = serde_json::to_string(&p.messages).unwrap();
        assert!(text.contains("Kötü"));
        assert!(text.contains(suggestions(Mood::Bad, Locale::Tr)[0]));
    }

    #[test]
    fn review_mentions_window() {
        let p = weekly_mood_review_prompt("u1", 30);
        assert_eq!(
            p.description.as_deref(),
            Some("Mood review over the past 30 days")
        );
    }
}
