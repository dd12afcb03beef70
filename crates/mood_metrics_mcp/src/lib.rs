use std::sync::Arc;

use chrono::{DateTime, Utc};
use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    GetPromptRequestParams, GetPromptResult, ListPromptsResult, PaginatedRequestParams,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer};
use rmcp::{prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mood_metrics::config::AggregatorConfig;
use mood_metrics::labels::{Locale, suggestions};
use mood_metrics::{
    DailySeries, Mood, MoodPatch, MoodRecord, MoodStore, MoodSummary, NewMoodRecord,
};

pub mod error;
pub mod middleware;
mod prompts;
pub mod services;

use error::McpError;
use services::{MoodTracker, WeeklyReport};

pub use mood_metrics::MAX_WINDOW_DAYS;

#[derive(Clone)]
pub struct MoodMetricsHandler {
    tracker: MoodTracker,
    tool_router: rmcp::handler::server::tool::ToolRouter<MoodMetricsHandler>,
    prompt_router: rmcp::handler::server::router::prompt::PromptRouter<MoodMetricsHandler>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct LogMoodParams {
    pub user_id: String,
    /// very_bad, bad, neutral, good, very_good, a 1-5 score, or a display label
    pub mood: String,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub sleep_hours: Option<f64>,
    /// 1 (calm) to 5 (very stressed)
    pub stress_level: Option<u8>,
    pub water_intake_liters: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateMoodParams {
    pub id: String,
    pub mood: Option<String>,
    pub note: Option<String>,
    /// Replaces the stored tags
    pub tags: Option<Vec<String>>,
    pub sleep_hours: Option<f64>,
    pub stress_level: Option<u8>,
    pub water_intake_liters: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RecordIdParam {
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WindowParams {
    pub user_id: String,
    /// Window length in days, ending today (defaults to the server setting)
    pub days: Option<u32>,
    /// Instant the window ends at (RFC 3339, defaults to now)
    pub reference: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ReportParams {
    pub user_id: String,
    pub reference: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SuggestionParams {
    pub mood: String,
    /// en or tr
    pub locale: Option<Locale>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SuggestionsResult {
    pub mood: Mood,
    pub label: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WeeklyMoodReviewParams {
    pub user_id: String,
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MoodCheckInParams {
    pub mood: String,
    pub locale: Option<Locale>,
}

fn parse_mood(raw: &str) -> Result<Mood, McpError> {
    Ok(raw.parse::<Mood>()?)
}

#[tool_router]
#[prompt_router]
impl MoodMetricsHandler {
    pub fn new(store: Arc<dyn MoodStore>, config: AggregatorConfig) -> Self {
        Self::from_tracker(MoodTracker::new(store, config))
    }

    pub fn from_tracker(tracker: MoodTracker) -> Self {
        Self {
            tracker,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompt_router.list_all().len()
    }

    fn bounded_window(&self, days: Option<u32>) -> Result<mood_metrics::Window, McpError> {
        let window = self.tracker.window(days);
        match window.days() {
            1..=MAX_WINDOW_DAYS => Ok(window),
            n => Err(McpError::InvalidArgument(format!(
                "days must be between 1 and {MAX_WINDOW_DAYS}, got {n}"
            ))),
        }
    }

    fn locale(&self, requested: Option<Locale>) -> Locale {
        requested.unwrap_or(self.tracker.config().series.locale)
    }

    #[tool(
        name = "log_mood",
        description = "Record a mood entry with optional note, tags and daily metrics"
    )]
    pub async fn log_mood(
        &self,
        params: Parameters<LogMoodParams>,
    ) -> Result<Json<MoodRecord>, String> {
        let p = params.0;
        let record = NewMoodRecord {
            user_id: p.user_id,
            mood: Some(parse_mood(&p.mood)?),
            note: p.note,
            tags: p.tags.unwrap_or_default(),
            sleep_hours: p.sleep_hours,
            stress_level: p.stress_level,
            water_intake_liters: p.water_intake_liters,
        };
        let created = self.tracker.log_mood(record).await?;
        Ok(Json(created))
    }

    #[tool(
        name = "update_mood",
        description = "Change fields of an existing mood entry"
    )]
    pub async fn update_mood(
        &self,
        params: Parameters<UpdateMoodParams>,
    ) -> Result<Json<MoodRecord>, String> {
        let p = params.0;
        let patch = MoodPatch {
            mood: p.mood.as_deref().map(parse_mood).transpose()?,
            note: p.note,
            tags: p.tags,
            sleep_hours: p.sleep_hours,
            stress_level: p.stress_level,
            water_intake_liters: p.water_intake_liters,
        };
        let updated = self.tracker.update_mood(&p.id, patch).await?;
        Ok(Json(updated))
    }

    #[tool(name = "delete_mood", description = "Delete a mood entry by id")]
    pub async fn delete_mood(
        &self,
        params: Parameters<RecordIdParam>,
    ) -> Result<Json<DeleteResult>, String> {
        let id = params.0.id;
        self.tracker.delete_mood(&id).await?;
        Ok(Json(DeleteResult { id, deleted: true }))
    }

    #[tool(
        name = "get_mood_summary",
        description = "Mood distribution, average mood (1-5) and most common tags over a trailing window"
    )]
    pub async fn get_mood_summary(
        &self,
        params: Parameters<WindowParams>,
    ) -> Result<Json<MoodSummary>, String> {
        let p = params.0;
        let window = self.bounded_window(p.days)?;
        let reference = p.reference.unwrap_or_else(Utc::now);
        let summary = self.tracker.summary(&p.user_id, window, reference).await?;
        Ok(Json(summary))
    }

    #[tool(
        name = "get_daily_series",
        description = "One value per day for mood, sleep, stress and water over a trailing window, oldest first"
    )]
    pub async fn get_daily_series(
        &self,
        params: Parameters<WindowParams>,
    ) -> Result<Json<DailySeries>, String> {
        let p = params.0;
        let window = self.bounded_window(p.days)?;
        let reference = p.reference.unwrap_or_else(Utc::now);
        let series = self
            .tracker
            .daily_series(&p.user_id, window, reference)
            .await?;
        Ok(Json(series))
    }

    #[tool(
        name = "get_weekly_report",
        description = "Seven-day chart series, mood summary and sleep/stress/water statistics"
    )]
    pub async fn get_weekly_report(
        &self,
        params: Parameters<ReportParams>,
    ) -> Result<Json<WeeklyReport>, String> {
        let p = params.0;
        let reference = p.reference.unwrap_or_else(Utc::now);
        let report = self.tracker.weekly_report(&p.user_id, reference).await?;
        Ok(Json(report))
    }

    #[tool(
        name = "get_mood_suggestions",
        description = "Activity suggestions for a mood, in English or Turkish"
    )]
    pub async fn get_mood_suggestions(
        &self,
        params: Parameters<SuggestionParams>,
    ) -> Result<Json<SuggestionsResult>, String> {
        let p = params.0;
        let mood = parse_mood(&p.mood)?;
        let locale = self.locale(p.locale);
        Ok(Json(SuggestionsResult {
            mood,
            label: mood.label(locale).to_string(),
            suggestions: suggestions(mood, locale)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }))
    }

    // === MCP Prompts ===

    #[prompt(
        name = "weekly-mood-review",
        description = "Review mood, tags and daily metrics over a recent window"
    )]
    async fn weekly_mood_review(
        &self,
        params: Parameters<WeeklyMoodReviewParams>,
    ) -> GetPromptResult {
        let days = params.0.days.unwrap_or(self.tracker.config().window_days);
        prompts::weekly_mood_review_prompt(&params.0.user_id, days)
    }

    #[prompt(
        name = "mood-check-in",
        description = "Short check-in conversation for the mood the user reports"
    )]
    async fn mood_check_in(
        &self,
        params: Parameters<MoodCheckInParams>,
    ) -> Result<GetPromptResult, ErrorData> {
        let mood = parse_mood(&params.0.mood)
            .map_err(|e| ErrorData::invalid_params(String::from(e), None))?;
        Ok(prompts::mood_check_in_prompt(
            mood,
            self.locale(params.0.locale),
        ))
    }
}

#[tool_handler]
#[prompt_handler(router = self.prompt_router)]
impl rmcp::ServerHandler for MoodMetricsHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
        )
        .with_instructions(
            "Mood metrics MCP server - log daily moods with sleep, stress and water \
             intake, and get per-day chart series, summaries and suggestions.",
        )
    }
}
