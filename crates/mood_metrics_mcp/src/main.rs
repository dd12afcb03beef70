use std::sync::Arc;

use mood_metrics::MoodStore;
use mood_metrics::config::{AggregatorConfig, FirestoreConfig};
use mood_metrics::http_client::FirestoreMoodStore;
use mood_metrics::memory::InMemoryMoodStore;
use mood_metrics_mcp::MoodMetricsHandler;
use mood_metrics_mcp::middleware::LoggingStore;

/// Firestore when a project is configured, otherwise a process-local store.
fn build_store() -> anyhow::Result<Arc<dyn MoodStore>> {
    let has_project = std::env::var("MOOD_FIRESTORE_PROJECT_ID")
        .map(|p| !p.trim().is_empty())
        .unwrap_or(false);
    if has_project {
        let config = FirestoreConfig::from_env()?;
        tracing::info!(
            "mood_metrics_mcp: using Firestore project {} collection {}",
            config.project_id,
            config.collection
        );
        Ok(Arc::new(LoggingStore::new(FirestoreMoodStore::new(
            config,
        )?)))
    } else {
        tracing::warn!(
            "mood_metrics_mcp: MOOD_FIRESTORE_PROJECT_ID not set, records are kept in memory only"
        );
        Ok(Arc::new(LoggingStore::new(InMemoryMoodStore::new())))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `MOOD_METRICS_LOG_LEVEL`, then `RUST_LOG`, then `info`.
    let log_env = std::env::var("MOOD_METRICS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // keep rmcp internals quiet by default
    let combined_filter = format!("{},rmcp=warn,serve_inner=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rmcp=warn,serve_inner=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("mood_metrics_mcp: log filter: {}", log_env);

    let config = AggregatorConfig::from_env()?;
    let store = build_store()?;
    let handler = MoodMetricsHandler::new(store, config);

    tracing::info!(
        "mood_metrics_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );
    tracing::info!("mood_metrics_mcp: starting stdio MCP server...");

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = rmcp::serve_server(handler, transport).await?;
    server.waiting().await?;

    Ok(())
}
