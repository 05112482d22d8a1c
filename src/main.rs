// src/main.rs
// GOVLINK CORE - API SERVER
// Serves the chat page and admin form via REST API (Actix-Web)

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use govlink_core::api::{self, AppState};
use govlink_core::brain::OpenAiBrain;
use govlink_core::curated::{CuratedStore, InMemoryCuratedStore};
use govlink_core::query_log::{CsvQueryLog, QueryLog, TracingQueryLog};
use govlink_core::{Config, Resolver};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "govlink_core=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 GovLink API Server Starting...");

    let config = Config::from_env().context("invalid configuration")?;

    // 1. Curated Codex
    let curated: Arc<dyn CuratedStore> = match &config.curated_path {
        Some(path) => Arc::new(
            InMemoryCuratedStore::from_json_file(path)
                .with_context(|| format!("failed to load curated links from {}", path.display()))?,
        ),
        None => {
            tracing::info!("No GOVLINK_CURATED_PATH set, using built-in curated links");
            Arc::new(InMemoryCuratedStore::seeded())
        }
    };

    // 2. Query Log
    let query_log: Arc<dyn QueryLog> = match &config.query_log_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Recording queries to CSV");
            Arc::new(
                CsvQueryLog::open(path)
                    .with_context(|| format!("failed to open query log {}", path.display()))?,
            )
        }
        None => {
            tracing::info!("No GOVLINK_QUERY_LOG_PATH set, recording queries to the tracing log");
            Arc::new(TracingQueryLog)
        }
    };

    // 3. Model Tiers
    let brain = OpenAiBrain::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.resolver.tier_timeout,
    )
    .context("failed to build HTTP client for model tiers")?;
    if !brain.has_api_key() {
        tracing::warn!("OPENAI_API_KEY not set; unmatched queries will get the fallback portal");
    }
    let models: Vec<&str> = config.resolver.tiers.iter().map(|t| t.model.as_str()).collect();
    tracing::info!(policy = %config.resolver.policy, tiers = ?models, "Resolution policy ready");

    // 4. Shared State
    let resolver = Arc::new(Resolver::new(
        curated.clone(),
        Arc::new(brain),
        query_log,
        config.resolver.clone(),
    ));
    let app_state = web::Data::new(AppState { resolver, curated });

    tracing::info!("🌍 Server running at http://{}:{}", config.host, config.port);

    // 5. Start HTTP Server
    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
