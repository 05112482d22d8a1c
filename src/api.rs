// src/api.rs
use std::sync::Arc;

use actix_web::{error::InternalError, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::brain::ChatTurn;
use crate::curated::{CuratedStore, NewCuratedLink};
use crate::error::{ApiError, StoreError};
use crate::resolver::Resolver;

// Shared State for the Server
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub curated: Arc<dyn CuratedStore>,
}

// 1. The Request Format
#[derive(Deserialize)]
pub struct GovLinkRequest {
    pub query: String,
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
}

/// Routes plus JSON error handling. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": format!("Malformed request body: {}", err) });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_config)
        .service(
            web::resource("/api/govlink")
                .route(web::post().to(resolve_query))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/api/curated")
                .route(web::post().to(add_curated_link))
                .default_service(web::to(method_not_allowed)),
        )
        .route("/api/health", web::get().to(health));
}

// POST /api/govlink
pub async fn resolve_query(
    data: web::Data<AppState>,
    req: web::Json<GovLinkRequest>,
) -> Result<HttpResponse, ApiError> {
    let GovLinkRequest { query, messages } = req.into_inner();
    tracing::info!(query = %query, history = messages.len(), "Incoming query");

    let outcome = data.resolver.resolve(&query, &messages).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

// POST /api/curated
pub async fn add_curated_link(
    data: web::Data<AppState>,
    req: web::Json<NewCuratedLink>,
) -> Result<HttpResponse, ApiError> {
    let entry = req
        .into_inner()
        .into_entry()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match data.curated.append(entry).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "message": "Link added successfully!" }))),
        Err(StoreError::InvalidEntry(msg)) => Err(ApiError::BadRequest(msg)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to add curated link");
            Err(ApiError::Internal("Failed to add curated link".to_string()))
        }
    }
}

// GET /api/health
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().json(json!({ "error": "Method not allowed" }))
}
