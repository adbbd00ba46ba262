// ============================================================================
// HTTP API (actix-web)
// ============================================================================
//
// Thin boundary over OrderLifecycleManager: request validation, the JSON
// envelope and error → status mapping live here, business rules do not.
//
// Literal routes (/recent, /search, ...) are registered before /{id} so they
// are never captured as an id.
//
// ============================================================================

pub mod dto;
pub mod error;
mod health;
mod orders;

use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use crate::domain::order::OrderLifecycleManager;
use crate::health::HealthChecker;
use crate::metrics::Metrics;

pub use error::ApiError;

pub struct AppState {
    pub manager: Arc<OrderLifecycleManager>,
    pub health: HealthChecker,
    pub metrics: Arc<Metrics>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Malformed bodies, query strings and path ids get the same envelope as validation errors
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
    )
    .service(
        web::scope("/api/orders")
            .route("", web::post().to(orders::create))
            .route("", web::get().to(orders::list))
            .route("/recent", web::get().to(orders::recent))
            .route("/search", web::get().to(orders::search))
            .route("/range", web::get().to(orders::range))
            .route("/summary", web::get().to(orders::summary))
            .route("/status/{status}", web::get().to(orders::by_status))
            .route("/{id}", web::get().to(orders::get))
            .route("/{id}", web::delete().to(orders::cancel))
            .route("/{id}/status", web::patch().to(orders::update_status)),
    )
    .route("/api/health", web::get().to(health::liveness))
    .route("/api/health/detailed", web::get().to(health::detailed))
    .route("/metrics", web::get().to(health::metrics));
}

/// Serve the API until the process is stopped.
pub async fn run(state: AppState, address: &str) -> std::io::Result<()> {
    let state = web::Data::new(state);
    tracing::info!("🌐 Starting HTTP server on http://{}", address);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(address)?
        .run()
        .await
}
