use actix_web::{web, HttpResponse};
use serde_json::json;

use super::error::ApiError;
use super::AppState;

/// GET /api/health
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "UP",
        "application": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health/detailed
pub async fn detailed(state: web::Data<AppState>) -> HttpResponse {
    let report = state.health.check().await;
    let overall = report.overall();

    let components: serde_json::Map<String, serde_json::Value> = report
        .components
        .iter()
        .map(|c| {
            let mut entry = json!({
                "status": c.status.as_str(),
                "checkedAt": c.last_check,
            });
            if let Some(reason) = c.status.reason() {
                entry["details"] = json!(reason);
            }
            (c.name.clone(), entry)
        })
        .collect();

    let body = json!({
        "status": overall.as_str(),
        "application": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "components": components,
    });

    if overall.is_down() {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

/// GET /metrics
pub async fn metrics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let body = state.metrics.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}
