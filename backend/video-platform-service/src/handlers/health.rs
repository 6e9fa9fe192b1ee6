/// Health endpoints for orchestration liveness and readiness checks
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

const SERVICE_NAME: &str = "video-platform-service";

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub postgresql: ComponentCheck,
    pub timestamp: String,
}

async fn check_postgres(state: &AppState) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1")
        .fetch_one(&state.db)
        .await
        .map(|_| ())
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match check_postgres(&state).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": SERVICE_NAME
        })),
    }
}

pub async fn readiness_check(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let result = check_postgres(&state).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, postgresql) = match result {
        Ok(_) => (
            true,
            ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms,
            },
        ),
        Err(e) => (
            false,
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms,
            },
        ),
    };

    let response = ReadinessResponse {
        ready,
        postgresql,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
