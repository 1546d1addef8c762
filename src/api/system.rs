//! System endpoints: liveness and readiness for orchestration probes.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;
use crate::domain::ServiceResponse;

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub database: bool,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<ServiceResponse<HealthDto>> {
    let database = state.store.ping().await.is_ok();

    let dto = HealthDto {
        status: if database { "ok" } else { "degraded" },
        database,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    Json(ServiceResponse::ok(dto))
}
