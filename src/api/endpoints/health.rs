//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::models::LetterSource;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub has_anthropic_key: bool,
    pub mailer: &'static str,
    pub uptime_secs: u64,
}

/// `GET /api/health`: liveness plus which integrations are configured.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: crate::config::APP_VERSION,
        has_anthropic_key: ctx.core.letters.source() == LetterSource::Anthropic,
        mailer: ctx.core.auth.mailer_name(),
        uptime_secs: ctx.core.uptime_secs(),
    })
}
