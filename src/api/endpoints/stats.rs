//! `GET /api/stats`: portfolio totals and appeal success rate.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::stats::{compute_stats, Stats};

pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<Stats>, ApiError> {
    let conn = ctx.core.db.conn()?;
    Ok(Json(compute_stats(&conn)?))
}
