//! `GET /api/payers`: payer directory, ordered by name.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::Payer;

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Payer>>, ApiError> {
    let conn = ctx.core.db.conn()?;
    Ok(Json(repository::list_payers(&conn)?))
}
