//! Claim endpoints.
//!
//! - `GET /api/claims`: all claims with payer contact, newest denial first
//! - `POST /api/claims`: record a denied claim
//! - `GET /api/claims/:id`
//! - `PATCH /api/claims/:id`: status change

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::{Claim, ClaimStatus, NewClaim};

const REQUIRED_FIELDS_MESSAGE: &str =
    "Patient, amount, payer, denialReason, deniedDate, and deadline are required";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub patient: Option<String>,
    pub amount: Option<f64>,
    pub payer: Option<String>,
    pub denial_reason: Option<String>,
    pub denied_date: Option<String>,
    pub deadline: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub service_date: Option<String>,
    pub service_code: Option<String>,
    pub diagnosis_code: Option<String>,
}

impl CreateClaimRequest {
    /// Check required fields and parse dates.
    pub fn validate(self) -> Result<NewClaim, ApiError> {
        let patient = non_empty(self.patient);
        let payer = non_empty(self.payer);
        let denial_reason = non_empty(self.denial_reason);
        let denied_date = non_empty(self.denied_date);
        let deadline = non_empty(self.deadline);

        let (
            Some(patient),
            Some(amount),
            Some(payer),
            Some(denial_reason),
            Some(denied_date),
            Some(deadline),
        ) = (patient, self.amount, payer, denial_reason, denied_date, deadline)
        else {
            return Err(ApiError::BadRequest(REQUIRED_FIELDS_MESSAGE.into()));
        };

        if !amount.is_finite() || amount <= 0.0 {
            return Err(ApiError::BadRequest("Amount must be greater than zero".into()));
        }

        Ok(NewClaim {
            patient,
            amount,
            payer,
            denial_reason,
            denied_date: parse_date_field("deniedDate", &denied_date)?,
            deadline: parse_date_field("deadline", &deadline)?,
            patient_email: non_empty(self.patient_email),
            patient_phone: non_empty(self.patient_phone),
            service_date: non_empty(self.service_date)
                .map(|d| parse_date_field("serviceDate", &d))
                .transpose()?,
            service_code: non_empty(self.service_code),
            diagnosis_code: non_empty(self.diagnosis_code),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateClaimRequest {
    pub status: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date_field(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a date (YYYY-MM-DD)")))
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Claim>>, ApiError> {
    let conn = ctx.core.db.conn()?;
    Ok(Json(repository::list_claims(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    body: Result<Json<CreateClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    let Json(req) = body?;
    let new_claim = req.validate()?;
    let conn = ctx.core.db.conn()?;
    let claim = repository::insert_claim(&conn, &new_claim)?;
    tracing::info!(claim_id = %claim.id, "Claim created");
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Claim>, ApiError> {
    let conn = ctx.core.db.conn()?;
    repository::get_claim(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Claim not found".into()))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateClaimRequest>, JsonRejection>,
) -> Result<Json<Claim>, ApiError> {
    let Json(req) = body?;
    let raw = non_empty(req.status).ok_or(ApiError::BadRequest("Status is required".into()))?;
    let status = ClaimStatus::from_str(&raw)?;

    let conn = ctx.core.db.conn()?;
    repository::update_claim_status(&conn, &id, status)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Claim not found".into()))
}
