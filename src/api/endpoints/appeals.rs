//! Appeal endpoints.
//!
//! - `GET /api/appeals`: newest submission first, with `daysToDecision`
//! - `POST /api/appeals`: file an appeal; the claim becomes `appealed`
//! - `PATCH /api/appeals/:id`: record a decision
//! - `POST /api/appeals/generate`: draft an appeal letter
//! - `POST /api/appeals/generate/stream`: same letter as server-sent events

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::letters::{GeneratedLetter, LetterError, LetterFields, LetterGenerator};
use crate::models::{Appeal, AppealStatus, AppealUpdate, LetterSource, NewAppeal};

/// Buffered chunks between the generator and a slow client.
const STREAM_BUFFER: usize = 64;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppealRequest {
    pub claim_id: Option<String>,
    pub patient: Option<String>,
    pub amount: Option<f64>,
    pub payer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppealRequest {
    pub status: Option<String>,
    pub recovered_amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub claim: Option<LetterFields>,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Appeal>>, ApiError> {
    let conn = ctx.core.db.conn()?;
    Ok(Json(repository::list_appeals(&conn)?))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    body: Result<Json<CreateAppealRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appeal>), ApiError> {
    let Json(req) = body?;
    let claim_id = req
        .claim_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("claimId is required".into()))?;
    if req.amount.is_some_and(|a| !a.is_finite() || a <= 0.0) {
        return Err(ApiError::BadRequest("Amount must be greater than zero".into()));
    }

    let new_appeal = NewAppeal {
        claim_id,
        patient: req.patient.filter(|p| !p.trim().is_empty()),
        amount: req.amount,
        payer: req.payer.filter(|p| !p.trim().is_empty()),
    };

    let conn = ctx.core.db.conn()?;
    let appeal = repository::create_appeal(&conn, &new_appeal, today())?;
    Ok((StatusCode::CREATED, Json(appeal)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAppealRequest>, JsonRejection>,
) -> Result<Json<Appeal>, ApiError> {
    let Json(req) = body?;
    let raw = req
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or(ApiError::BadRequest("Status is required".into()))?;
    let status = AppealStatus::from_str(raw.trim())?;
    if req.recovered_amount.is_some_and(|a| !a.is_finite() || a < 0.0) {
        return Err(ApiError::BadRequest(
            "Recovered amount cannot be negative".into(),
        ));
    }

    let update = AppealUpdate {
        status,
        recovered_amount: req.recovered_amount,
    };

    let conn = ctx.core.db.conn()?;
    let appeal = repository::update_appeal(&conn, &id, &update, today())?
        .ok_or_else(|| ApiError::NotFound("Appeal not found".into()))?;
    tracing::info!(appeal_id = %appeal.id, status = %appeal.status, "Appeal updated");
    Ok(Json(appeal))
}

/// `POST /api/appeals/generate`: `{ letter, source }`.
pub async fn generate(
    State(ctx): State<ApiContext>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GeneratedLetter>, ApiError> {
    let fields = letter_fields(body)?;
    let generator = &ctx.core.letters;
    let letter = generator.generate(&fields).await?;
    tracing::info!(claim_id = %fields.id, source = %generator.source(), "Appeal letter generated");
    Ok(Json(GeneratedLetter {
        letter,
        source: generator.source(),
    }))
}

/// `POST /api/appeals/generate/stream`: `token` events carry text as it
/// is produced, then one `done` event with the full letter (or `error`).
pub async fn generate_stream(
    State(ctx): State<ApiContext>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let fields = letter_fields(body)?;
    let generator: Arc<dyn LetterGenerator> = ctx.core.letters.clone();
    let source = generator.source();

    let (tx, rx) = mpsc::channel::<String>(STREAM_BUFFER);
    let handle: JoinHandle<Result<String, LetterError>> =
        tokio::spawn(async move { generator.generate_streaming(&fields, tx).await });

    let events = stream::unfold(
        (rx, Some(handle)),
        move |(mut rx, handle)| async move {
            if let Some(chunk) = rx.recv().await {
                // SSE fields cannot carry carriage returns
                let event = Event::default()
                    .event("token")
                    .data(chunk.replace('\r', ""));
                return Some((Ok::<_, Infallible>(event), (rx, handle)));
            }
            let Some(handle) = handle else {
                return None;
            };
            let event = finish_event(handle.await, source);
            Some((Ok(event), (rx, None)))
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn finish_event(
    outcome: Result<Result<String, LetterError>, tokio::task::JoinError>,
    source: LetterSource,
) -> Event {
    let failure = match outcome {
        Ok(Ok(letter)) => {
            let done = GeneratedLetter { letter, source };
            match Event::default().event("done").json_data(&done) {
                Ok(event) => return event,
                Err(e) => e.to_string(),
            }
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => e.to_string(),
    };
    tracing::error!(detail = %failure, "Failed to generate appeal letter");
    Event::default()
        .event("error")
        .data("Failed to generate appeal letter")
}

fn letter_fields(
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<LetterFields, ApiError> {
    let Json(req) = body?;
    req.claim
        .ok_or(ApiError::BadRequest("Claim details are required".into()))
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
