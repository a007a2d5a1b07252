use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    format_business_id, get_claim, next_sequence_value, parse_date, parse_optional_date,
    APPEAL_SEQUENCE,
};
use crate::db::DatabaseError;
use crate::models::*;

const APPEAL_SELECT: &str = "SELECT id, claim_id, patient, amount, payer, submitted_date,
        status, recovered_amount, decided_date
     FROM appeals";

/// All appeals, newest submission first. Same-day ties put the most
/// recently created appeal first.
pub fn list_appeals(conn: &Connection) -> Result<Vec<Appeal>, DatabaseError> {
    let sql = format!("{APPEAL_SELECT} ORDER BY submitted_date DESC, seq DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], appeal_row)?;

    let mut appeals = Vec::new();
    for row in rows {
        appeals.push(appeal_from_row(row?)?);
    }
    Ok(appeals)
}

pub fn get_appeal(conn: &Connection, id: &str) -> Result<Option<Appeal>, DatabaseError> {
    let sql = format!("{APPEAL_SELECT} WHERE id = ?1");
    let row = conn.query_row(&sql, params![id], appeal_row).optional()?;
    row.map(appeal_from_row).transpose()
}

/// File an appeal against a claim and mark the claim appealed.
///
/// Both writes share one transaction: an appeal never exists without its
/// claim showing `appealed`.
pub fn create_appeal(
    conn: &Connection,
    new: &NewAppeal,
    submitted: NaiveDate,
) -> Result<Appeal, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let claim = get_claim(&tx, &new.claim_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "claim".into(),
        id: new.claim_id.clone(),
    })?;

    let seq = next_sequence_value(&tx, APPEAL_SEQUENCE)?;
    let id = format_business_id("APL", seq);

    tx.execute(
        "INSERT INTO appeals (id, claim_id, patient, amount, payer, submitted_date, status, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            claim.id,
            new.patient.as_deref().unwrap_or(&claim.patient),
            new.amount.unwrap_or(claim.amount),
            new.payer.as_deref().unwrap_or(&claim.payer),
            submitted.to_string(),
            AppealStatus::Pending.as_str(),
            seq,
        ],
    )?;

    tx.execute(
        "UPDATE claims SET status = ?1 WHERE id = ?2",
        params![ClaimStatus::Appealed.as_str(), claim.id],
    )?;

    let appeal = get_appeal(&tx, &id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "appeal".into(),
        id: id.clone(),
    })?;
    tx.commit()?;

    tracing::info!(appeal_id = %appeal.id, claim_id = %appeal.claim_id, "appeal filed");
    Ok(appeal)
}

/// Apply a status change. The decided date is stamped with `today` when
/// the new status is terminal and cleared otherwise.
pub fn update_appeal(
    conn: &Connection,
    id: &str,
    update: &AppealUpdate,
    today: NaiveDate,
) -> Result<Option<Appeal>, DatabaseError> {
    let decided_date = update.status.is_decided().then(|| today.to_string());

    let updated = conn.execute(
        "UPDATE appeals SET status = ?1, recovered_amount = ?2, decided_date = ?3 WHERE id = ?4",
        params![update.status.as_str(), update.recovered_amount, decided_date, id],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_appeal(conn, id)
}

type AppealRow = (
    String,
    String,
    String,
    f64,
    String,
    String,
    String,
    Option<f64>,
    Option<String>,
);

fn appeal_row(row: &Row<'_>) -> rusqlite::Result<AppealRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn appeal_from_row(row: AppealRow) -> Result<Appeal, DatabaseError> {
    let (id, claim_id, patient, amount, payer, submitted, status, recovered_amount, decided) = row;

    let submitted_date = parse_date("submitted_date", &submitted)?;
    let decided_date = parse_optional_date("decided_date", decided)?;

    Ok(Appeal {
        id,
        claim_id,
        patient,
        amount,
        payer,
        submitted_date,
        status: AppealStatus::from_str(&status)?,
        recovered_amount,
        decided_date,
        days_to_decision: Appeal::compute_days_to_decision(submitted_date, decided_date),
    })
}
