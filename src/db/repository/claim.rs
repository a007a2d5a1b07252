use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_business_id, next_sequence_value, parse_date, parse_optional_date, CLAIM_SEQUENCE};
use crate::db::DatabaseError;
use crate::models::*;

const CLAIM_SELECT: &str = "SELECT c.id, c.patient, c.amount, c.payer, c.denial_reason,
        c.denied_date, c.deadline, c.status, c.patient_email, c.patient_phone,
        c.service_date, c.service_code, c.diagnosis_code,
        p.phone, p.email, p.fax, p.appeals_address,
        p.avg_response_days, p.committed_response_days
     FROM claims c LEFT JOIN payers p ON c.payer = p.name";

/// All claims, most recently denied first, with payer contact joined by name.
pub fn list_claims(conn: &Connection) -> Result<Vec<Claim>, DatabaseError> {
    let sql = format!("{CLAIM_SELECT} ORDER BY c.denied_date DESC, c.seq DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], claim_row)?;

    let mut claims = Vec::new();
    for row in rows {
        claims.push(claim_from_row(row?)?);
    }
    Ok(claims)
}

pub fn get_claim(conn: &Connection, id: &str) -> Result<Option<Claim>, DatabaseError> {
    let sql = format!("{CLAIM_SELECT} WHERE c.id = ?1");
    let row = conn.query_row(&sql, params![id], claim_row).optional()?;
    row.map(claim_from_row).transpose()
}

/// Insert a claim under the next `CLM-NNN` id. Status starts as pending.
pub fn insert_claim(conn: &Connection, new: &NewClaim) -> Result<Claim, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let seq = next_sequence_value(&tx, CLAIM_SEQUENCE)?;
    let id = format_business_id("CLM", seq);

    tx.execute(
        "INSERT INTO claims (id, patient, amount, payer, denial_reason, denied_date, deadline,
         status, patient_email, patient_phone, service_date, service_code, diagnosis_code, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            id,
            new.patient,
            new.amount,
            new.payer,
            new.denial_reason,
            new.denied_date.to_string(),
            new.deadline.to_string(),
            ClaimStatus::Pending.as_str(),
            new.patient_email,
            new.patient_phone,
            new.service_date.map(|d| d.to_string()),
            new.service_code,
            new.diagnosis_code,
            seq,
        ],
    )?;

    let claim = get_claim(&tx, &id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "claim".into(),
        id: id.clone(),
    })?;
    tx.commit()?;

    tracing::debug!(claim_id = %claim.id, "claim inserted");
    Ok(claim)
}

/// Set a claim's status. Returns `None` when the claim doesn't exist.
pub fn update_claim_status(
    conn: &Connection,
    id: &str,
    status: ClaimStatus,
) -> Result<Option<Claim>, DatabaseError> {
    let updated = conn.execute(
        "UPDATE claims SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_claim(conn, id)
}

type ClaimRow = (
    String,
    String,
    f64,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    PayerContact,
);

fn claim_row(row: &Row<'_>) -> rusqlite::Result<ClaimRow> {
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
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        PayerContact {
            phone: row.get(13)?,
            email: row.get(14)?,
            fax: row.get(15)?,
            appeals_address: row.get(16)?,
            avg_response_days: row.get(17)?,
            committed_response_days: row.get(18)?,
        },
    ))
}

fn claim_from_row(row: ClaimRow) -> Result<Claim, DatabaseError> {
    let (
        id,
        patient,
        amount,
        payer,
        denial_reason,
        denied_date,
        deadline,
        status,
        patient_email,
        patient_phone,
        service_date,
        service_code,
        diagnosis_code,
        payer_contact,
    ) = row;

    Ok(Claim {
        id,
        patient,
        amount,
        payer,
        denial_reason,
        denied_date: parse_date("denied_date", &denied_date)?,
        deadline: parse_date("deadline", &deadline)?,
        status: ClaimStatus::from_str(&status)?,
        patient_email,
        patient_phone,
        service_date: parse_optional_date("service_date", service_date)?,
        service_code,
        diagnosis_code,
        // Soft reference: all contact fields stay null when the payer
        // has no row.
        payer_contact,
    })
}
