use rusqlite::Connection;

use crate::db::DatabaseError;
use crate::models::*;

pub fn list_payers(conn: &Connection) -> Result<Vec<Payer>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, fax, email, address, appeals_address, website,
                avg_response_days, committed_response_days
         FROM payers ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Payer {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            fax: row.get(3)?,
            email: row.get(4)?,
            address: row.get(5)?,
            appeals_address: row.get(6)?,
            website: row.get(7)?,
            avg_response_days: row.get(8)?,
            committed_response_days: row.get(9)?,
        })
    })?;

    let mut payers = Vec::new();
    for row in rows {
        payers.push(row?);
    }
    Ok(payers)
}
