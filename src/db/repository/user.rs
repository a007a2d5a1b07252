use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.password_hash,
            user.name,
            user.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("email already registered: {}", user.email))
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    query_user(conn, "WHERE id = ?1", &id.to_string())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    query_user(conn, "WHERE email = ?1", email)
}

/// Store a pending reset token, replacing any previous one.
pub fn set_reset_token(
    conn: &Connection,
    id: &Uuid,
    token: &str,
    expires: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET reset_token = ?1, reset_token_expires = ?2 WHERE id = ?3",
        params![
            token,
            expires.format(TIMESTAMP_FORMAT).to_string(),
            id.to_string()
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Replace the password hash and invalidate the reset token, but only if
/// `token` is still the stored one and has not expired at `now`.
///
/// Returns `false` when nothing matched. The check and the write are a
/// single statement, so two concurrent resets cannot both succeed.
pub fn consume_reset_token(
    conn: &Connection,
    id: &Uuid,
    token: &str,
    new_password_hash: &str,
    now: NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE users
         SET password_hash = ?1, reset_token = NULL, reset_token_expires = NULL
         WHERE id = ?2 AND reset_token = ?3 AND reset_token_expires > ?4",
        params![
            new_password_hash,
            id.to_string(),
            token,
            now.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(updated == 1)
}

fn query_user(conn: &Connection, clause: &str, arg: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT id, email, password_hash, name, created_at, reset_token, reset_token_expires
         FROM users {clause}"
    );
    let row = conn
        .query_row(&sql, params![arg], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })
        .optional()?;

    let Some((id, email, password_hash, name, created_at, reset_token, reset_expires)) = row else {
        return Ok(None);
    };

    Ok(Some(User {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        email,
        password_hash,
        name,
        created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
        reset_token,
        reset_token_expires: reset_expires
            .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()),
    }))
}
