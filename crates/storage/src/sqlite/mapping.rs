use sqlx::Row;
use tutor_core::model::{Language, LearningSession, SessionId, User, UserId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps write failures, turning unique-constraint violations into `Conflict`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

fn counter(row: &sqlx::sqlite::SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    let language: String = row.try_get("preferred_language").map_err(ser)?;
    let preferred_language = language.parse::<Language>().map_err(ser)?;

    Ok(User::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get("username").map_err(ser)?,
        row.try_get("email").map_err(ser)?,
        preferred_language,
        counter(row, "total_score")?,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LearningSession, StorageError> {
    LearningSession::from_persisted(
        session_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get("subject").map_err(ser)?,
        row.try_get("start_time").map_err(ser)?,
        row.try_get("end_time").map_err(ser)?,
        counter(row, "problems_attempted")?,
        counter(row, "problems_solved")?,
        counter(row, "hints_used")?,
        counter(row, "score")?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
