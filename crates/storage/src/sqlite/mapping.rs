use quiz_core::model::{EntryId, LeaderboardEntry, QuizId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn percentage_from_i64(v: i64) -> Result<u8, StorageError> {
    u8::try_from(v)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| StorageError::Serialization(format!("invalid percentage: {v}")))
}

pub(crate) fn map_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<LeaderboardEntry, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(LeaderboardEntry {
        id: EntryId::new(id.to_string()),
        quiz_id: QuizId::new(row.try_get::<String, _>("quiz_id").map_err(ser)?),
        name: row.try_get("name").map_err(ser)?,
        email: row.try_get("email").map_err(ser)?,
        points: u32_from_i64("points", row.try_get::<i64, _>("points").map_err(ser)?)?,
        percentage: percentage_from_i64(row.try_get::<i64, _>("percentage").map_err(ser)?)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        submitted_at: row.try_get("submitted_at").map_err(ser)?,
    })
}
