use quiz_core::model::{Category, Difficulty, SessionId, SessionResults};
use sqlx::Row;

use crate::repository::{ResultsRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_results_row(row: &sqlx::sqlite::SqliteRow) -> Result<ResultsRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let session_id: SessionId = row
        .try_get::<String, _>("session_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let category = Category::new(row.try_get::<String, _>("category").map_err(ser)?).map_err(ser)?;
    let difficulty: Difficulty = row
        .try_get::<String, _>("difficulty")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let count = |field: &'static str| -> Result<u32, StorageError> {
        u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
    };

    let results = SessionResults::from_persisted(
        session_id,
        category,
        difficulty,
        started_at,
        completed_at,
        count("total_questions")?,
        count("correct_answers")?,
        count("score")?,
        count("best_streak")?,
        count("hints_used")?,
    )
    .map_err(ser)?;

    Ok(ResultsRow::new(id, results))
}
