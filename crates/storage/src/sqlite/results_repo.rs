use quiz_core::model::{Category, SessionId, SessionResults};

use super::SqliteRepository;
use super::mapping::map_results_row;
use crate::repository::{ResultsRepository, ResultsRow, StorageError};

const SELECT_COLUMNS: &str = r"
    SELECT
        id, session_id, category, difficulty, started_at, completed_at,
        total_questions, correct_answers, score, best_streak, hints_used
    FROM session_results
";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ResultsRepository for SqliteRepository {
    async fn append_results(&self, results: &SessionResults) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_results (
                    session_id, category, difficulty, started_at, completed_at,
                    total_questions, correct_answers, score, best_streak, hints_used
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(results.session_id().to_string())
        .bind(results.category().as_str())
        .bind(results.difficulty().as_str())
        .bind(results.started_at())
        .bind(results.completed_at())
        .bind(i64::from(results.total_questions()))
        .bind(i64::from(results.correct_answers()))
        .bind(i64::from(results.score()))
        .bind(i64::from(results.best_streak()))
        .bind(i64::from(results.hints_used()))
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_results(&self, id: i64) -> Result<SessionResults, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        Ok(map_results_row(&row)?.results)
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ResultsRow>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE session_id = ?1");
        let row = sqlx::query(&sql)
            .bind(session_id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_results_row).transpose()
    }

    async fn list_recent(
        &self,
        category: Option<&Category>,
        limit: u32,
    ) -> Result<Vec<ResultsRow>, StorageError> {
        let mut sql = String::from(SELECT_COLUMNS);
        if category.is_some() {
            sql.push_str(" WHERE category = ?1 ORDER BY completed_at DESC, id DESC LIMIT ?2");
        } else {
            sql.push_str(" ORDER BY completed_at DESC, id DESC LIMIT ?1");
        }

        let mut query = sqlx::query(&sql);
        if let Some(category) = category {
            query = query.bind(category.as_str());
        }
        query = query.bind(i64::from(limit));

        let rows = query
            .fetch_all(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_results_row(&row)?);
        }
        Ok(out)
    }
}
