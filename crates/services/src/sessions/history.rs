use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{Category, Difficulty, SessionId};
use storage::repository::{InMemoryRepository, ResultsRepository, ResultsRow};

use crate::error::ResultsServiceError;

/// Storage identifier for persisted session results (`SQLite` row id).
pub type ResultsId = i64;

/// Presentation-agnostic list item for a finished session.
///
/// No pre-formatted strings; hosts render accuracy and timestamps as they like.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsListItem {
    pub id: ResultsId,
    pub session_id: SessionId,
    pub category: Category,
    pub difficulty: Difficulty,
    pub completed_at: DateTime<Utc>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub score: u32,
    pub accuracy: f64,
    pub elapsed_seconds: u64,
}

impl ResultsListItem {
    #[must_use]
    pub fn from_row(row: &ResultsRow) -> Self {
        let results = &row.results;
        Self {
            id: row.id,
            session_id: results.session_id(),
            category: results.category().clone(),
            difficulty: results.difficulty(),
            completed_at: results.completed_at(),
            total_questions: results.total_questions(),
            correct_answers: results.correct_answers(),
            score: results.score(),
            accuracy: results.accuracy(),
            elapsed_seconds: results.elapsed_seconds(),
        }
    }
}

/// Read side of persisted results.
#[derive(Clone)]
pub struct ResultsService {
    results: Arc<dyn ResultsRepository>,
}

impl ResultsService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultsRepository>) -> Self {
        Self { results }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Most recent sessions across all categories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ResultsServiceError::Storage` on repository failures.
    pub async fn recent(&self, limit: u32) -> Result<Vec<ResultsListItem>, ResultsServiceError> {
        let rows = self.results.list_recent(None, limit).await?;
        Ok(rows.iter().map(ResultsListItem::from_row).collect())
    }

    /// Most recent sessions for one category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ResultsServiceError::Storage` on repository failures.
    pub async fn for_category(
        &self,
        category: &Category,
        limit: u32,
    ) -> Result<Vec<ResultsListItem>, ResultsServiceError> {
        let rows = self.results.list_recent(Some(category), limit).await?;
        Ok(rows.iter().map(ResultsListItem::from_row).collect())
    }

    /// Highest score ever recorded for a category.
    ///
    /// # Errors
    ///
    /// Returns `ResultsServiceError::Storage` on repository failures.
    pub async fn best_score(&self, category: &Category) -> Result<Option<u32>, ResultsServiceError> {
        let rows = self.results.list_recent(Some(category), u32::MAX).await?;
        Ok(rows.iter().map(|row| row.results.score()).max())
    }
}
