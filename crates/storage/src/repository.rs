use async_trait::async_trait;
use quiz_core::model::{Category, SessionId, SessionResults};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted results together with their storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsRow {
    pub id: i64,
    pub results: SessionResults,
}

impl ResultsRow {
    #[must_use]
    pub fn new(id: i64, results: SessionResults) -> Self {
        Self { id, results }
    }
}

/// Repository contract for finished session results.
#[async_trait]
pub trait ResultsRepository: Send + Sync {
    /// Append results for a finished session and return the new row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if results for the same session were already stored.
    async fn append_results(&self, results: &SessionResults) -> Result<i64, StorageError>;

    /// Fetch results by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_results(&self, id: i64) -> Result<SessionResults, StorageError>;

    /// Look up the row stored for a session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ResultsRow>, StorageError>;

    /// Most recently completed results first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn list_recent(
        &self,
        category: Option<&Category>,
        limit: u32,
    ) -> Result<Vec<ResultsRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    rows: Arc<Mutex<Vec<ResultsRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultsRepository for InMemoryRepository {
    async fn append_results(&self, results: &SessionResults) -> Result<i64, StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|row| row.results.session_id() == results.session_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("row id overflow".into()))?
            + 1;
        guard.push(ResultsRow::new(id, results.clone()));
        Ok(id)
    }

    async fn get_results(&self, id: i64) -> Result<SessionResults, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.results.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn find_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ResultsRow>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .find(|row| row.results.session_id() == session_id)
            .cloned())
    }

    async fn list_recent(
        &self,
        category: Option<&Category>,
        limit: u32,
    ) -> Result<Vec<ResultsRow>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<ResultsRow> = guard
            .iter()
            .filter(|row| category.is_none_or(|c| row.results.category() == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.results
                .completed_at()
                .cmp(&a.results.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn ResultsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let results: Arc<dyn ResultsRepository> = Arc::new(InMemoryRepository::new());
        Self { results }
    }
}
