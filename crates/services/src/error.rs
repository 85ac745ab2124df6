//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::SessionError;
use quiz_core::model::{ConfigError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question suppliers. Propagated to the host unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("question generation is not configured")]
    Disabled,
    #[error("unsupported category: {0}")]
    UnsupportedCategory(String),
    #[error("{requested} questions requested, at most {max} allowed")]
    TooManyQuestions { requested: u32, max: u32 },
    #[error("question generator returned an empty response")]
    EmptyResponse,
    #[error("question generator returned malformed data: {0}")]
    Malformed(String),
    #[error("question generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidQuestion(#[from] QuestionError),
}

/// Errors emitted by `QuizController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("no quiz session has been started")]
    NoSession,
    #[error("quiz session is not finished yet")]
    NotFinished,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid value for {key}: {raw}")]
    InvalidValue { key: &'static str, raw: String },
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
