use thiserror::Error;

use crate::model::{ConfigError, QuestionError, ResultsError};
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
