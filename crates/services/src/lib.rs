#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod questions;
pub mod sessions;
pub mod settings;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, ControllerError, GenerationError, ResultsServiceError, SettingsError,
};
pub use questions::{
    ArithmeticSupplier, ChatQuestionSupplier, FallbackSupplier, GenerationRequest,
    QuestionSupplier, shuffle_options,
};
pub use sessions::{
    ConfigChange, QuizController, ResultsId, ResultsListItem, ResultsService, SharedSession,
};
pub use settings::{AiSettings, QuizSettings};
