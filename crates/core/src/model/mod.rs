mod config;
mod ids;
mod question;
mod results;

pub use ids::{ParseIdError, QuestionId, SessionId};

pub use config::{Category, ConfigError, Difficulty, ScoringRules, SessionConfig};
pub use question::{Question, QuestionDraft, QuestionError};
pub use results::{ResultsError, SessionResults};
