#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod session;
pub mod time;

pub use error::Error;
pub use session::{
    AdvanceOutcome, AnswerChoice, AnswerRecord, QuizSession, SessionError, SessionPhase,
    SessionProgress, SubmitOutcome, TickOutcome,
};
pub use time::Clock;
