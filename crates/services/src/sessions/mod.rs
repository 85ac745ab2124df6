mod controller;
mod history;
mod shared;

// Public API of the session subsystem.
pub use controller::{ConfigChange, QuizController};
pub use history::{ResultsId, ResultsListItem, ResultsService};
pub use shared::SharedSession;
