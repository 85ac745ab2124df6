use std::sync::Arc;

use log::{debug, info, warn};
use quiz_core::model::{SessionConfig, SessionResults};
use quiz_core::{
    AdvanceOutcome, AnswerChoice, Clock, QuizSession, SubmitOutcome, TickOutcome,
};
use storage::repository::ResultsRepository;

use crate::error::ControllerError;
use crate::questions::{GenerationRequest, QuestionSupplier};

/// What `apply_config` did with a new configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// No session was running (or it had finished); the next start uses it.
    Applied,
    /// A session is mid-flight; the config waits until it finishes.
    Deferred,
}

/// Drives quiz attempts for a host: fetches questions, runs the state
/// machine, and persists results once a session finishes.
pub struct QuizController {
    clock: Clock,
    supplier: Arc<dyn QuestionSupplier>,
    results: Arc<dyn ResultsRepository>,
    config: SessionConfig,
    pending_config: Option<SessionConfig>,
    session: Option<QuizSession>,
    persisted_id: Option<i64>,
}

impl QuizController {
    #[must_use]
    pub fn new(
        clock: Clock,
        supplier: Arc<dyn QuestionSupplier>,
        results: Arc<dyn ResultsRepository>,
        config: SessionConfig,
    ) -> Self {
        Self {
            clock,
            supplier,
            results,
            config,
            pending_config: None,
            session: None,
            persisted_id: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn pending_config(&self) -> Option<&SessionConfig> {
        self.pending_config.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Replace the configuration, but only at a safe boundary: before the
    /// first session or after the current one finished. Otherwise the change
    /// is held back and applied when the running session ends.
    pub fn apply_config(&mut self, config: SessionConfig) -> ConfigChange {
        let running = self.session.as_ref().is_some_and(|s| !s.is_terminal());
        if running {
            debug!("deferring config change until the running session finishes");
            self.pending_config = Some(config);
            ConfigChange::Deferred
        } else {
            self.config = config;
            self.pending_config = None;
            ConfigChange::Applied
        }
    }

    /// Fetch questions and start a fresh session, discarding any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Generation` if the supplier fails and
    /// `ControllerError::Session` if it returned no questions.
    pub async fn start_session(&mut self) -> Result<&QuizSession, ControllerError> {
        self.session = None;
        self.persisted_id = None;
        self.promote_pending_config();

        let request = GenerationRequest::from_config(&self.config);
        let questions = self.supplier.generate_questions(&request).await?;
        if questions.len() != usize::try_from(request.count).unwrap_or(usize::MAX) {
            warn!(
                "supplier returned {} questions, {} requested",
                questions.len(),
                request.count
            );
        }

        let session = QuizSession::start(self.config.clone(), questions, self.clock.now())?;
        info!(
            "session {} started: {} {} questions on {}",
            session.id(),
            session.questions().len(),
            request.difficulty,
            request.category
        );
        Ok(self.session.insert(session))
    }

    pub fn submit_answer(&mut self, choice: AnswerChoice) -> SubmitOutcome {
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::Ignored;
        };
        let outcome = session.submit_answer(choice);
        if let SubmitOutcome::Accepted { is_correct, points_awarded } = outcome {
            debug!(
                "question {} answered: correct={is_correct} points={points_awarded}",
                session.current_index()
            );
        }
        outcome
    }

    pub fn tick(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Ignored;
        };
        let outcome = session.tick();
        if outcome == TickOutcome::TimedOut {
            debug!("question {} timed out", session.current_index());
        }
        outcome
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return AdvanceOutcome::Ignored;
        };
        let outcome = session.advance(now);
        if outcome == AdvanceOutcome::Finished {
            info!("session {} finished with score {}", session.id(), session.score());
            self.promote_pending_config();
        }
        outcome
    }

    pub fn reveal_hint(&mut self) -> Option<&str> {
        self.session.as_mut()?.reveal_hint()
    }

    /// Results of the current session if it has finished.
    #[must_use]
    pub fn results(&self) -> Option<SessionResults> {
        self.session.as_ref()?.compute_results()
    }

    /// Persist the finished session's results. Later calls return the same row id.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::NoSession` / `NotFinished` when there is nothing
    /// to persist yet, or `ControllerError::Storage` if persistence fails.
    pub async fn finish(&mut self) -> Result<(i64, SessionResults), ControllerError> {
        let session = self.session.as_ref().ok_or(ControllerError::NoSession)?;
        let results = session
            .compute_results()
            .ok_or(ControllerError::NotFinished)?;

        if let Some(id) = self.persisted_id {
            return Ok((id, results));
        }

        let id = match self.results.find_by_session(results.session_id()).await? {
            Some(row) => row.id,
            None => self.results.append_results(&results).await?,
        };
        info!("session {} results stored as #{id}", results.session_id());
        self.persisted_id = Some(id);
        Ok((id, results))
    }

    fn promote_pending_config(&mut self) {
        if let Some(config) = self.pending_config.take() {
            debug!("applying deferred config change");
            self.config = config;
        }
    }
}
