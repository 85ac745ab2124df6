use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::SessionResults;
use quiz_core::{AdvanceOutcome, AnswerChoice, Clock, QuizSession, SubmitOutcome, TickOutcome};

/// A session shared between threads (e.g. an input task and a timer task).
///
/// Every transition runs under one mutex, so a tap and a timeout racing on
/// the same question still produce exactly one scoring event.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<QuizSession>>,
    clock: Clock,
}

impl SharedSession {
    #[must_use]
    pub fn new(session: QuizSession, clock: Clock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            clock,
        }
    }

    // Transitions never leave the session half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, QuizSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit_answer(&self, choice: AnswerChoice) -> SubmitOutcome {
        self.lock().submit_answer(choice)
    }

    pub fn tick(&self) -> TickOutcome {
        self.lock().tick()
    }

    pub fn advance(&self) -> AdvanceOutcome {
        let now = self.clock.now();
        self.lock().advance(now)
    }

    #[must_use]
    pub fn results(&self) -> Option<SessionResults> {
        self.lock().compute_results()
    }

    /// Run a read-only closure against the current state.
    pub fn inspect<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> R {
        f(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, Difficulty, QuestionDraft, QuestionId, SessionConfig};
    use quiz_core::time::fixed_now;
    use std::thread;

    fn session(time_limit: u32) -> QuizSession {
        let config = SessionConfig::new(
            Category::new("mixed").unwrap(),
            Difficulty::Easy,
            1,
            time_limit,
        )
        .unwrap();
        let question = QuestionDraft::new("1 + 1 = ?", vec!["2".into(), "3".into()], 0)
            .validate(QuestionId::new(1))
            .unwrap();
        QuizSession::start(config, vec![question], fixed_now()).unwrap()
    }

    #[test]
    fn racing_tap_and_timeout_score_once() {
        for _ in 0..50 {
            let shared = SharedSession::new(session(1), Clock::fixed(fixed_now()));

            let tapper = {
                let shared = shared.clone();
                thread::spawn(move || shared.submit_answer(AnswerChoice::Option(0)))
            };
            let timer = {
                let shared = shared.clone();
                thread::spawn(move || shared.tick())
            };
            let tap = tapper.join().unwrap();
            let tick = timer.join().unwrap();

            let tap_won = matches!(tap, SubmitOutcome::Accepted { .. });
            let timer_won = tick == TickOutcome::TimedOut;
            assert!(tap_won ^ timer_won);

            shared.inspect(|s| {
                assert_eq!(s.records().len(), 1);
                assert_eq!(s.score(), if tap_won { 10 } else { 0 });
            });
        }
    }

    #[test]
    fn finishes_through_shared_handle() {
        let shared = SharedSession::new(session(30), Clock::fixed(fixed_now()));
        shared.submit_answer(AnswerChoice::Option(0));
        assert_eq!(shared.advance(), AdvanceOutcome::Finished);
        let results = shared.results().unwrap();
        assert_eq!(results.correct_answers(), 1);
        assert_eq!(results.best_streak(), 1);
    }
}
