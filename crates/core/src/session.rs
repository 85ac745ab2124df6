//! Quiz session state machine.
//!
//! One `QuizSession` drives a single attempt from the first question to the
//! results. All transitions are synchronous. Irregular calls that arise from
//! event-ordering races (a tap landing after the timer already resolved the
//! question, a tick after the last question) are no-ops reported as `Ignored`
//! rather than errors.
//!
//! ```text
//! start ─► InProgress(0, open) ─submit/tick(0)─► InProgress(0, locked)
//!                                                  │ advance
//!          InProgress(i+1, open) ◄─────────────────┤ (i + 1 < n)
//!          Terminal ◄──────────────────────────────┘ (i + 1 == n)
//! ```

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{Question, QuestionId, SessionConfig, SessionId, SessionResults};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question set is empty")]
    EmptyQuestionSet,
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// What the player submitted for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerChoice {
    /// Index into the question's options.
    Option(usize),
    /// The countdown ran out before any option was picked.
    TimedOut,
}

/// Resolution of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub choice: AnswerChoice,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub time_remaining: u32,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress { index: usize, answer_locked: bool },
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { is_correct: bool, points_awarded: u32 },
    /// Question already resolved or session finished.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NextQuestion { index: usize },
    Finished,
    /// Current question not resolved yet, or session already finished.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting { time_remaining: u32 },
    /// The countdown hit zero and the question was resolved as a timeout.
    TimedOut,
    Ignored,
}

/// Aggregated view of session progress, useful for hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

pub struct QuizSession {
    id: SessionId,
    config: SessionConfig,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    streak: u32,
    best_streak: u32,
    time_remaining: u32,
    answer_locked: bool,
    selected: Option<AnswerChoice>,
    records: Vec<AnswerRecord>,
    hint_revealed: bool,
    hints_used: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `questions` with the countdown armed for the first one.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuestionSet` if `questions` is empty.
    pub fn start(
        config: SessionConfig,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        let time_remaining = config.time_limit_secs();
        Ok(Self {
            id: SessionId::new_random(),
            config,
            records: Vec::with_capacity(questions.len()),
            questions,
            current: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            time_remaining,
            answer_locked: false,
            selected: None,
            hint_revealed: false,
            hints_used: 0,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn is_answer_locked(&self) -> bool {
        self.answer_locked
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<AnswerChoice> {
        self.selected
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    /// Correct/incorrect flag per resolved question, in order.
    #[must_use]
    pub fn answer_history(&self) -> Vec<bool> {
        self.records.iter().map(|r| r.is_correct).collect()
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.current >= self.questions.len()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_terminal() {
            SessionPhase::Terminal
        } else {
            SessionPhase::InProgress {
                index: self.current,
                answer_locked: self.answer_locked,
            }
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.records.len(),
            remaining: self.questions.len().saturating_sub(self.records.len()),
            is_complete: self.is_terminal(),
        }
    }

    /// Resolve the current question. First writer wins: once the question is
    /// locked every later call is ignored.
    pub fn submit_answer(&mut self, choice: AnswerChoice) -> SubmitOutcome {
        if self.answer_locked {
            return SubmitOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.current) else {
            return SubmitOutcome::Ignored;
        };

        let is_correct = match choice {
            AnswerChoice::Option(index) => question.is_correct(index),
            AnswerChoice::TimedOut => false,
        };
        let points_awarded = if is_correct {
            self.config.scoring().points_for(self.time_remaining)
        } else {
            0
        };

        self.records.push(AnswerRecord {
            question_id: question.id(),
            choice,
            is_correct,
            points_awarded,
            time_remaining: self.time_remaining,
        });
        self.answer_locked = true;
        self.selected = Some(choice);

        if is_correct {
            self.score = self.score.saturating_add(points_awarded);
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }

        SubmitOutcome::Accepted {
            is_correct,
            points_awarded,
        }
    }

    /// Move past a resolved question, restarting the countdown or finishing the session.
    ///
    /// `now` stamps the completion time when the last question is left.
    pub fn advance(&mut self, now: DateTime<Utc>) -> AdvanceOutcome {
        if !self.answer_locked || self.is_terminal() {
            return AdvanceOutcome::Ignored;
        }

        self.answer_locked = false;
        self.selected = None;
        self.hint_revealed = false;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.time_remaining = self.config.time_limit_secs();
            AdvanceOutcome::NextQuestion {
                index: self.current,
            }
        } else {
            self.current = self.questions.len();
            self.completed_at = Some(now.max(self.started_at));
            AdvanceOutcome::Finished
        }
    }

    /// One elapsed second of the countdown. Reaching zero resolves the
    /// question as a timeout so the session never stalls.
    pub fn tick(&mut self) -> TickOutcome {
        if self.answer_locked || self.is_terminal() {
            return TickOutcome::Ignored;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Counting {
                time_remaining: self.time_remaining,
            };
        }

        match self.submit_answer(AnswerChoice::TimedOut) {
            SubmitOutcome::Accepted { .. } => TickOutcome::TimedOut,
            SubmitOutcome::Ignored => TickOutcome::Ignored,
        }
    }

    /// Reveal the current question's hint. Counted once per question.
    pub fn reveal_hint(&mut self) -> Option<&str> {
        if self.answer_locked || self.is_terminal() {
            return None;
        }
        let hint = self.questions.get(self.current)?.hint()?;
        if !self.hint_revealed {
            self.hint_revealed = true;
            self.hints_used += 1;
        }
        Some(hint)
    }

    /// Results of a finished session; `None` while questions remain.
    #[must_use]
    pub fn compute_results(&self) -> Option<SessionResults> {
        let completed_at = self.completed_at?;
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(self.records.iter().filter(|r| r.is_correct).count())
            .unwrap_or(u32::MAX);

        SessionResults::from_persisted(
            self.id,
            self.config.category().clone(),
            self.config.difficulty(),
            self.started_at,
            completed_at,
            total,
            correct,
            self.score,
            self.best_streak,
            self.hints_used,
        )
        .ok()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("streak", &self.streak)
            .field("time_remaining", &self.time_remaining)
            .field("answer_locked", &self.answer_locked)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Difficulty, QuestionDraft, ScoringRules};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_config(count: u32, time_limit: u32) -> SessionConfig {
        SessionConfig::new(
            Category::new("addition").unwrap(),
            Difficulty::Easy,
            count,
            time_limit,
        )
        .unwrap()
    }

    fn build_questions(count: u64) -> Vec<Question> {
        (1..=count)
            .map(|id| {
                QuestionDraft::new(
                    format!("{id} + {id} = ?"),
                    vec![format!("{}", id * 2), format!("{}", id * 2 + 1)],
                    0,
                )
                .with_hint("Double it.")
                .validate(QuestionId::new(id))
                .unwrap()
            })
            .collect()
    }

    fn start(count: u32, time_limit: u32) -> QuizSession {
        QuizSession::start(
            build_config(count, time_limit),
            build_questions(u64::from(count)),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn start_initializes_state() {
        let session = start(3, 30);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.time_remaining(), 30);
        assert!(!session.is_answer_locked());
        assert!(session.answer_history().is_empty());
        assert_eq!(session.started_at(), fixed_now());
        assert_eq!(
            session.phase(),
            SessionPhase::InProgress {
                index: 0,
                answer_locked: false
            }
        );
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = QuizSession::start(build_config(3, 30), Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuestionSet);
    }

    #[test]
    fn correct_answer_scores_then_advance_rearms_timer() {
        let mut session = start(3, 30);
        session.tick();
        session.tick();

        let outcome = session.submit_answer(AnswerChoice::Option(0));
        assert_eq!(
            outcome,
            SubmitOutcome::Accepted {
                is_correct: true,
                points_awarded: 10
            }
        );
        assert_eq!(session.score(), 10);
        assert_eq!(session.streak(), 1);

        assert_eq!(
            session.advance(fixed_now()),
            AdvanceOutcome::NextQuestion { index: 1 }
        );
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.time_remaining(), 30);
        assert!(!session.is_answer_locked());
        assert_eq!(session.selected_answer(), None);
    }

    #[test]
    fn second_submit_is_a_no_op() {
        let mut session = start(2, 30);
        session.submit_answer(AnswerChoice::Option(1));
        let score = session.score();
        let history = session.answer_history();
        let selected = session.selected_answer();

        assert_eq!(
            session.submit_answer(AnswerChoice::Option(0)),
            SubmitOutcome::Ignored
        );
        assert_eq!(session.score(), score);
        assert_eq!(session.answer_history(), history);
        assert_eq!(session.selected_answer(), selected);
    }

    #[test]
    fn advance_before_resolution_is_ignored() {
        let mut session = start(2, 30);
        assert_eq!(session.advance(fixed_now()), AdvanceOutcome::Ignored);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn countdown_times_out_as_incorrect() {
        let mut session = start(2, 3);
        session.submit_answer(AnswerChoice::Option(0));
        session.advance(fixed_now());

        assert_eq!(session.tick(), TickOutcome::Counting { time_remaining: 2 });
        assert_eq!(session.tick(), TickOutcome::Counting { time_remaining: 1 });
        assert_eq!(session.tick(), TickOutcome::TimedOut);

        assert!(session.is_answer_locked());
        assert_eq!(session.selected_answer(), Some(AnswerChoice::TimedOut));
        assert_eq!(session.answer_history(), vec![true, false]);
        assert_eq!(session.streak(), 0);
        assert_eq!(session.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn tap_after_timeout_does_not_score() {
        let mut session = start(1, 1);
        assert_eq!(session.tick(), TickOutcome::TimedOut);
        assert_eq!(
            session.submit_answer(AnswerChoice::Option(0)),
            SubmitOutcome::Ignored
        );
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn three_question_scenario_results() {
        let mut session = start(3, 30);
        let finished_at = fixed_now() + Duration::seconds(42);

        session.submit_answer(AnswerChoice::Option(0));
        session.advance(fixed_now());
        session.submit_answer(AnswerChoice::Option(1));
        session.advance(fixed_now());
        session.submit_answer(AnswerChoice::Option(0));
        assert!(session.compute_results().is_none());
        assert_eq!(session.advance(finished_at), AdvanceOutcome::Finished);

        assert!(session.is_terminal());
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.phase(), SessionPhase::Terminal);

        let results = session.compute_results().unwrap();
        assert_eq!(results.total_questions(), 3);
        assert_eq!(results.correct_answers(), 2);
        assert_eq!(results.score(), 20);
        assert_eq!(results.best_streak(), 1);
        assert_eq!(results.elapsed_seconds(), 42);
        assert!((results.accuracy() - 0.667).abs() < 0.001);

        assert_eq!(session.compute_results(), Some(results));
    }

    #[test]
    fn terminal_session_ignores_everything() {
        let mut session = start(1, 30);
        session.submit_answer(AnswerChoice::Option(0));
        session.advance(fixed_now());

        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(
            session.submit_answer(AnswerChoice::Option(0)),
            SubmitOutcome::Ignored
        );
        assert_eq!(session.advance(fixed_now()), AdvanceOutcome::Ignored);
        assert_eq!(session.reveal_hint(), None);
        assert_eq!(session.score(), 10);
        assert_eq!(session.answer_history().len(), 1);
    }

    #[test]
    fn best_streak_survives_reset() {
        let mut session = start(4, 30);
        for choice in [0, 0, 1, 0] {
            session.submit_answer(AnswerChoice::Option(choice));
            session.advance(fixed_now());
        }
        assert_eq!(session.best_streak(), 2);
        assert_eq!(session.streak(), 1);
    }

    #[test]
    fn time_bonus_uses_remaining_seconds() {
        let config = build_config(1, 30).with_scoring(ScoringRules::new(10, 0.5).unwrap());
        let mut session = QuizSession::start(config, build_questions(1), fixed_now()).unwrap();
        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(
            session.submit_answer(AnswerChoice::Option(0)),
            SubmitOutcome::Accepted {
                is_correct: true,
                points_awarded: 20
            }
        );
        assert_eq!(session.records()[0].time_remaining, 20);
    }

    #[test]
    fn hint_counts_once_per_question() {
        let mut session = start(2, 30);
        assert_eq!(session.reveal_hint(), Some("Double it."));
        assert_eq!(session.reveal_hint(), Some("Double it."));
        assert_eq!(session.hints_used(), 1);

        session.submit_answer(AnswerChoice::Option(0));
        assert_eq!(session.reveal_hint(), None);
        session.advance(fixed_now());
        session.reveal_hint();
        assert_eq!(session.hints_used(), 2);
    }

    #[test]
    fn history_tracks_resolved_questions() {
        let mut session = start(3, 30);
        for expected in 0..3 {
            assert_eq!(session.answer_history().len(), expected);
            session.submit_answer(AnswerChoice::Option(1));
            assert_eq!(session.answer_history().len(), expected + 1);
            session.advance(fixed_now());
        }
        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 3,
                answered: 3,
                remaining: 0,
                is_complete: true,
            }
        );
    }

    #[test]
    fn completion_is_never_before_start() {
        let mut session = start(1, 30);
        session.submit_answer(AnswerChoice::Option(0));
        session.advance(fixed_now() - Duration::seconds(10));
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert_eq!(session.compute_results().unwrap().elapsed_seconds(), 0);
    }

    #[test]
    fn restart_mints_a_new_id() {
        let first = start(1, 30);
        let second = start(1, 30);
        assert_ne!(first.id(), second.id());
    }
}
