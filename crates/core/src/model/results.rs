use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Category, Difficulty, SessionId};
use crate::time::whole_seconds_between;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("best streak ({streak}) exceeds correct answers ({correct})")]
    StreakExceedsCorrect { streak: u32, correct: u32 },
}

/// Outcome of a finished quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResults {
    session_id: SessionId,
    category: Category,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_questions: u32,
    correct_answers: u32,
    score: u32,
    best_streak: u32,
    hints_used: u32,
}

impl SessionResults {
    /// Rehydrate results from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError` if the timestamps or counters are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: SessionId,
        category: Category,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total_questions: u32,
        correct_answers: u32,
        score: u32,
        best_streak: u32,
        hints_used: u32,
    ) -> Result<Self, ResultsError> {
        if completed_at < started_at {
            return Err(ResultsError::InvalidTimeRange);
        }
        if correct_answers > total_questions {
            return Err(ResultsError::CorrectExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }
        if best_streak > correct_answers {
            return Err(ResultsError::StreakExceedsCorrect {
                streak: best_streak,
                correct: correct_answers,
            });
        }

        Ok(Self {
            session_id,
            category,
            difficulty,
            started_at,
            completed_at,
            total_questions,
            correct_answers,
            score,
            best_streak,
            hints_used,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Fraction of questions answered correctly, `0.0` for an empty quiz.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) / f64::from(self.total_questions)
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        whole_seconds_between(self.started_at, self.completed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build(total: u32, correct: u32, streak: u32) -> Result<SessionResults, ResultsError> {
        let now = fixed_now();
        SessionResults::from_persisted(
            SessionId::new_random(),
            Category::new("addition").unwrap(),
            Difficulty::Easy,
            now,
            now + Duration::seconds(75),
            total,
            correct,
            correct * 10,
            streak,
            0,
        )
    }

    #[test]
    fn accuracy_and_elapsed() {
        let results = build(3, 2, 1).unwrap();
        assert!((results.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(results.elapsed_seconds(), 75);
    }

    #[test]
    fn zero_questions_has_zero_accuracy() {
        let results = build(0, 0, 0).unwrap();
        assert_eq!(results.accuracy(), 0.0);
    }

    #[test]
    fn rejects_inconsistent_counters() {
        assert_eq!(
            build(2, 3, 0).unwrap_err(),
            ResultsError::CorrectExceedsTotal { correct: 3, total: 2 }
        );
        assert_eq!(
            build(3, 1, 2).unwrap_err(),
            ResultsError::StreakExceedsCorrect { streak: 2, correct: 1 }
        );
    }

    #[test]
    fn rejects_reversed_time_range() {
        let now = fixed_now();
        let err = SessionResults::from_persisted(
            SessionId::new_random(),
            Category::new("mixed").unwrap(),
            Difficulty::Hard,
            now,
            now - Duration::seconds(1),
            1,
            1,
            10,
            1,
            0,
        )
        .unwrap_err();
        assert_eq!(err, ResultsError::InvalidTimeRange);
    }
}
