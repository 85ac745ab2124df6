use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("category cannot be empty")]
    EmptyCategory,

    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("question count {count} exceeds the maximum of {max}")]
    QuestionCountTooLarge { count: u32, max: u32 },

    #[error("time limit per question must be > 0 seconds")]
    InvalidTimeLimit,

    #[error("points for a correct answer must be > 0")]
    InvalidPointsForCorrect,

    #[error("bonus factor must be finite and >= 0, got {0}")]
    InvalidBonusFactor(f64),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Topic label a session draws its questions from (e.g. `addition`, `mixed`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    /// Builds a category label, lower-cased and trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyCategory` for a blank label.
    pub fn new(label: impl AsRef<str>) -> Result<Self, ConfigError> {
        let label = label.as_ref().trim().to_lowercase();
        if label.is_empty() {
            return Err(ConfigError::EmptyCategory);
        }
        Ok(Self(label))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" | "moderate" => Ok(Self::Medium),
            "hard" | "advanced" => Ok(Self::Hard),
            other => Err(ConfigError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Points awarded for a correct first-time answer.
///
/// A correct answer earns `points_for_correct + floor(time_remaining * bonus_factor)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    points_for_correct: u32,
    bonus_factor: f64,
}

impl ScoringRules {
    pub const DEFAULT_POINTS: u32 = 10;

    /// # Errors
    ///
    /// Returns `ConfigError` if points are zero or the bonus factor is negative/non-finite.
    pub fn new(points_for_correct: u32, bonus_factor: f64) -> Result<Self, ConfigError> {
        if points_for_correct == 0 {
            return Err(ConfigError::InvalidPointsForCorrect);
        }
        if !bonus_factor.is_finite() || bonus_factor < 0.0 {
            return Err(ConfigError::InvalidBonusFactor(bonus_factor));
        }
        Ok(Self {
            points_for_correct,
            bonus_factor,
        })
    }

    #[must_use]
    pub fn points_for_correct(&self) -> u32 {
        self.points_for_correct
    }

    #[must_use]
    pub fn bonus_factor(&self) -> f64 {
        self.bonus_factor
    }

    /// Points for a correct answer given with `time_remaining` seconds left.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn points_for(&self, time_remaining: u32) -> u32 {
        let bonus = (f64::from(time_remaining) * self.bonus_factor).floor();
        let bonus = if bonus >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            bonus as u32
        };
        self.points_for_correct.saturating_add(bonus)
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_for_correct: Self::DEFAULT_POINTS,
            bonus_factor: 0.0,
        }
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Parameters of one quiz attempt. Immutable for the session's duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    category: Category,
    difficulty: Difficulty,
    question_count: u32,
    time_limit_secs: u32,
    grade_level: Option<u8>,
    scoring: ScoringRules,
}

impl SessionConfig {
    pub const MAX_QUESTION_COUNT: u32 = 100;

    /// # Errors
    ///
    /// Returns `ConfigError` if the question count or time limit is zero, or
    /// the question count is above `MAX_QUESTION_COUNT`.
    pub fn new(
        category: Category,
        difficulty: Difficulty,
        question_count: u32,
        time_limit_secs: u32,
    ) -> Result<Self, ConfigError> {
        if question_count == 0 {
            return Err(ConfigError::InvalidQuestionCount);
        }
        if question_count > Self::MAX_QUESTION_COUNT {
            return Err(ConfigError::QuestionCountTooLarge {
                count: question_count,
                max: Self::MAX_QUESTION_COUNT,
            });
        }
        if time_limit_secs == 0 {
            return Err(ConfigError::InvalidTimeLimit);
        }
        Ok(Self {
            category,
            difficulty,
            question_count,
            time_limit_secs,
            grade_level: None,
            scoring: ScoringRules::default(),
        })
    }

    #[must_use]
    pub fn with_grade_level(mut self, grade_level: Option<u8>) -> Self {
        self.grade_level = grade_level;
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringRules) -> Self {
        self.scoring = scoring;
        self
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
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn grade_level(&self) -> Option<u8> {
        self.grade_level
    }

    #[must_use]
    pub fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_zero_values() {
        let category = Category::new("addition").unwrap();
        assert_eq!(
            SessionConfig::new(category.clone(), Difficulty::Easy, 0, 30).unwrap_err(),
            ConfigError::InvalidQuestionCount
        );
        assert_eq!(
            SessionConfig::new(category, Difficulty::Easy, 5, 0).unwrap_err(),
            ConfigError::InvalidTimeLimit
        );
    }

    #[test]
    fn config_rejects_oversized_question_count() {
        let category = Category::new("addition").unwrap();
        let max = SessionConfig::MAX_QUESTION_COUNT;
        assert!(SessionConfig::new(category.clone(), Difficulty::Easy, max, 30).is_ok());
        assert_eq!(
            SessionConfig::new(category.clone(), Difficulty::Easy, max + 1, 30).unwrap_err(),
            ConfigError::QuestionCountTooLarge { count: max + 1, max }
        );
        assert!(matches!(
            SessionConfig::new(category, Difficulty::Easy, u32::MAX, 30),
            Err(ConfigError::QuestionCountTooLarge { .. })
        ));
    }

    #[test]
    fn category_is_normalized() {
        let category = Category::new("  Multiplication ").unwrap();
        assert_eq!(category.as_str(), "multiplication");
        assert_eq!(Category::new("   ").unwrap_err(), ConfigError::EmptyCategory);
    }

    #[test]
    fn difficulty_parses_aliases() {
        assert_eq!("Moderate".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn default_scoring_has_no_time_bonus() {
        let rules = ScoringRules::default();
        assert_eq!(rules.points_for(30), 10);
        assert_eq!(rules.points_for(0), 10);
    }

    #[test]
    fn time_bonus_is_floored() {
        let rules = ScoringRules::new(10, 0.1).unwrap();
        assert_eq!(rules.points_for(25), 12);
        assert_eq!(rules.points_for(9), 10);
    }

    #[test]
    fn scoring_rejects_bad_values() {
        assert!(ScoringRules::new(0, 0.0).is_err());
        assert!(ScoringRules::new(10, -1.0).is_err());
        assert!(ScoringRules::new(10, f64::NAN).is_err());
    }
}
