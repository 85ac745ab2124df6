use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} is blank")]
    BlankOption { index: usize },

    #[error("correct index {index} is out of range for {count} options")]
    CorrectIndexOutOfRange { index: usize, count: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by a generator.
#[derive(Debug, Clone, Default)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub hint: Option<String>,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<String>, correct_index: usize) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_index,
            hint: None,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Validate the draft and freeze it into a `Question`.
    ///
    /// Prompt and options are trimmed; blank hints/explanations are dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is empty, there are fewer than two
    /// options, an option is blank, or `correct_index` does not point at an option.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let count = self.options.len();
        if count < 2 {
            return Err(QuestionError::TooFewOptions { count });
        }

        let mut options = Vec::with_capacity(count);
        for (index, option) in self.options.into_iter().enumerate() {
            let option = option.trim().to_owned();
            if option.is_empty() {
                return Err(QuestionError::BlankOption { index });
            }
            options.push(option);
        }

        if self.correct_index >= count {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                count,
            });
        }

        Ok(Question {
            id,
            prompt,
            options,
            correct_index: self.correct_index,
            hint: normalize_optional(self.hint),
            explanation: normalize_optional(self.explanation),
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    hint: Option<String>,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    /// Returns a copy with options reordered by `permutation`.
    ///
    /// `permutation[new_position] = old_position`. The correct index follows its option.
    /// Returns `None` if `permutation` is not a permutation of the option indices.
    #[must_use]
    pub fn reordered(&self, permutation: &[usize]) -> Option<Question> {
        let count = self.options.len();
        if permutation.len() != count {
            return None;
        }
        let mut seen = vec![false; count];
        for &old in permutation {
            if old >= count || seen[old] {
                return None;
            }
            seen[old] = true;
        }

        let options = permutation
            .iter()
            .map(|&old| self.options[old].clone())
            .collect();
        let correct_index = permutation.iter().position(|&old| old == self.correct_index)?;

        Some(Question {
            options,
            correct_index,
            ..self.clone()
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn validates_and_trims() {
        let question = QuestionDraft::new("  2 + 2 = ?  ", options(&["3", " 4 "]), 1)
            .with_hint("   ")
            .with_explanation("Two pairs make four.")
            .validate(QuestionId::new(1))
            .unwrap();

        assert_eq!(question.prompt(), "2 + 2 = ?");
        assert_eq!(question.correct_option(), "4");
        assert_eq!(question.hint(), None);
        assert_eq!(question.explanation(), Some("Two pairs make four."));
    }

    #[test]
    fn rejects_single_option() {
        let err = QuestionDraft::new("?", options(&["only"]), 0)
            .validate(QuestionId::new(1))
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let err = QuestionDraft::new("?", options(&["a", "b"]), 2)
            .validate(QuestionId::new(1))
            .unwrap_err();
        assert_eq!(err, QuestionError::CorrectIndexOutOfRange { index: 2, count: 2 });
    }

    #[test]
    fn rejects_blank_option() {
        let err = QuestionDraft::new("?", options(&["a", " "]), 0)
            .validate(QuestionId::new(1))
            .unwrap_err();
        assert_eq!(err, QuestionError::BlankOption { index: 1 });
    }

    #[test]
    fn reordering_tracks_the_correct_option() {
        let question = QuestionDraft::new("3 x 3 = ?", options(&["6", "9", "12"]), 1)
            .validate(QuestionId::new(7))
            .unwrap();

        let reordered = question.reordered(&[2, 0, 1]).unwrap();
        assert_eq!(reordered.options(), &options(&["12", "6", "9"])[..]);
        assert_eq!(reordered.correct_index(), 2);
        assert_eq!(reordered.correct_option(), "9");
        assert_eq!(reordered.id(), question.id());
    }

    #[test]
    fn reordering_rejects_non_permutations() {
        let question = QuestionDraft::new("?", options(&["a", "b"]), 0)
            .validate(QuestionId::new(1))
            .unwrap();
        assert!(question.reordered(&[0, 0]).is_none());
        assert!(question.reordered(&[0]).is_none());
    }
}
