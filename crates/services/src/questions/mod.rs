//! Question suppliers: anything that can turn a `GenerationRequest` into questions.

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use quiz_core::model::{Category, Difficulty, Question, SessionConfig};

use crate::error::GenerationError;

mod arithmetic;
mod chat;
mod shuffle;

pub use arithmetic::{ArithmeticOp, ArithmeticSupplier};
pub use chat::ChatQuestionSupplier;
pub use shuffle::shuffle_options;

/// What a session asks its supplier for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub category: Category,
    pub difficulty: Difficulty,
    pub count: u32,
    pub grade_level: Option<u8>,
}

impl GenerationRequest {
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            category: config.category().clone(),
            difficulty: config.difficulty(),
            count: config.question_count(),
            grade_level: config.grade_level(),
        }
    }
}

/// Call-out contract for question generation.
#[async_trait]
pub trait QuestionSupplier: Send + Sync {
    /// Produce up to `request.count` questions.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` on provider failure. Callers do not retry.
    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError>;
}

/// Tries `primary` first and falls back to `fallback` when it errors.
#[derive(Clone)]
pub struct FallbackSupplier {
    primary: Arc<dyn QuestionSupplier>,
    fallback: Arc<dyn QuestionSupplier>,
}

impl FallbackSupplier {
    #[must_use]
    pub fn new(primary: Arc<dyn QuestionSupplier>, fallback: Arc<dyn QuestionSupplier>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl QuestionSupplier for FallbackSupplier {
    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        match self.primary.generate_questions(request).await {
            Ok(questions) => Ok(questions),
            Err(err) => {
                warn!("primary question supplier failed, using fallback: {err}");
                self.fallback.generate_questions(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl QuestionSupplier for Failing {
        async fn generate_questions(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Vec<Question>, GenerationError> {
            Err(GenerationError::Disabled)
        }
    }

    fn request(category: &str, count: u32) -> GenerationRequest {
        GenerationRequest {
            category: Category::new(category).unwrap(),
            difficulty: Difficulty::Easy,
            count,
            grade_level: None,
        }
    }

    #[tokio::test]
    async fn fallback_covers_primary_failure() {
        let supplier = FallbackSupplier::new(
            Arc::new(Failing),
            Arc::new(ArithmeticSupplier::seeded(7)),
        );
        let questions = supplier
            .generate_questions(&request("addition", 4))
            .await
            .unwrap();
        assert_eq!(questions.len(), 4);
    }

    #[tokio::test]
    async fn fallback_error_is_propagated() {
        let supplier = FallbackSupplier::new(Arc::new(Failing), Arc::new(Failing));
        let err = supplier
            .generate_questions(&request("addition", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }
}
