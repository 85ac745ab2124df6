use std::sync::Arc;

use log::info;
use quiz_core::model::SessionConfig;
use storage::repository::{ResultsRepository, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::questions::{
    ArithmeticSupplier, ChatQuestionSupplier, FallbackSupplier, QuestionSupplier,
};
use crate::sessions::{QuizController, ResultsService};
use crate::settings::{AiSettings, QuizSettings};

/// Assembles host-facing services from settings.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    config: SessionConfig,
    supplier: Arc<dyn QuestionSupplier>,
    results_repo: Arc<dyn ResultsRepository>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Build services, backed by `SQLite` when `settings.db_url` is set and
    /// in memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the settings do not form a valid session
    /// config or storage initialization fails.
    pub async fn from_settings(
        settings: &QuizSettings,
        ai: Option<AiSettings>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let config = settings.session_config()?;
        let storage = match settings.db_url.as_deref() {
            Some(url) => {
                info!("using sqlite results store at {url}");
                Storage::sqlite(url).await?
            }
            None => Storage::in_memory(),
        };
        Ok(Self::new(clock, config, supplier_for(ai), storage))
    }

    #[must_use]
    pub fn new(
        clock: Clock,
        config: SessionConfig,
        supplier: Arc<dyn QuestionSupplier>,
        storage: Storage,
    ) -> Self {
        let results = Arc::new(ResultsService::new(Arc::clone(&storage.results)));
        Self {
            clock,
            config,
            supplier,
            results_repo: storage.results,
            results,
        }
    }

    /// A fresh controller sharing this app's supplier and results store.
    #[must_use]
    pub fn controller(&self) -> QuizController {
        QuizController::new(
            self.clock,
            Arc::clone(&self.supplier),
            Arc::clone(&self.results_repo),
            self.config.clone(),
        )
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Chat-backed questions with a local fallback when AI is configured,
/// local arithmetic questions otherwise.
fn supplier_for(ai: Option<AiSettings>) -> Arc<dyn QuestionSupplier> {
    let local: Arc<dyn QuestionSupplier> = Arc::new(ArithmeticSupplier::new());
    match ai {
        Some(settings) => {
            info!("question generation via {} ({})", settings.base_url(), settings.model());
            Arc::new(FallbackSupplier::new(
                Arc::new(ChatQuestionSupplier::new(Some(settings))),
                local,
            ))
        }
        None => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::AnswerChoice;
    use quiz_core::time::fixed_now;

    #[tokio::test]
    async fn in_memory_services_run_a_session() {
        let settings = QuizSettings {
            category: "addition".into(),
            question_count: 2,
            ..QuizSettings::default()
        };
        let services = AppServices::from_settings(&settings, None, Clock::fixed(fixed_now()))
            .await
            .unwrap();

        let mut controller = services.controller();
        controller.start_session().await.unwrap();
        for _ in 0..2 {
            controller.submit_answer(AnswerChoice::TimedOut);
            controller.advance();
        }
        controller.finish().await.unwrap();

        let recent = services.results().recent(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].correct_answers, 0);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let settings = QuizSettings {
            question_count: 0,
            ..QuizSettings::default()
        };
        let err = AppServices::from_settings(&settings, None, Clock::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppServicesError::Settings(_)));
    }
}
