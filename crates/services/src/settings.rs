//! Quiz configuration: defaults, then environment, then whatever the host layers on top.

use std::env;

use quiz_core::model::{Category, Difficulty, ScoringRules, SessionConfig};
use url::Url;

use crate::error::SettingsError;

pub const DEFAULT_CATEGORY: &str = "mixed";
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Host-facing quiz settings before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizSettings {
    pub category: String,
    pub difficulty: Difficulty,
    pub question_count: u32,
    pub time_limit_secs: u32,
    pub points_for_correct: u32,
    pub bonus_factor: f64,
    pub grade_level: Option<u8>,
    pub db_url: Option<String>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            difficulty: Difficulty::Easy,
            question_count: DEFAULT_QUESTION_COUNT,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            points_for_correct: ScoringRules::DEFAULT_POINTS,
            bonus_factor: 0.0,
            grade_level: None,
            db_url: None,
        }
    }
}

impl QuizSettings {
    /// Defaults overridden by `QUIZ_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` if a variable is set but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(category) = get("QUIZ_CATEGORY") {
            settings.category = category;
        }
        if let Some(raw) = get("QUIZ_DIFFICULTY") {
            settings.difficulty = raw
                .parse()
                .map_err(|_| SettingsError::InvalidValue { key: "QUIZ_DIFFICULTY", raw })?;
        }
        if let Some(raw) = get("QUIZ_QUESTION_COUNT") {
            settings.question_count = parse_value("QUIZ_QUESTION_COUNT", raw)?;
        }
        if let Some(raw) = get("QUIZ_TIME_LIMIT") {
            settings.time_limit_secs = parse_value("QUIZ_TIME_LIMIT", raw)?;
        }
        if let Some(raw) = get("QUIZ_POINTS") {
            settings.points_for_correct = parse_value("QUIZ_POINTS", raw)?;
        }
        if let Some(raw) = get("QUIZ_BONUS_FACTOR") {
            settings.bonus_factor = parse_value("QUIZ_BONUS_FACTOR", raw)?;
        }
        if let Some(raw) = get("QUIZ_GRADE_LEVEL") {
            settings.grade_level = Some(parse_value("QUIZ_GRADE_LEVEL", raw)?);
        }
        settings.db_url = get("QUIZ_DB_URL");

        Ok(settings)
    }

    /// Validate into an immutable `SessionConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Config` for zero counts/limits or bad scoring values.
    pub fn session_config(&self) -> Result<SessionConfig, SettingsError> {
        let scoring = ScoringRules::new(self.points_for_correct, self.bonus_factor)?;
        let config = SessionConfig::new(
            Category::new(&self.category)?,
            self.difficulty,
            self.question_count,
            self.time_limit_secs,
        )?
        .with_grade_level(self.grade_level)
        .with_scoring(scoring);
        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, SettingsError> {
    raw.parse().map_err(|_| SettingsError::InvalidValue { key, raw })
}

/// Connection settings for the chat-completions question supplier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiSettings {
    base_url: String,
    api_key: String,
    model: String,
}

impl AiSettings {
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidBaseUrl` if `base_url` does not parse.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if Url::parse(&base_url).is_err() {
            return Err(SettingsError::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            base_url,
            api_key: api_key.into().trim().to_string(),
            model: model.into().trim().to_string(),
        })
    }

    /// Reads `QUIZ_AI_API_KEY`, `QUIZ_AI_BASE_URL` and `QUIZ_AI_MODEL`.
    /// Returns `Ok(None)` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidBaseUrl` for a malformed base URL.
    pub fn from_env() -> Result<Option<Self>, SettingsError> {
        let Some(api_key) = env::var("QUIZ_AI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        let base_url = env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_AI_BASE_URL.into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.into());
        Self::new(base_url, api_key, model).map(Some)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ConfigError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_build_a_valid_config() {
        let config = QuizSettings::default().session_config().unwrap();
        assert_eq!(config.category().as_str(), "mixed");
        assert_eq!(config.question_count(), 10);
        assert_eq!(config.time_limit_secs(), 30);
        assert_eq!(config.scoring().points_for_correct(), 10);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = QuizSettings::from_lookup(lookup(&[
            ("QUIZ_CATEGORY", "Division"),
            ("QUIZ_DIFFICULTY", "hard"),
            ("QUIZ_QUESTION_COUNT", "5"),
            ("QUIZ_TIME_LIMIT", "15"),
            ("QUIZ_BONUS_FACTOR", "0.1"),
            ("QUIZ_GRADE_LEVEL", "4"),
            ("QUIZ_DB_URL", " "),
        ]))
        .unwrap();

        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert_eq!(settings.question_count, 5);
        assert_eq!(settings.grade_level, Some(4));
        assert_eq!(settings.db_url, None);

        let config = settings.session_config().unwrap();
        assert_eq!(config.category().as_str(), "division");
        assert_eq!(config.time_limit_secs(), 15);
        assert_eq!(config.scoring().points_for(20), 12);
    }

    #[test]
    fn unparsable_values_are_reported() {
        let err = QuizSettings::from_lookup(lookup(&[("QUIZ_TIME_LIMIT", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue { key: "QUIZ_TIME_LIMIT", .. }
        ));
    }

    #[test]
    fn zero_count_fails_validation() {
        let settings = QuizSettings {
            question_count: 0,
            ..QuizSettings::default()
        };
        assert!(matches!(
            settings.session_config().unwrap_err(),
            SettingsError::Config(_)
        ));
    }

    #[test]
    fn huge_count_from_environment_fails_validation() {
        let settings =
            QuizSettings::from_lookup(lookup(&[("QUIZ_QUESTION_COUNT", "4294967295")])).unwrap();
        assert!(matches!(
            settings.session_config().unwrap_err(),
            SettingsError::Config(ConfigError::QuestionCountTooLarge { .. })
        ));
    }

    #[test]
    fn ai_settings_validate_url() {
        assert!(AiSettings::new("not a url", "key", "model").is_err());
        let ai = AiSettings::new("https://example.test/v1/", "key", "model").unwrap();
        assert_eq!(ai.base_url(), "https://example.test/v1");
    }
}
