use async_trait::async_trait;
use quiz_core::model::{Question, QuestionDraft, QuestionId};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::shuffle::shuffle_options;
use super::{GenerationRequest, QuestionSupplier};
use crate::error::GenerationError;
use crate::settings::AiSettings;

const SYSTEM_PROMPT: &str = "You write multiple-choice math questions for school children. \
Reply with a JSON object of the form {\"questions\": [{\"prompt\": string, \"options\": [string], \
\"correct_index\": number, \"hint\": string, \"explanation\": string}]}. \
Every question has exactly four options and one correct answer.";

/// Question supplier backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatQuestionSupplier {
    client: Client,
    settings: Option<AiSettings>,
}

impl ChatQuestionSupplier {
    #[must_use]
    pub fn new(settings: Option<AiSettings>) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.is_some()
    }

    fn user_prompt(request: &GenerationRequest) -> String {
        let mut prompt = format!(
            "Write {} {} questions about {}.",
            request.count, request.difficulty, request.category
        );
        if let Some(grade) = request.grade_level {
            prompt.push_str(&format!(" Target grade {grade}."));
        }
        prompt
    }
}

#[async_trait]
impl QuestionSupplier for ChatQuestionSupplier {
    async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<Question>, GenerationError> {
        let settings = self.settings.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!("{}/chat/completions", settings.base_url());
        let payload = ChatRequest {
            model: settings.model().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(request),
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(settings.api_key())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        parse_questions(&content, request.count, &mut rand::rng())
    }
}

/// Parse the model's JSON reply, keeping at most `limit` questions, each with
/// its options shuffled.
pub(crate) fn parse_questions<R: Rng + ?Sized>(
    content: &str,
    limit: u32,
    rng: &mut R,
) -> Result<Vec<Question>, GenerationError> {
    let json = strip_code_fence(content);
    let payload: QuestionsPayload =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let mut questions = Vec::with_capacity(payload.questions.len().min(limit));
    for (n, item) in (1_u64..).zip(payload.questions.into_iter().take(limit)) {
        let draft = QuestionDraft {
            prompt: item.prompt,
            options: item.options,
            correct_index: item.correct_index,
            hint: item.hint,
            explanation: item.explanation,
        };
        let question = draft.validate(QuestionId::new(n))?;
        questions.push(shuffle_options(&question, rng));
    }
    Ok(questions)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    questions: Vec<QuestionPayload>,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}
