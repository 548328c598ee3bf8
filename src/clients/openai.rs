//! Quiz generation through the OpenAI chat completions API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::error::{AppError, AppResult};

const SYSTEM_PROMPT: &str = "You are a helpful teacher assistant that generates a JSON object with a number of questions, the options for students to choose from, and the correct answer. Each object in the questions array should be formatted like this example for Multiple Choice: {question: 'What is the capital of California?', answerType: 'MULTIPLECHOICE', answerOptions: [{ answerText: 'San Francisco', isCorrect: false }, { answerText: 'Los Angeles', isCorrect: false }, { answerText: 'Sacramento', isCorrect: true }, { answerText: 'San Diego', isCorrect: false }]} and importantly like these for true/false questions: {question: 'The capital of California is San Diego.', answerType: 'TRUEFALSE', answerOptions: [{ answerText: '', isCorrect: false }]} or {question: 'The capital of California is Sacramento.', answerType: 'TRUEFALSE', answerOptions: [{ answerText: '', isCorrect: true }]}";

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> AppResult<Self> {
        // Completions for a full quiz routinely run past a minute.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { http, config })
    }

    /// Generate quiz questions about a subject.
    ///
    /// Returns the model's JSON object as an unparsed string; the client
    /// editor consumes it as-is.
    pub async fn generate_quiz(
        &self,
        mc_count: i32,
        tf_count: i32,
        subject: &str,
    ) -> AppResult<String> {
        let body = json!({
            "model": self.config.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Generate {mc_count} multiple choice questions and {tf_count} true/false questions about {subject}."
                    )
                }
            ]
        });

        let completion: ChatCompletion = self
            .http
            .post(format!("{}/v1/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::OpenAi("completion has no choices".to_string()))
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}
