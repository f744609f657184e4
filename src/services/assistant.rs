// src/services/assistant.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{config::Config, models::test_result::TestResult};

const SYSTEM_PROMPT: &str = "You are a helpful test review assistant. \
Explain clearly, be concise, and encourage learning. \
When explaining a question, identify it by its id and why the correct choice is correct. \
If the student was wrong, gently point out the mistake and how to avoid it next time.";

/// Most questions included in the summary sent to the model.
const MAX_SUMMARY_QUESTIONS: usize = 50;

/// Optional collaborator that explains a result in free text.
///
/// Implementations never fail: any problem yields an empty string and the
/// caller answers with the keyword fallback instead.
#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn reply(&self, message: &str, result: &TestResult) -> String;
}

/// Used when no API key is configured.
pub struct OfflineAssistant;

#[async_trait]
impl ChatAssistant for OfflineAssistant {
    async fn reply(&self, _message: &str, _result: &TestResult) -> String {
        String::new()
    }
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct OpenAiAssistant {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiAssistant {
    pub fn new(client: Client, api_key: String, base_url: &Url, model: String) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            api_key,
            endpoint: base_url.join("chat/completions")?,
            model,
        })
    }

    async fn complete(&self, message: &str, result: &TestResult) -> Result<String, reqwest::Error> {
        let payload = json!({
            "model": self.model,
            "temperature": 0.2,
            "max_tokens": 600,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Here is my latest test summary (JSON):\n{}\n\nMy question: {}",
                        result_summary(result),
                        message
                    )
                }
            ]
        });

        let response: CompletionResponse = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChatAssistant for OpenAiAssistant {
    async fn reply(&self, message: &str, result: &TestResult) -> String {
        match self.complete(message, result).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Chat completion failed, using fallback: {}", e);
                String::new()
            }
        }
    }
}

/// Compact JSON description of a result handed to the model.
fn result_summary(result: &TestResult) -> serde_json::Value {
    let questions: Vec<serde_json::Value> = result
        .details
        .iter()
        .take(MAX_SUMMARY_QUESTIONS)
        .map(|d| {
            json!({
                "question_id": d.question_id,
                "question": d.prompt,
                "user": d.submitted_label,
                "correct": d.correct_label,
                "is_correct": d.is_correct,
            })
        })
        .collect();

    json!({
        "attempted": result.attempted,
        "right": result.right,
        "wrong": result.wrong,
        "points": (result.points * 100.0).round() / 100.0,
        "percentage": result.percentage,
        "grade": result.grade,
        "questions": questions,
    })
}

/// Builds the assistant once at startup from configuration.
pub fn from_config(config: &Config) -> Arc<dyn ChatAssistant> {
    let Some(api_key) = config.openai_api_key.clone() else {
        tracing::info!("OPENAI_API_KEY not set, chat assistant runs in offline mode");
        return Arc::new(OfflineAssistant);
    };

    let client = match Client::builder()
        .timeout(Duration::from_secs(config.ai_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Failed to build HTTP client, chat assistant offline: {}", e);
            return Arc::new(OfflineAssistant);
        }
    };

    match OpenAiAssistant::new(client, api_key, &config.openai_base_url, config.openai_model.clone()) {
        Ok(assistant) => Arc::new(assistant),
        Err(e) => {
            tracing::warn!("Invalid chat endpoint, chat assistant offline: {}", e);
            Arc::new(OfflineAssistant)
        }
    }
}
