//! Language model access.
//!
//! Agents talk to a [`LanguageModel`]; [`GeminiClient`] is the production
//! implementation. Structured output goes through [`generate_structured`],
//! which asks the model for JSON matching a schema and deserializes it.

mod gemini;
pub mod prompts;
mod retry;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use gemini::GeminiClient;
pub use retry::{with_retry, Pacer, RetryPolicy};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side.
    User,
    /// The model side.
    Model,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author of the turn.
    pub role: Role,
    /// Turn text.
    pub text: String,
}

impl Message {
    /// A user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// A model turn.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// System instruction, if any.
    pub system: Option<String>,
    /// Conversation turns, oldest first.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// JSON schema the answer must follow; `None` for free text.
    pub response_schema: Option<serde_json::Value>,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            system: None,
            messages: Vec::new(),
            temperature: 0.0,
            response_schema: None,
        }
    }
}

impl GenerateRequest {
    /// A request with a system instruction and a single user turn.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            messages: vec![Message::user(user)],
            ..Self::default()
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Require a JSON answer matching `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A text generation backend.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync + std::fmt::Debug {
    /// Model name (for logging).
    fn name(&self) -> &str;

    /// Generate an answer for `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or answers with no text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

/// Generate a JSON answer following `schema` and deserialize it.
///
/// Markdown code fences around the JSON are tolerated.
///
/// # Errors
///
/// Returns the backend error, or [`Error::LlmResponse`] if the answer does
/// not deserialize into `T`.
pub async fn generate_structured<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: GenerateRequest,
    schema: serde_json::Value,
) -> Result<T> {
    let request = request.with_schema(schema);
    let raw = model.generate(&request).await?;
    serde_json::from_str(strip_code_fences(&raw)).map_err(|e| {
        Error::llm_response(format!("answer is not the expected JSON ({e}): {raw}"))
    })
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        value: u32,
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  ```json {} "), "{}");
    }

    #[test]
    fn test_request_builders() {
        let request = GenerateRequest::new("sys", "hi")
            .with_temperature(0.3)
            .with_schema(serde_json::json!({"type": "OBJECT"}));
        assert_eq!(request.system.as_deref(), Some("sys"));
        assert_eq!(request.messages, vec![Message::user("hi")]);
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert!(request.response_schema.is_some());
    }

    #[tokio::test]
    async fn test_generate_structured() {
        let model = ScriptedModel::new(["```json\n{\"value\": 7}\n```"]);
        let answer: Answer = generate_structured(
            &model,
            GenerateRequest::new("sys", "q"),
            serde_json::json!({"type": "OBJECT"}),
        )
        .await
        .unwrap();
        assert_eq!(answer, Answer { value: 7 });
        assert!(model.requests()[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn test_generate_structured_rejects_prose() {
        let model = ScriptedModel::new(["Sure! The value is seven."]);
        let err = generate_structured::<Answer>(
            &model,
            GenerateRequest::new("sys", "q"),
            serde_json::json!({}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::LlmResponse { .. }));
    }

    #[tokio::test]
    async fn test_scripted_model_exhausts() {
        let model = ScriptedModel::default();
        model.push_reply("one");
        model.push_error("boom");
        let request = GenerateRequest::default();
        assert_eq!(model.generate(&request).await.unwrap(), "one");
        assert!(model.generate(&request).await.is_err());
        assert!(model.generate(&request).await.is_err());
        assert_eq!(model.requests().len(), 3);
    }
}
