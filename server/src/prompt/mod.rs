pub mod categorize;
pub mod completion;
pub mod feedback;

use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    server_config::cfg,
    HttpClient,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ModelLength,
    Error,
    ToolCalls,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: i32,
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: PromptUsage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiError {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatApiResponseOrError {
    Response(ChatApiResponse),
    Error(ChatApiError),
}

/// One round-trip to the chat completions API, returning the first
/// choice's content. The fixed per-call timeout here is the only timeout
/// anywhere in the pipeline.
pub async fn send_chat_request(
    http_client: &HttpClient,
    system_prompt: &str,
    user_prompt: &str,
    json_mode: bool,
) -> AppResult<String> {
    if cfg.api.key.is_empty() {
        return Err(AppError::Internal(anyhow!(
            "Chat API key is not configured"
        )));
    }

    let mut payload = json!({
        "model": &cfg.model.id,
        "temperature": cfg.model.temperature,
        "messages": [
            {
                "role": "system",
                "content": system_prompt
            },
            {
                "role": "user",
                "content": user_prompt
            }
        ]
    });
    if json_mode {
        payload["response_format"] = json!({"type": "json_object"});
    }

    let resp = http_client
        .post(cfg.model.endpoint.clone())
        .bearer_auth(&cfg.api.key)
        .timeout(Duration::from_secs(cfg.model.timeout_secs))
        .json(&payload)
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;

    let parsed = serde_json::from_value::<ChatApiResponseOrError>(resp.clone())
        .context(format!("Could not parse chat response: {}", resp))?;

    let parsed = match parsed {
        ChatApiResponseOrError::Error(error) => {
            return Err(anyhow!("Chat API error: {:?}", error).into());
        }
        ChatApiResponseOrError::Response(parsed) => parsed,
    };

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .context("No choices in response")?;

    Ok(choice.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_envelope_parses() {
        let raw = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"category\":\"SUPPORT\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let parsed = serde_json::from_value::<ChatApiResponseOrError>(raw).unwrap();
        assert!(matches!(parsed, ChatApiResponseOrError::Response(_)));
    }

    #[test]
    fn test_chat_error_envelope_parses() {
        let raw = json!({"message": "Requests rate limit exceeded"});
        let parsed = serde_json::from_value::<ChatApiResponseOrError>(raw).unwrap();
        assert!(matches!(parsed, ChatApiResponseOrError::Error(_)));
    }
}
