use super::send_chat_request;
use crate::{error::AppResult, HttpClient};

const SYSTEM_PROMPT: &str = "You are a helpful assistant for a customer support team.";

/// Unstructured passthrough used by the raw prompt endpoint.
pub async fn send_raw_prompt(http_client: &HttpClient, prompt: &str) -> AppResult<String> {
    send_chat_request(http_client, SYSTEM_PROMPT, prompt, false).await
}
