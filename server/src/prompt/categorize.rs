use anyhow::{anyhow, Context};
use entity::sea_orm_active_enums::{Category, EmailLanguage};
use indoc::{formatdoc, indoc};
use sea_orm::ActiveEnum;
use serde::Deserialize;

use super::send_chat_request;
use crate::{error::AppResult, HttpClient};

/// Validated classification of one inbound email.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationAnswer {
    pub category: Category,
    pub language: EmailLanguage,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawAnswer {
    category: String,
    language: String,
    confidence: f32,
}

const SYSTEM_PROMPT: &str = indoc! {r#"
    You are an email classification engine for a customer support desk.
    Your task is to classify the given email into one category and one language from the fixed taxonomies below.

    Instructions:
    Read the email content carefully (subject and body).
    Determine the sender's intent, not the reader's reaction.
    Choose the single best category.
    If multiple categories apply, choose the dominant intent.
    Do not invent new categories or language codes.

    Categories (authoritative):
    • "ACCOUNT"
    • "BILLING"
    • "SUPPORT"
    • "SALES"
    • "OTHER"

    Languages (authoritative):
    • "EN"
    • "DE"
    • "ES"
    • "FR"
    • "JA"

    You will only respond with a JSON object with the keys category, language, and confidence.
    "confidence" is a float between 0 and 1 representing classification certainty.
    Do not provide explanations."#
};

/// Build the user prompt for email categorization.
pub fn categorization_user_prompt(subject: &str, body: &str) -> String {
    formatdoc!(
        r#"Classify the following email based on subject and body.

        <subject>{}</subject>
        <body>{}</body>"#,
        subject,
        body
    )
}

/// Strict parse of the model's JSON reply. Any value outside the declared
/// schema fails the whole request; nothing is persisted in that case.
pub fn parse_categorization_answer(content: &str) -> anyhow::Result<CategorizationAnswer> {
    let raw: RawAnswer = serde_json::from_str(content)
        .with_context(|| format!("Categorization reply is not valid JSON: {}", content))?;

    let category = Category::try_from_value(&raw.category)
        .map_err(|_| anyhow!("Unknown category in reply: {}", raw.category))?;
    let language = EmailLanguage::try_from_value(&raw.language)
        .map_err(|_| anyhow!("Unknown language in reply: {}", raw.language))?;
    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(anyhow!("Confidence out of range: {}", raw.confidence));
    }

    Ok(CategorizationAnswer {
        category,
        language,
        confidence: raw.confidence,
    })
}

pub async fn send_categorization_prompt(
    http_client: &HttpClient,
    subject: &str,
    body: &str,
) -> AppResult<CategorizationAnswer> {
    let user_prompt = categorization_user_prompt(subject, body);
    let content = send_chat_request(http_client, SYSTEM_PROMPT, &user_prompt, true).await?;

    Ok(parse_categorization_answer(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_answer() {
        let answer = parse_categorization_answer(
            r#"{"category": "BILLING", "language": "DE", "confidence": 0.92}"#,
        )
        .unwrap();

        assert_eq!(answer.category, Category::Billing);
        assert_eq!(answer.language, EmailLanguage::De);
        assert!((answer.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let result = parse_categorization_answer(
            r#"{"category": "SPAM", "language": "EN", "confidence": 0.5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_lowercase_values() {
        let result = parse_categorization_answer(
            r#"{"category": "support", "language": "EN", "confidence": 0.5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let result = parse_categorization_answer(
            r#"{"category": "SUPPORT", "language": "EN", "confidence": 1.2}"#,
        );
        assert!(result.is_err());

        let result = parse_categorization_answer(
            r#"{"category": "SUPPORT", "language": "EN", "confidence": -0.1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let result = parse_categorization_answer(r#"{"category": "SUPPORT", "confidence": 0.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_non_json_reply() {
        let result = parse_categorization_answer("The email is about billing.");
        assert!(result.is_err());
    }

    #[test]
    fn test_user_prompt_embeds_subject_and_body() {
        let prompt = categorization_user_prompt("Invoice overdue", "Bitte zahlen Sie");
        assert!(prompt.contains("<subject>Invoice overdue</subject>"));
        assert!(prompt.contains("<body>Bitte zahlen Sie</body>"));
    }
}
