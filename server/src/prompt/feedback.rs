use anyhow::Context;
use indoc::{formatdoc, indoc};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};

use super::send_chat_request;
use crate::{db_core::prelude::*, error::AppResult, HttpClient};

/// Advisory reclassification produced by the critique prompt. Stored
/// verbatim on the categorization row and surfaced to reviewers; never
/// applied automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSuggestion {
    pub analysis: String,
    pub suggested_category: String,
    pub suggested_language: String,
    pub explanation: String,
}

const SYSTEM_PROMPT: &str = indoc! {r#"
    You are reviewing the work of an email classification engine for a customer support desk.
    A human reviewer has flagged one of its classifications as wrong.
    Your task is to analyze the original email and the incorrect prediction, then suggest better labels.

    Valid categories: "ACCOUNT", "BILLING", "SUPPORT", "SALES", "OTHER".
    Valid language codes: "EN", "DE", "ES", "FR", "JA".

    You will only respond with a JSON object with the keys analysis, suggested_category, suggested_language, and explanation.
    "analysis" describes what the classifier likely missed.
    "explanation" justifies the suggested labels in one or two sentences."#
};

fn verdict(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "confirmed correct",
        Some(false) => "flagged incorrect",
        None => "not reviewed",
    }
}

/// Critique prompt embedding the original email, the wrong prediction and
/// the reviewer's verdicts.
pub fn feedback_user_prompt(
    email: &incoming_email::Model,
    categorization: &email_categorization::Model,
) -> String {
    let category_correction = categorization
        .corrected_category
        .as_ref()
        .map(|c| format!(", corrected to \"{}\"", c.to_value()))
        .unwrap_or_default();
    let language_correction = categorization
        .corrected_language
        .as_ref()
        .map(|l| format!(", corrected to \"{}\"", l.to_value()))
        .unwrap_or_default();

    formatdoc!(
        r#"A reviewer disagreed with the classification of this email.

        <subject>{subject}</subject>
        <body>{body}</body>

        Predicted category: "{category}" ({category_verdict}{category_correction})
        Predicted language: "{language}" ({language_verdict}{language_correction})
        Model confidence was {confidence:.2}.

        Analyze the email and suggest the correct labels."#,
        subject = email.subject,
        body = email.body,
        category = categorization.category.to_value(),
        category_verdict = verdict(categorization.is_category_correct),
        language = categorization.language.to_value(),
        language_verdict = verdict(categorization.is_language_correct),
        confidence = categorization.confidence,
    )
}

pub fn parse_feedback_suggestion(content: &str) -> anyhow::Result<FeedbackSuggestion> {
    serde_json::from_str(content)
        .with_context(|| format!("Feedback reply is not valid JSON: {}", content))
}

pub async fn send_feedback_prompt(
    http_client: &HttpClient,
    email: &incoming_email::Model,
    categorization: &email_categorization::Model,
) -> AppResult<FeedbackSuggestion> {
    let user_prompt = feedback_user_prompt(email, categorization);
    let content = send_chat_request(http_client, SYSTEM_PROMPT, &user_prompt, true).await?;

    Ok(parse_feedback_suggestion(&content)?)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn email_fixture() -> incoming_email::Model {
        let now = Utc::now().into();
        incoming_email::Model {
            id: 1,
            from_address: "foo@bar.com".to_string(),
            to_address: "support@autocrm.io".to_string(),
            subject: "Rechnung falsch".to_string(),
            body: "Meine Rechnung ist falsch".to_string(),
            received_at: now,
            created_at: now,
        }
    }

    fn categorization_fixture() -> email_categorization::Model {
        let now = Utc::now().into();
        email_categorization::Model {
            id: 2,
            incoming_email_id: 1,
            category: Category::Support,
            language: EmailLanguage::En,
            confidence: 0.61,
            is_category_correct: Some(false),
            is_language_correct: Some(false),
            corrected_category: Some(Category::Billing),
            corrected_language: None,
            llm_suggestion: None,
            feedback_sent_to_llm: false,
            feedback_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_feedback_prompt_embeds_prediction_and_verdicts() {
        let prompt = feedback_user_prompt(&email_fixture(), &categorization_fixture());

        assert!(prompt.contains("<subject>Rechnung falsch</subject>"));
        assert!(prompt.contains(r#"Predicted category: "SUPPORT""#));
        assert!(prompt.contains("flagged incorrect"));
        assert!(prompt.contains(r#"corrected to "BILLING""#));
        assert!(prompt.contains(r#"Predicted language: "EN""#));
    }

    #[test]
    fn test_parse_feedback_suggestion() {
        let suggestion = parse_feedback_suggestion(
            r#"{
                "analysis": "The email is about an invoice dispute.",
                "suggested_category": "BILLING",
                "suggested_language": "DE",
                "explanation": "Invoice wording and German text."
            }"#,
        )
        .unwrap();

        assert_eq!(suggestion.suggested_category, "BILLING");
        assert_eq!(suggestion.suggested_language, "DE");
    }

    #[test]
    fn test_parse_feedback_suggestion_rejects_incomplete_reply() {
        assert!(parse_feedback_suggestion(r#"{"analysis": "only analysis"}"#).is_err());
    }
}
