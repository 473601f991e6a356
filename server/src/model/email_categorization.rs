use anyhow::Context;
use chrono::Utc;
use sea_orm::Select;

use crate::{
    db_core::prelude::*,
    error::{AppError, AppResult},
};

/// Query parameters of the suggestions read endpoint, applied to the
/// query in a fixed order so its shape stays deterministic regardless of
/// which parameters are present.
#[derive(Debug, Default, Clone)]
pub struct SuggestionFilter {
    pub categorization_id: Option<i32>,
    pub has_llm_suggestion: Option<bool>,
    pub category: Option<Category>,
    pub language: Option<EmailLanguage>,
    pub limit: Option<u64>,
}

const DEFAULT_SUGGESTION_LIMIT: u64 = 50;
const MAX_SUGGESTION_LIMIT: u64 = 200;

impl SuggestionFilter {
    fn to_condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(id) = self.categorization_id {
            condition = condition.add(email_categorization::Column::Id.eq(id));
        }
        if let Some(has_suggestion) = self.has_llm_suggestion {
            condition = condition.add(if has_suggestion {
                email_categorization::Column::LlmSuggestion.is_not_null()
            } else {
                email_categorization::Column::LlmSuggestion.is_null()
            });
        }
        if let Some(ref category) = self.category {
            condition = condition.add(email_categorization::Column::Category.eq(category.clone()));
        }
        if let Some(ref language) = self.language {
            condition = condition.add(email_categorization::Column::Language.eq(language.clone()));
        }
        condition
    }

    fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
            .min(MAX_SUGGESTION_LIMIT)
    }
}

pub struct EmailCategorizationCtrl;

impl EmailCategorizationCtrl {
    pub async fn insert(
        conn: &DatabaseConnection,
        incoming_email_id: i32,
        category: Category,
        language: EmailLanguage,
        confidence: f32,
    ) -> AppResult<email_categorization::Model> {
        let now = Utc::now().into();
        let active_model = email_categorization::ActiveModel {
            id: ActiveValue::NotSet,
            incoming_email_id: ActiveValue::Set(incoming_email_id),
            category: ActiveValue::Set(category),
            language: ActiveValue::Set(language),
            confidence: ActiveValue::Set(confidence),
            is_category_correct: ActiveValue::Set(None),
            is_language_correct: ActiveValue::Set(None),
            corrected_category: ActiveValue::Set(None),
            corrected_language: ActiveValue::Set(None),
            llm_suggestion: ActiveValue::Set(None),
            feedback_sent_to_llm: ActiveValue::Set(false),
            feedback_sent_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let insert_result = EmailCategorization::insert(active_model)
            .exec(conn)
            .await
            .context("Error inserting email categorization")?;

        Self::get_required_by_id(conn, insert_result.last_insert_id).await
    }

    pub async fn get_by_id(
        conn: &DatabaseConnection,
        categorization_id: i32,
    ) -> AppResult<Option<email_categorization::Model>> {
        let categorization = EmailCategorization::find_by_id(categorization_id)
            .one(conn)
            .await
            .context("Error fetching email categorization by id")?;

        Ok(categorization)
    }

    async fn get_required_by_id(
        conn: &DatabaseConnection,
        categorization_id: i32,
    ) -> AppResult<email_categorization::Model> {
        Self::get_by_id(conn, categorization_id)
            .await?
            .ok_or(AppError::NotFound(
                "Email categorization not found".to_string(),
            ))
    }

    /// Records the reviewer's verdict. Does not reset feedback_sent_to_llm:
    /// a record already used as feedback is never re-sent (see
    /// find_pending_feedback).
    pub async fn record_human_feedback(
        conn: &DatabaseConnection,
        categorization_id: i32,
        is_category_correct: bool,
        is_language_correct: bool,
        corrected_category: Option<Category>,
        corrected_language: Option<EmailLanguage>,
    ) -> AppResult<email_categorization::Model> {
        // Surface a 404 before attempting the update.
        Self::get_required_by_id(conn, categorization_id).await?;

        let updated = EmailCategorization::update(email_categorization::ActiveModel {
            id: ActiveValue::Set(categorization_id),
            is_category_correct: ActiveValue::Set(Some(is_category_correct)),
            is_language_correct: ActiveValue::Set(Some(is_language_correct)),
            corrected_category: ActiveValue::Set(corrected_category),
            corrected_language: ActiveValue::Set(corrected_language),
            updated_at: ActiveValue::Set(Utc::now().into()),
            ..Default::default()
        })
        .exec(conn)
        .await
        .context("Error recording categorization feedback")?;

        Ok(updated)
    }

    fn pending_feedback_query(batch_size: u64) -> Select<EmailCategorization> {
        EmailCategorization::find()
            .filter(email_categorization::Column::FeedbackSentToLlm.eq(false))
            .filter(
                Condition::any()
                    .add(email_categorization::Column::IsCategoryCorrect.eq(false))
                    .add(email_categorization::Column::IsLanguageCorrect.eq(false)),
            )
            .order_by_asc(email_categorization::Column::Id)
            .limit(batch_size)
    }

    /// Reviewer-flagged records that have not yet been fed back to the
    /// model. Records with feedback_sent_to_llm = true are never
    /// re-selected, whatever their correctness flags say.
    pub async fn find_pending_feedback(
        conn: &DatabaseConnection,
        batch_size: u64,
    ) -> AppResult<Vec<email_categorization::Model>> {
        let pending = Self::pending_feedback_query(batch_size)
            .all(conn)
            .await
            .context("Error fetching categorizations pending feedback")?;

        Ok(pending)
    }

    /// Persists the advisory suggestion and marks the record as used for
    /// feedback in the same write.
    pub async fn store_suggestion(
        conn: &DatabaseConnection,
        categorization_id: i32,
        suggestion: serde_json::Value,
    ) -> AppResult<email_categorization::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let updated = EmailCategorization::update(email_categorization::ActiveModel {
            id: ActiveValue::Set(categorization_id),
            llm_suggestion: ActiveValue::Set(Some(suggestion)),
            feedback_sent_to_llm: ActiveValue::Set(true),
            feedback_sent_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .exec(conn)
        .await
        .context("Error storing feedback suggestion")?;

        Ok(updated)
    }

    fn suggestions_query(filter: &SuggestionFilter) -> Select<EmailCategorization> {
        EmailCategorization::find()
            .filter(filter.to_condition())
            .order_by_desc(email_categorization::Column::Id)
            .limit(filter.effective_limit())
    }

    pub async fn find_suggestions(
        conn: &DatabaseConnection,
        filter: &SuggestionFilter,
    ) -> AppResult<Vec<email_categorization::Model>> {
        let rows = Self::suggestions_query(filter)
            .all(conn)
            .await
            .context("Error fetching email suggestions")?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbBackend;

    use super::*;

    #[test]
    fn test_pending_feedback_query_shape() {
        let sql = EmailCategorizationCtrl::pending_feedback_query(50)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""feedback_sent_to_llm" = FALSE"#));
        assert!(sql.contains(r#""is_category_correct" = FALSE"#));
        assert!(sql.contains(r#""is_language_correct" = FALSE"#));
        assert!(sql.contains(" OR "));
        assert!(sql.contains("LIMIT 50"));
    }

    #[test]
    fn test_suggestions_query_applies_filters_in_order() {
        let filter = SuggestionFilter {
            categorization_id: Some(9),
            has_llm_suggestion: Some(true),
            category: Some(Category::Billing),
            language: Some(EmailLanguage::De),
            limit: Some(10),
        };

        let sql = EmailCategorizationCtrl::suggestions_query(&filter)
            .build(DbBackend::Postgres)
            .to_string();

        let id_pos = sql.find(r#""id" = 9"#).unwrap();
        let suggestion_pos = sql.find(r#""llm_suggestion" IS NOT NULL"#).unwrap();
        let category_pos = sql.find("'BILLING'").unwrap();
        let language_pos = sql.find("'DE'").unwrap();

        assert!(id_pos < suggestion_pos);
        assert!(suggestion_pos < category_pos);
        assert!(category_pos < language_pos);
        assert!(sql.contains("LIMIT 10"));
    }

    #[test]
    fn test_suggestions_query_default_and_capped_limit() {
        let default_sql =
            EmailCategorizationCtrl::suggestions_query(&SuggestionFilter::default())
                .build(DbBackend::Postgres)
                .to_string();
        assert!(default_sql.contains("LIMIT 50"));

        let capped_sql = EmailCategorizationCtrl::suggestions_query(&SuggestionFilter {
            limit: Some(100_000),
            ..Default::default()
        })
        .build(DbBackend::Postgres)
        .to_string();
        assert!(capped_sql.contains("LIMIT 200"));
    }
}
