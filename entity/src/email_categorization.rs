use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{Category, EmailLanguage};

/// A model-produced classification of one inbound email, subject to human
/// correction. Several rows may reference the same incoming email; nothing
/// enforces uniqueness on `incoming_email_id`.
///
/// `llm_suggestion` holds the raw advisory payload produced by the feedback
/// loop; it is never applied automatically.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_categorization")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub incoming_email_id: i32,
    pub category: Category,
    pub language: EmailLanguage,
    pub confidence: f32,
    pub is_category_correct: Option<bool>,
    pub is_language_correct: Option<bool>,
    pub corrected_category: Option<Category>,
    pub corrected_language: Option<EmailLanguage>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub llm_suggestion: Option<Json>,
    #[serde(rename = "feedbackSentToLLM")]
    pub feedback_sent_to_llm: bool,
    pub feedback_sent_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::incoming_email::Entity",
        from = "Column::IncomingEmailId",
        to = "super::incoming_email::Column::Id"
    )]
    IncomingEmail,
}

impl Related<super::incoming_email::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomingEmail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
