use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw captured fields of a single inbound message, independent of ticket
/// linkage. Categorization targets point at rows of this table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incoming_email")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub received_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::email_categorization::Entity")]
    EmailCategorization,
}

impl Related<super::email_categorization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailCategorization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
