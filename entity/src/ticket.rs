use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{Category, TicketPriority, TicketStatus};

/// A trackable customer support request with lifecycle state.
///
/// `email_thread_id` records the object key of the inbound message that
/// opened the ticket. Thread correlation on later emails is recency-based,
/// so the column is written on creation and never queried.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: Category,
    pub customer_id: i32,
    pub assigned_agent_id: Option<i32>,
    pub email_thread_id: Option<String>,
    pub last_email_received_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,

    #[sea_orm(
        belongs_to = "super::agent::Entity",
        from = "Column::AssignedAgentId",
        to = "super::agent::Column::Id"
    )]
    Agent,

    #[sea_orm(has_many = "super::ticket_activity::Entity")]
    TicketActivity,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::agent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agent.def()
    }
}

impl Related<super::ticket_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketActivity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
