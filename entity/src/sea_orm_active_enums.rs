use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shared taxonomy for tickets and email categorizations.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Category {
    #[sea_orm(string_value = "ACCOUNT")]
    #[serde(rename = "ACCOUNT")]
    Account,

    #[sea_orm(string_value = "BILLING")]
    #[serde(rename = "BILLING")]
    Billing,

    #[sea_orm(string_value = "SUPPORT")]
    #[serde(rename = "SUPPORT")]
    Support,

    #[sea_orm(string_value = "SALES")]
    #[serde(rename = "SALES")]
    Sales,

    #[sea_orm(string_value = "OTHER")]
    #[serde(rename = "OTHER")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TicketStatus {
    #[sea_orm(string_value = "OPEN")]
    #[serde(rename = "OPEN")]
    Open,

    #[sea_orm(string_value = "IN_PROGRESS")]
    #[serde(rename = "IN_PROGRESS")]
    InProgress,

    #[sea_orm(string_value = "RESOLVED")]
    #[serde(rename = "RESOLVED")]
    Resolved,

    #[sea_orm(string_value = "CLOSED")]
    #[serde(rename = "CLOSED")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TicketPriority {
    #[sea_orm(string_value = "LOW")]
    #[serde(rename = "LOW")]
    Low,

    #[sea_orm(string_value = "MEDIUM")]
    #[serde(rename = "MEDIUM")]
    Medium,

    #[sea_orm(string_value = "HIGH")]
    #[serde(rename = "HIGH")]
    High,

    #[sea_orm(string_value = "URGENT")]
    #[serde(rename = "URGENT")]
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum AgentStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    #[serde(rename = "AVAILABLE")]
    Available,

    #[sea_orm(string_value = "BUSY")]
    #[serde(rename = "BUSY")]
    Busy,

    #[sea_orm(string_value = "OFFLINE")]
    #[serde(rename = "OFFLINE")]
    Offline,
}

/// Kind of entry in a ticket's append-only activity log.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ActivityType {
    #[sea_orm(string_value = "COMMENT")]
    #[serde(rename = "COMMENT")]
    Comment,

    #[sea_orm(string_value = "STATUS_CHANGE")]
    #[serde(rename = "STATUS_CHANGE")]
    StatusChange,

    #[sea_orm(string_value = "EMAIL_RECEIVED")]
    #[serde(rename = "EMAIL_RECEIVED")]
    EmailReceived,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EmailLanguage {
    #[sea_orm(string_value = "EN")]
    #[serde(rename = "EN")]
    En,

    #[sea_orm(string_value = "DE")]
    #[serde(rename = "DE")]
    De,

    #[sea_orm(string_value = "ES")]
    #[serde(rename = "ES")]
    Es,

    #[sea_orm(string_value = "FR")]
    #[serde(rename = "FR")]
    Fr,

    #[sea_orm(string_value = "JA")]
    #[serde(rename = "JA")]
    Ja,
}
