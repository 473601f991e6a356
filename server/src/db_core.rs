/// Shared imports for the model layer: entity types plus the sea-orm
/// surface the Ctrl structs are written against.
pub mod prelude {
    pub use entity::prelude::*;
    pub use entity::sea_orm_active_enums::*;
    pub use entity::{
        agent, customer, email_categorization, incoming_email, ticket, ticket_activity,
    };
    pub use sea_orm::{
        prelude::DateTimeWithTimeZone, sea_query::Expr, ActiveModelTrait, ActiveValue,
        ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
        PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    };
}
