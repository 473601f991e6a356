pub mod prelude;

pub mod agent;
pub mod customer;
pub mod email_categorization;
pub mod incoming_email;
pub mod sea_orm_active_enums;
pub mod ticket;
pub mod ticket_activity;
