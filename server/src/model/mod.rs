pub mod agent;
pub mod customer;
pub mod email_categorization;
pub mod incoming_email;
pub mod ticket;
pub mod ticket_activity;
