pub use super::agent::Entity as Agent;
pub use super::customer::Entity as Customer;
pub use super::email_categorization::Entity as EmailCategorization;
pub use super::incoming_email::Entity as IncomingEmail;
pub use super::ticket::Entity as Ticket;
pub use super::ticket_activity::Entity as TicketActivity;
