use anyhow::Context;
use chrono::Utc;
use sea_orm::Select;

use crate::{
    db_core::prelude::*,
    error::{AppError, AppResult},
    server_config::cfg,
};

/// Recency key for the "continue existing thread" policy: tickets that
/// never received an email fall back to their creation time.
const ACTIVE_THREAD_ORDER: &str =
    r#"COALESCE("ticket"."last_email_received_at", "ticket"."created_at")"#;

pub struct TicketCtrl;

impl TicketCtrl {
    fn active_thread_query(customer_id: i32) -> Select<Ticket> {
        Ticket::find()
            .filter(ticket::Column::CustomerId.eq(customer_id))
            .filter(ticket::Column::Category.eq(Category::Support))
            .filter(ticket::Column::Status.ne(TicketStatus::Closed))
            .order_by_desc(Expr::cust(ACTIVE_THREAD_ORDER))
    }

    /// The customer's active email thread: the most recently emailed
    /// SUPPORT ticket that is not CLOSED. Subject lines and thread ids
    /// play no part in the correlation.
    pub async fn find_active_for_customer(
        conn: &DatabaseConnection,
        customer_id: i32,
    ) -> AppResult<Option<ticket::Model>> {
        let ticket = Self::active_thread_query(customer_id)
            .one(conn)
            .await
            .context("Error fetching active ticket for customer")?;

        Ok(ticket)
    }

    /// Attaches the inbound email to the active thread, or opens a new
    /// ticket when the customer has none. Returns the ticket and whether
    /// it was created by this call.
    pub async fn resolve_active_or_create(
        conn: &DatabaseConnection,
        customer_id: i32,
        subject: &str,
        message_id: &str,
    ) -> AppResult<(ticket::Model, bool)> {
        if let Some(ticket) = Self::find_active_for_customer(conn, customer_id).await? {
            return Ok((ticket, false));
        }

        let ticket = Self::create_from_email(conn, customer_id, subject, message_id).await?;
        Ok((ticket, true))
    }

    pub async fn create_from_email(
        conn: &DatabaseConnection,
        customer_id: i32,
        subject: &str,
        message_id: &str,
    ) -> AppResult<ticket::Model> {
        let now = Utc::now().into();
        let active_model = ticket::ActiveModel {
            id: ActiveValue::NotSet,
            title: ActiveValue::Set(ticket_title_from_subject(subject)),
            description: ActiveValue::Set(None),
            status: ActiveValue::Set(TicketStatus::Open),
            priority: ActiveValue::Set(TicketPriority::Medium),
            category: ActiveValue::Set(Category::Support),
            customer_id: ActiveValue::Set(customer_id),
            assigned_agent_id: ActiveValue::Set(None),
            email_thread_id: ActiveValue::Set(Some(message_id.to_string())),
            last_email_received_at: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let insert_result = Ticket::insert(active_model)
            .exec(conn)
            .await
            .context("Error creating ticket")?;

        Self::get_by_id(conn, insert_result.last_insert_id).await
    }

    pub async fn get_by_id(conn: &DatabaseConnection, ticket_id: i32) -> AppResult<ticket::Model> {
        let ticket = Ticket::find_by_id(ticket_id)
            .one(conn)
            .await
            .context("Error fetching ticket by id")?
            .ok_or(AppError::NotFound("Ticket not found".to_string()))?;

        Ok(ticket)
    }

    /// Second, independent write after the activity append; a crash in
    /// between leaves the activity persisted and the timestamp stale.
    pub async fn touch_last_email_received(
        conn: &DatabaseConnection,
        ticket_id: i32,
    ) -> AppResult<ticket::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let ticket = Ticket::update(ticket::ActiveModel {
            id: ActiveValue::Set(ticket_id),
            last_email_received_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .exec(conn)
        .await
        .context("Error updating last email timestamp")?;

        Ok(ticket)
    }
}

fn ticket_title_from_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        cfg.ingest.default_ticket_title.clone()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, DbBackend, MockDatabase, MockExecResult};

    use super::*;

    fn ticket_fixture(id: i32, customer_id: i32, emailed_at: Option<DateTimeWithTimeZone>) -> ticket::Model {
        let now = Utc::now().into();
        ticket::Model {
            id,
            title: "Help".to_string(),
            description: None,
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            category: Category::Support,
            customer_id,
            assigned_agent_id: None,
            email_thread_id: None,
            last_email_received_at: emailed_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_title_falls_back_when_subject_blank() {
        assert_eq!(ticket_title_from_subject("Help"), "Help");
        assert_eq!(ticket_title_from_subject("  Help  "), "Help");
        assert_eq!(
            ticket_title_from_subject("   "),
            cfg.ingest.default_ticket_title
        );
    }

    #[test]
    fn test_active_thread_query_shape() {
        let sql = TicketCtrl::active_thread_query(42)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""customer_id" = 42"#));
        assert!(sql.contains("'SUPPORT'"));
        assert!(sql.contains("<> 'CLOSED'"));
        assert!(sql.contains("ORDER BY COALESCE"));
        assert!(sql.contains("DESC"));
    }

    #[tokio::test]
    async fn test_resolve_reuses_most_recently_emailed_ticket() {
        // The store answers the recency query with the t2 ticket; the
        // resolver must hand it back untouched instead of creating one.
        let emailed_at = Utc::now().fixed_offset() - Duration::hours(1);
        let most_recent = ticket_fixture(12, 42, Some(emailed_at));
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![most_recent.clone()]])
            .into_connection();

        let (ticket, created) = TicketCtrl::resolve_active_or_create(&conn, 42, "Anything", "m9")
            .await
            .unwrap();

        assert!(!created);
        assert_eq!(ticket.id, 12);
    }

    #[tokio::test]
    async fn test_resolve_creates_ticket_when_no_open_thread() {
        let created_ticket = ticket_fixture(1, 42, None);
        let empty: Vec<ticket::Model> = vec![];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([empty, vec![created_ticket]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        let (ticket, created) = TicketCtrl::resolve_active_or_create(&conn, 42, "Help", "m1")
            .await
            .unwrap();

        assert!(created);
        assert_eq!(ticket.status, TicketStatus::Open);

        // The insert must carry the OPEN/MEDIUM/SUPPORT defaults and the
        // message id as thread identifier.
        let dump = format!("{:?}", conn.into_transaction_log());
        assert!(dump.contains("OPEN"));
        assert!(dump.contains("MEDIUM"));
        assert!(dump.contains("SUPPORT"));
        assert!(dump.contains("m1"));
    }

    #[tokio::test]
    async fn test_touch_writes_last_email_received_at() {
        let emailed_at = Utc::now().fixed_offset();
        let updated = ticket_fixture(12, 42, Some(emailed_at));
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![updated]])
            .into_connection();

        let ticket = TicketCtrl::touch_last_email_received(&conn, 12).await.unwrap();
        assert!(ticket.last_email_received_at.is_some());

        let dump = format!("{:?}", conn.into_transaction_log());
        assert!(dump.contains("last_email_received_at"));
    }
}
