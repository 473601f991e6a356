use anyhow::Context;
use chrono::Utc;
use indoc::formatdoc;

use crate::{
    db_core::prelude::*,
    email::parsed_message::ParsedInboundEmail,
    error::{AppError, AppResult},
};

/// Author recorded on pipeline-generated activity rows.
pub const SYSTEM_AUTHOR: &str = "SYSTEM";

/// Text block persisted for an EMAIL_RECEIVED activity.
pub fn format_email_activity(parsed: &ParsedInboundEmail) -> String {
    formatdoc!(
        r#"From: {from}
        Subject: {subject}
        Date: {date}

        {body}"#,
        from = parsed.from.as_deref().unwrap_or("(unknown sender)"),
        subject = parsed.subject.as_deref().unwrap_or("(no subject)"),
        date = parsed.date.as_deref().unwrap_or("(no date)"),
        body = parsed.body.as_deref().unwrap_or(""),
    )
}

pub struct TicketActivityCtrl;

impl TicketActivityCtrl {
    pub async fn append_email_received(
        conn: &DatabaseConnection,
        ticket_id: i32,
        parsed: &ParsedInboundEmail,
    ) -> AppResult<ticket_activity::Model> {
        let content = format_email_activity(parsed);
        Self::append(
            conn,
            ticket_id,
            ActivityType::EmailReceived,
            SYSTEM_AUTHOR,
            &content,
        )
        .await
    }

    /// Rows are append-only; nothing in the service edits or deletes them.
    pub async fn append(
        conn: &DatabaseConnection,
        ticket_id: i32,
        activity_type: ActivityType,
        author: &str,
        content: &str,
    ) -> AppResult<ticket_activity::Model> {
        let active_model = ticket_activity::ActiveModel {
            id: ActiveValue::NotSet,
            ticket_id: ActiveValue::Set(ticket_id),
            activity_type: ActiveValue::Set(activity_type),
            content: ActiveValue::Set(content.to_string()),
            author: ActiveValue::Set(author.to_string()),
            created_at: ActiveValue::Set(Utc::now().into()),
        };

        let insert_result = TicketActivity::insert(active_model)
            .exec(conn)
            .await
            .context("Error appending ticket activity")?;

        Self::get_by_id(conn, insert_result.last_insert_id).await
    }

    async fn get_by_id(
        conn: &DatabaseConnection,
        activity_id: i32,
    ) -> AppResult<ticket_activity::Model> {
        let activity = TicketActivity::find_by_id(activity_id)
            .one(conn)
            .await
            .context("Error fetching ticket activity by id")?
            .ok_or(AppError::NotFound("Ticket activity not found".to_string()))?;

        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_email_activity_includes_all_fields() {
        let parsed = ParsedInboundEmail {
            from: Some("foo@bar.com".to_string()),
            subject: Some("Help".to_string()),
            date: Some("2025-01-06T10:30:00Z".to_string()),
            body: Some("I need help".to_string()),
        };

        let content = format_email_activity(&parsed);
        assert!(content.contains("From: foo@bar.com"));
        assert!(content.contains("Subject: Help"));
        assert!(content.contains("Date: 2025-01-06T10:30:00Z"));
        assert!(content.contains("I need help"));
    }

    #[test]
    fn test_format_email_activity_with_missing_fields() {
        let content = format_email_activity(&ParsedInboundEmail::default());
        assert!(content.contains("(unknown sender)"));
        assert!(content.contains("(no subject)"));
    }
}
