use anyhow::Context;
use chrono::Utc;

use crate::{
    db_core::prelude::*,
    error::{AppError, AppResult},
};

pub struct IncomingEmailCtrl;

impl IncomingEmailCtrl {
    /// Captures one inbound message for categorization. Nothing
    /// deduplicates here: the same logical email submitted twice yields
    /// two rows.
    pub async fn insert(
        conn: &DatabaseConnection,
        from_address: &str,
        to_address: &str,
        subject: &str,
        body: &str,
        received_at: DateTimeWithTimeZone,
    ) -> AppResult<incoming_email::Model> {
        let active_model = incoming_email::ActiveModel {
            id: ActiveValue::NotSet,
            from_address: ActiveValue::Set(from_address.to_string()),
            to_address: ActiveValue::Set(to_address.to_string()),
            subject: ActiveValue::Set(subject.to_string()),
            body: ActiveValue::Set(body.to_string()),
            received_at: ActiveValue::Set(received_at),
            created_at: ActiveValue::Set(Utc::now().into()),
        };

        let insert_result = IncomingEmail::insert(active_model)
            .exec(conn)
            .await
            .context("Error inserting incoming email")?;

        Self::get_required_by_id(conn, insert_result.last_insert_id).await
    }

    /// The feedback loop tolerates missing rows, so this returns an
    /// Option instead of a NotFound error.
    pub async fn get_by_id(
        conn: &DatabaseConnection,
        email_id: i32,
    ) -> AppResult<Option<incoming_email::Model>> {
        let email = IncomingEmail::find_by_id(email_id)
            .one(conn)
            .await
            .context("Error fetching incoming email by id")?;

        Ok(email)
    }

    async fn get_required_by_id(
        conn: &DatabaseConnection,
        email_id: i32,
    ) -> AppResult<incoming_email::Model> {
        Self::get_by_id(conn, email_id)
            .await?
            .ok_or(AppError::NotFound("Incoming email not found".to_string()))
    }
}
