use anyhow::Context;
use chrono::Utc;
use sea_orm::SqlErr;

use crate::{
    db_core::prelude::*,
    error::{AppError, AppResult},
};

/// Lower-cased, trimmed form of an address, used for all lookups.
pub fn normalize_email_address(addr: &str) -> String {
    addr.trim().to_ascii_lowercase()
}

fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

pub struct CustomerCtrl;

impl CustomerCtrl {
    /// Resolves the sender of an inbound email to a customer row,
    /// creating one on first contact. Idempotent per normalized address.
    pub async fn find_or_create(
        conn: &DatabaseConnection,
        sender: &str,
    ) -> AppResult<customer::Model> {
        let email = normalize_email_address(sender);
        if let Some(existing) = Self::find_by_email(conn, &email).await? {
            return Ok(existing);
        }

        Self::create(conn, &email).await
    }

    /// First match wins; ordering of duplicate rows is store-defined.
    pub async fn find_by_email(
        conn: &DatabaseConnection,
        email: &str,
    ) -> AppResult<Option<customer::Model>> {
        let customer = Customer::find()
            .filter(customer::Column::Email.eq(email))
            .one(conn)
            .await
            .context("Error fetching customer by email")?;

        Ok(customer)
    }

    pub async fn get_by_id(conn: &DatabaseConnection, id: i32) -> AppResult<customer::Model> {
        let customer = Customer::find_by_id(id)
            .one(conn)
            .await
            .context("Error fetching customer by id")?
            .ok_or(AppError::NotFound("Customer not found".to_string()))?;

        Ok(customer)
    }

    pub async fn create(conn: &DatabaseConnection, email: &str) -> AppResult<customer::Model> {
        let now = Utc::now().into();
        let active_model = customer::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(default_name(email)),
            email: ActiveValue::Set(email.to_string()),
            phone: ActiveValue::Set(None),
            company: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        match Customer::insert(active_model).exec(conn).await {
            Ok(res) => Self::get_by_id(conn, res.last_insert_id).await,
            Err(e) => match e.sql_err() {
                // Two concurrent first emails from the same address race
                // to this insert; the loser reuses the winner's row.
                Some(SqlErr::UniqueConstraintViolation(_)) => Self::find_by_email(conn, email)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Customer vanished after insert race: {}", email))
                    }),
                _ => Err(e).context("Error creating customer")?,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    fn customer_fixture(id: i32, email: &str) -> customer::Model {
        let now = Utc::now().into();
        customer::Model {
            id,
            name: default_name(email),
            email: email.to_string(),
            phone: None,
            company: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_email_address() {
        assert_eq!(normalize_email_address(" Foo@Bar.com "), "foo@bar.com");
        assert_eq!(normalize_email_address("a@b.c"), "a@b.c");
    }

    #[test]
    fn test_default_name_uses_local_part() {
        assert_eq!(default_name("jane.doe@example.com"), "jane.doe");
        assert_eq!(default_name("no-at-sign"), "no-at-sign");
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_customer_on_second_call() {
        let existing = customer_fixture(7, "foo@bar.com");
        let empty: Vec<customer::Model> = vec![];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            // First call: miss, insert, re-fetch. Second call: hit.
            .append_query_results([
                empty,
                vec![existing.clone()],
                vec![existing.clone()],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 7,
                rows_affected: 1,
            }])
            .into_connection();

        let first = CustomerCtrl::find_or_create(&conn, " Foo@Bar.com ").await.unwrap();
        let second = CustomerCtrl::find_or_create(&conn, "foo@bar.com").await.unwrap();

        assert_eq!(first.id, 7);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_inserts_normalized_address() {
        let created = customer_fixture(1, "foo@bar.com");
        let empty: Vec<customer::Model> = vec![];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([empty, vec![created]])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            .into_connection();

        let customer = CustomerCtrl::find_or_create(&conn, " Foo@Bar.com ").await.unwrap();
        assert_eq!(customer.email, "foo@bar.com");

        let log = conn.into_transaction_log();
        let dump = format!("{:?}", log);
        assert!(dump.contains("foo@bar.com"));
        assert!(!dump.contains("Foo@Bar.com"));
    }
}
