use anyhow::Context;
use chrono::Utc;
use sea_orm::SqlErr;
use serde_json::json;

use crate::{
    db_core::prelude::*,
    error::{AppError, AppResult},
    model::customer::normalize_email_address,
    server_config::cfg,
};

pub struct AgentCtrl;

impl AgentCtrl {
    /// Called on every sign-in; the first one for a new user creates the
    /// agent row. Idempotent per email address.
    pub async fn ensure_for_sign_in(
        conn: &DatabaseConnection,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<agent::Model> {
        let email = normalize_email_address(email);
        if let Some(existing) = Self::find_by_email(conn, &email).await? {
            return Ok(existing);
        }

        Self::create(conn, &email, name).await
    }

    pub async fn find_by_email(
        conn: &DatabaseConnection,
        email: &str,
    ) -> AppResult<Option<agent::Model>> {
        let agent = Agent::find()
            .filter(agent::Column::Email.eq(email))
            .one(conn)
            .await
            .context("Error fetching agent by email")?;

        Ok(agent)
    }

    pub async fn get_by_id(conn: &DatabaseConnection, agent_id: i32) -> AppResult<agent::Model> {
        let agent = Agent::find_by_id(agent_id)
            .one(conn)
            .await
            .context("Error fetching agent by id")?
            .ok_or(AppError::NotFound("Agent not found".to_string()))?;

        Ok(agent)
    }

    pub async fn create(
        conn: &DatabaseConnection,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<agent::Model> {
        let now = Utc::now().into();
        let active_model = agent::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(
                name.map(str::to_string)
                    .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string()),
            ),
            email: ActiveValue::Set(email.to_string()),
            status: ActiveValue::Set(AgentStatus::Available),
            max_concurrent_tickets: ActiveValue::Set(cfg.agents.default_max_concurrent_tickets),
            assigned_categories: ActiveValue::Set(json!([])),
            supervisor_id: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        match Agent::insert(active_model).exec(conn).await {
            Ok(res) => Self::get_by_id(conn, res.last_insert_id).await,
            Err(e) => match e.sql_err() {
                // Two concurrent first sign-ins of the same user race to
                // this insert; the loser reuses the winner's row.
                Some(SqlErr::UniqueConstraintViolation(_)) => Self::find_by_email(conn, email)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Agent vanished after insert race: {}", email))
                    }),
                _ => Err(e).context("Error creating agent")?,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    fn agent_fixture(id: i32, email: &str) -> agent::Model {
        let now = Utc::now().into();
        agent::Model {
            id,
            name: "Test Agent".to_string(),
            email: email.to_string(),
            status: AgentStatus::Available,
            max_concurrent_tickets: cfg.agents.default_max_concurrent_tickets,
            assigned_categories: json!([]),
            supervisor_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_ensure_for_sign_in_creates_then_reuses() {
        let existing = agent_fixture(3, "agent@autocrm.io");
        let empty: Vec<agent::Model> = vec![];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                empty,
                vec![existing.clone()],
                vec![existing.clone()],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 3,
                rows_affected: 1,
            }])
            .into_connection();

        let first = AgentCtrl::ensure_for_sign_in(&conn, "Agent@AutoCRM.io", Some("Test Agent"))
            .await
            .unwrap();
        let second = AgentCtrl::ensure_for_sign_in(&conn, "agent@autocrm.io", None)
            .await
            .unwrap();

        assert_eq!(first.id, 3);
        assert_eq!(first.id, second.id);
    }
}
