use anyhow::Context;

use crate::{
    db_core::prelude::*,
    email::{fetcher::fetch_raw_email, parsed_message::ParsedInboundEmail},
    error::AppResult,
    model::{
        customer::CustomerCtrl,
        ticket::TicketCtrl,
        ticket_activity::TicketActivityCtrl,
    },
    server_config::cfg,
};

/// Fields of the upstream notification that drive one ingestion pass.
#[derive(Debug, Clone)]
pub struct InboundNotification {
    /// Object key of the stored raw message.
    pub message_id: String,
    /// Sender address as reported by the receiving service.
    pub source: Option<String>,
    pub subject: Option<String>,
}

/// Everything written by one ingestion pass.
#[derive(Debug)]
pub struct IngestOutcome {
    pub customer: customer::Model,
    pub ticket: ticket::Model,
    pub activity: ticket_activity::Model,
    pub created_new_ticket: bool,
}

/// Linear fetch → parse → resolve → append pipeline. The first failing
/// stage aborts the request; there is no retry. Re-delivery of the same
/// message lands on the same (now existing) ticket but appends a second
/// activity record.
pub async fn ingest_inbound_email(
    s3: &aws_sdk_s3::Client,
    conn: &DatabaseConnection,
    notification: &InboundNotification,
) -> AppResult<IngestOutcome> {
    let raw = fetch_raw_email(s3, &cfg.ingest.bucket, &notification.message_id).await?;
    let parsed = ParsedInboundEmail::parse(&raw)?;

    let sender = notification
        .source
        .clone()
        .or_else(|| parsed.from.clone())
        .context("Inbound email has no sender address")?;
    let subject = notification
        .subject
        .clone()
        .or_else(|| parsed.subject.clone())
        .unwrap_or_default();

    let customer = CustomerCtrl::find_or_create(conn, &sender).await?;
    let (ticket, created_new_ticket) =
        TicketCtrl::resolve_active_or_create(conn, customer.id, &subject, &notification.message_id)
            .await?;

    let activity = TicketActivityCtrl::append_email_received(conn, ticket.id, &parsed).await?;
    let ticket = TicketCtrl::touch_last_email_received(conn, ticket.id).await?;

    tracing::info!(
        "Ingested message {} into ticket {} (customer {}, new: {})",
        notification.message_id,
        ticket.id,
        customer.id,
        created_new_ticket,
    );

    Ok(IngestOutcome {
        customer,
        ticket,
        activity,
        created_new_ticket,
    })
}
