//! Unpaid-invoice reminder sweep.
//!
//! Periodically walks invoices still awaiting payment and nudges each
//! customer over chat. The chat id for a customer is the owning user's chat;
//! invoices whose email maps to no known customer are skipped.

use crate::bot::transport::ChatTransport;
use crate::core::{customers, invoices};
use crate::entities::{customer, invoice};
use crate::errors::Result;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

/// One reminder ready to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderNotice {
    /// Chat id to deliver to
    pub chat_id: String,
    /// Message body
    pub text: String,
}

/// Pairs unpaid invoices with the chat ids of their invoice owners. Pure so
/// the pairing logic is testable without a transport.
#[must_use]
pub fn reminder_notices(
    unpaid: &[invoice::Model],
    customers: &[customer::Model],
) -> Vec<ReminderNotice> {
    unpaid
        .iter()
        .filter_map(|inv| {
            let owner = customers
                .iter()
                .find(|c| c.email == inv.customer_email)
                .map(|c| c.owner_id.clone())?;
            Some(ReminderNotice {
                chat_id: owner,
                text: format!(
                    "⏰ Reminder: invoice #{} for {} (${}) is still {}.",
                    inv.id, inv.customer_email, inv.amount, inv.status
                ),
            })
        })
        .collect()
}

/// Runs one sweep: loads unpaid invoices and sends each owner a reminder.
/// Send failures are logged and do not stop the sweep.
pub async fn run_reminder_sweep(
    db: &DatabaseConnection,
    transport: &dyn ChatTransport,
) -> Result<usize> {
    let unpaid = invoices::get_unpaid_invoices(db).await?;
    let all_customers = customers::get_all_customers(db).await?;
    let notices = reminder_notices(&unpaid, &all_customers);

    let mut delivered = 0;
    for notice in &notices {
        match transport.send_text(&notice.chat_id, &notice.text).await {
            Ok(()) => delivered += 1,
            Err(e) => warn!(chat_id = %notice.chat_id, error = %e, "Reminder delivery failed"),
        }
    }
    if delivered > 0 {
        info!(delivered, "Reminder sweep complete");
    }
    Ok(delivered)
}

/// Drives sweeps on a fixed interval until the owning task is dropped.
/// Sweep failures are logged; the loop keeps ticking.
pub async fn run_reminder_loop(
    db: DatabaseConnection,
    transport: std::sync::Arc<dyn ChatTransport>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = run_reminder_sweep(&db, transport.as_ref()).await {
            warn!(error = %e, "Reminder sweep failed");
        }
    }
}
