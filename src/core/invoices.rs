//! Invoice Lifecycle Engine.
//!
//! Owns the canonical invoice row: inserted once a provider confirms an
//! invoice was sent, then converged on by webhook deliveries and manual
//! status polls. The idempotency key is `(platform, transaction_id)`, backed
//! by a unique index, and webhook merges go through a single conflict-update
//! insert - webhook channels are at-least-once and concurrent, so two
//! deliveries of the same event must still leave exactly one row.

use crate::{
    entities::{Invoice, invoice},
    errors::Result,
    providers::{Platform, SentInvoice},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Provider-agnostic shape of a webhook lifecycle event, ready to be merged
/// into the canonical record. Each webhook module is solely responsible for
/// mapping its provider's payload onto these field names.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceUpdate {
    /// Recipient email, empty when the payload did not carry one
    pub customer_email: String,
    /// Amount in decimal currency units
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
    /// Invoice description
    pub description: String,
    /// Provider-native status string, stored verbatim
    pub status: String,
    /// Platform the event came from
    pub platform: Platform,
    /// Provider-native invoice identifier
    pub transaction_id: String,
    /// Whether this update counts as a notification
    pub notified: bool,
}

/// Aggregate totals over all invoice rows. Only rows whose status is exactly
/// `"paid"`, `"sent"` or `"overdue"` land in a bucket; every other status
/// contributes to `total` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvoiceSummary {
    /// Sum of amount over all rows
    pub total: f64,
    /// Sum of amount where status == "paid"
    pub paid: f64,
    /// Sum of amount where status == "sent"
    pub unpaid: f64,
    /// Sum of amount where status == "overdue"
    pub overdue: f64,
}

/// Records a freshly sent invoice. This path only ever inserts; webhook
/// reconciliation is the one place existing rows are rewritten.
pub async fn record_sent_invoice(
    db: &DatabaseConnection,
    platform: Platform,
    sent: &SentInvoice,
    customer_email: &str,
    description: &str,
    currency: &str,
) -> Result<invoice::Model> {
    let row = invoice::ActiveModel {
        customer_email: Set(customer_email.to_string()),
        amount: Set(sent.amount),
        currency: Set(currency.to_string()),
        description: Set(description.to_string()),
        status: Set(sent.status.clone()),
        platform: Set(platform.as_str().to_string()),
        transaction_id: Set(sent.provider_invoice_id.clone()),
        notified: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Finds the canonical row for a `(platform, transaction_id)` pair.
pub async fn find_by_transaction(
    db: &DatabaseConnection,
    platform: Platform,
    transaction_id: &str,
) -> Result<Option<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::Platform.eq(platform.as_str()))
        .filter(invoice::Column::TransactionId.eq(transaction_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Merges a normalized webhook event into the canonical record.
///
/// Single-statement upsert keyed by `(platform, transaction_id)`: an unknown
/// pair inserts a row from the event's fields, a known pair has its status
/// and notified flag overwritten in place with the rest of the row kept.
/// Two concurrent deliveries of the same event both land on the one row.
pub async fn apply_webhook_update(
    db: &DatabaseConnection,
    update: &InvoiceUpdate,
) -> Result<invoice::Model> {
    let row = invoice::ActiveModel {
        customer_email: Set(update.customer_email.clone()),
        amount: Set(update.amount),
        currency: Set(update.currency.clone()),
        description: Set(update.description.clone()),
        status: Set(update.status.clone()),
        platform: Set(update.platform.as_str().to_string()),
        transaction_id: Set(update.transaction_id.clone()),
        notified: Set(update.notified),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    Invoice::insert(row)
        .on_conflict(
            OnConflict::columns([invoice::Column::Platform, invoice::Column::TransactionId])
                .update_columns([invoice::Column::Status, invoice::Column::Notified])
                .to_owned(),
        )
        .exec_with_returning(db)
        .await
        .map_err(Into::into)
}

/// All invoices for a customer email, newest first.
pub async fn get_invoices_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::CustomerEmail.eq(email))
        .order_by_desc(invoice::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every invoice row, oldest first, as the CSV export walks them.
pub async fn all_invoices(db: &DatabaseConnection) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .order_by_asc(invoice::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up an invoice by its local row id.
pub async fn get_invoice_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<invoice::Model>> {
    Invoice::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Overwrites the stored status after a manual provider poll.
pub async fn update_status(
    db: &DatabaseConnection,
    invoice: invoice::Model,
    status: &str,
) -> Result<invoice::Model> {
    let mut active: invoice::ActiveModel = invoice.into();
    active.status = Set(status.to_string());
    active.update(db).await.map_err(Into::into)
}

/// Invoices still awaiting payment: everything except `paid` and `void`,
/// the filter the reminder sweep runs on.
pub async fn get_unpaid_invoices(db: &DatabaseConnection) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::Status.ne("paid"))
        .filter(invoice::Column::Status.ne("void"))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums invoice amounts into the fixed summary buckets.
pub async fn summarize(db: &DatabaseConnection) -> Result<InvoiceSummary> {
    let rows = Invoice::find().all(db).await?;

    let mut summary = InvoiceSummary::default();
    for row in rows {
        summary.total += row.amount;
        match row.status.as_str() {
            "paid" => summary.paid += row.amount,
            "sent" => summary.unpaid += row.amount,
            "overdue" => summary.overdue += row.amount,
            // void, cancelled and provider-specific statuses count
            // toward total only
            _ => {}
        }
    }
    Ok(summary)
}
