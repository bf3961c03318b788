//! Invoice entity - the canonical record per (platform, transaction_id).
//!
//! Rows are inserted after a provider confirms an invoice was sent, then
//! mutated in place by webhook ingestion or a manual status poll. Status is
//! stored verbatim in the provider's own vocabulary. Rows are never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient email - foreign key by value, not enforced
    pub customer_email: String,
    /// Amount in decimal currency units
    pub amount: f64,
    /// ISO currency code, e.g. "usd"
    pub currency: String,
    /// Free-text description entered in the wizard
    pub description: String,
    /// Provider-native status string, stored verbatim
    pub status: String,
    /// Platform the invoice lives on: "stripe", "paypal" or "square"
    pub platform: String,
    /// Provider-native invoice identifier; with `platform` this is the
    /// idempotency key; `(platform, transaction_id)` is covered by a unique
    /// index created alongside the table
    pub transaction_id: String,
    /// Whether a webhook notification has been recorded for this invoice
    pub notified: bool,
    /// Creation timestamp
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
