//! Customer entity - invoice recipients, keyed by email.
//!
//! Customers are created lazily by the invoice flow; each row caches the
//! provider-side customer id per platform once the first invoice on that
//! platform has been created.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Chat id of the user who owns this customer record
    pub owner_id: String,
    /// Customer display name
    pub name: String,
    /// Customer email - the lookup key used everywhere else
    #[sea_orm(unique)]
    pub email: String,
    /// Phone number, empty when unknown
    pub phone: String,
    /// Postal address, empty when unknown
    pub address: String,
    /// Stripe customer id, None until the first Stripe invoice
    pub stripe_customer_id: Option<String>,
    /// PayPal customer identity (their email), None until the first PayPal invoice
    pub paypal_customer_id: Option<String>,
    /// Square customer id, None until the first Square invoice
    pub square_customer_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
