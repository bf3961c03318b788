//! Database connection and table creation using `SeaORM`.
//!
//! Tables are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! struct definitions without hand-written SQL.

use crate::entities::{Customer, Invoice, User, invoice};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Connects to the database at the given URL.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the `users`, `customers` and `invoices` tables if they do not
/// already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut customer_table = schema.create_table_from_entity(Customer);
    let mut invoice_table = schema.create_table_from_entity(Invoice);

    db.execute(builder.build(user_table.if_not_exists()))
        .await?;
    db.execute(builder.build(customer_table.if_not_exists()))
        .await?;
    db.execute(builder.build(invoice_table.if_not_exists()))
        .await?;

    // Webhook idempotency key: at most one invoice row per provider-native id
    let invoice_txn_key = Index::create()
        .if_not_exists()
        .name("idx_invoices_platform_transaction_id")
        .table(Invoice)
        .col(invoice::Column::Platform)
        .col(invoice::Column::TransactionId)
        .unique()
        .to_owned();
    db.execute(builder.build(&invoice_txn_key)).await?;

    Ok(())
}
