//! Customer business logic.
//!
//! Customers are never required to pre-exist before invoicing: the create
//! flow upserts them by email and caches the provider-side customer id for
//! whichever platform was used.

use crate::{
    entities::{Customer, customer},
    errors::Result,
    providers::Platform,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// All customers, ordered by name.
pub async fn get_all_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up a customer by email, the key everything else uses.
pub async fn get_customer_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<customer::Model>> {
    Customer::find()
        .filter(customer::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a customer if the email is new, otherwise returns the existing
/// row untouched.
pub async fn ensure_customer(
    db: &DatabaseConnection,
    owner_id: &str,
    name: &str,
    email: &str,
) -> Result<customer::Model> {
    if let Some(existing) = get_customer_by_email(db, email).await? {
        return Ok(existing);
    }

    let customer = customer::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(String::new()),
        address: Set(String::new()),
        stripe_customer_id: Set(None),
        paypal_customer_id: Set(None),
        square_customer_id: Set(None),
        ..Default::default()
    };
    customer.insert(db).await.map_err(Into::into)
}

/// Returns the cached provider-side customer id for a platform, if any.
#[must_use]
pub fn provider_customer_id(customer: &customer::Model, platform: Platform) -> Option<String> {
    match platform {
        Platform::Stripe => customer.stripe_customer_id.clone(),
        Platform::Paypal => customer.paypal_customer_id.clone(),
        Platform::Square => customer.square_customer_id.clone(),
    }
}

/// Caches the provider-side customer id on the row for the given platform.
pub async fn store_provider_customer_id(
    db: &DatabaseConnection,
    customer: customer::Model,
    platform: Platform,
    provider_id: &str,
) -> Result<customer::Model> {
    let mut active: customer::ActiveModel = customer.into();
    let value = ActiveValue::Set(Some(provider_id.to_string()));
    match platform {
        Platform::Stripe => active.stripe_customer_id = value,
        Platform::Paypal => active.paypal_customer_id = value,
        Platform::Square => active.square_customer_id = value,
    }
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_ensure_customer_creates_then_reuses() -> Result<()> {
        let db = setup_test_db().await?;

        let created = ensure_customer(&db, "42", "Jane", "a@b.com").await?;
        assert_eq!(created.email, "a@b.com");
        assert!(created.stripe_customer_id.is_none());

        // Same email must not create a second row
        let again = ensure_customer(&db, "43", "Janet", "a@b.com").await?;
        assert_eq!(again.id, created.id);
        assert_eq!(again.name, "Jane");

        assert_eq!(get_all_customers(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_provider_customer_id_caches_per_platform() -> Result<()> {
        let db = setup_test_db().await?;

        let customer = ensure_customer(&db, "42", "Jane", "a@b.com").await?;
        let customer =
            store_provider_customer_id(&db, customer, Platform::Stripe, "cus_123").await?;

        assert_eq!(
            provider_customer_id(&customer, Platform::Stripe).as_deref(),
            Some("cus_123")
        );
        assert!(provider_customer_id(&customer, Platform::Paypal).is_none());

        let reloaded = get_customer_by_email(&db, "a@b.com").await?.unwrap();
        assert_eq!(reloaded.stripe_customer_id.as_deref(), Some("cus_123"));
        Ok(())
    }
}
