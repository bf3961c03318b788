//! User management business logic.
//!
//! Users are keyed by their chat-platform id. Deleting a user is a role
//! change to `removed`, never a row removal, so a returning id keeps its
//! history.

use crate::{
    entities::{User, user},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::{DatabaseConnection, QueryOrder};

/// Access roles, least to most privileged. `Removed` is the soft-delete
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Default role for newly added users
    User,
    /// May manage customers
    Staff,
    /// May manage customers, invoices, reports and calls
    Manager,
    /// Full access including user administration
    Admin,
    /// Soft-deleted; denied everywhere
    Removed,
}

impl Role {
    /// The string stored in the `users.role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Staff => "staff",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Removed => "removed",
        }
    }

    /// Parses a stored role string; unknown values fall back to `User`.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "staff" => Self::Staff,
            "manager" => Self::Manager,
            "admin" => Self::Admin,
            "removed" => Self::Removed,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a user by chat id.
pub async fn get_user(db: &DatabaseConnection, id: &str) -> Result<Option<user::Model>> {
    User::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Adds a user with the given role. A pre-existing row wins - the insert is
/// skipped, insert-or-ignore style.
pub async fn add_user(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
    role: Role,
) -> Result<user::Model> {
    if let Some(existing) = get_user(db, id).await? {
        return Ok(existing);
    }

    let user = user::ActiveModel {
        id: Set(id.to_string()),
        name: Set(name.to_string()),
        role: Set(role.as_str().to_string()),
    };
    user.insert(db).await.map_err(Into::into)
}

/// Sets a user's role. Unknown ids are a no-op; returns whether a row was
/// actually updated.
pub async fn set_user_role(db: &DatabaseConnection, id: &str, role: Role) -> Result<bool> {
    use sea_orm::sea_query::Expr;

    let result = User::update_many()
        .col_expr(user::Column::Role, Expr::value(role.as_str()))
        .filter(user::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// All users, ordered by name.
pub async fn get_all_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves the effective role for a chat id: env-configured admins win,
/// then the users table, defaulting to `User` for unknown ids.
pub async fn effective_role(
    db: &DatabaseConnection,
    env_admins: &[String],
    id: &str,
) -> Result<Role> {
    if env_admins.iter().any(|a| a == id) {
        return Ok(Role::Admin);
    }
    Ok(get_user(db, id)
        .await?
        .map_or(Role::User, |u| Role::from_str_lossy(&u.role)))
}

/// The union of env-configured admin ids and DB rows with the admin role,
/// deduplicated, env entries first.
pub async fn list_admin_ids(db: &DatabaseConnection, env_admins: &[String]) -> Result<Vec<String>> {
    let db_admins = User::find()
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .all(db)
        .await?;

    let mut all: Vec<String> = env_admins.to_vec();
    for u in db_admins {
        if !all.contains(&u.id) {
            all.push(u.id);
        }
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_add_user_persists_row() -> Result<()> {
        let db = setup_test_db().await?;

        let user = add_user(&db, "555", "Bob", Role::User).await?;
        assert_eq!(user.id, "555");
        assert_eq!(user.name, "Bob");
        assert_eq!(user.role, "user");

        let stored = get_user(&db, "555").await?.unwrap();
        assert_eq!(stored.name, "Bob");
        assert_eq!(stored.role, "user");
        Ok(())
    }

    #[tokio::test]
    async fn test_add_user_keeps_existing_row() -> Result<()> {
        let db = setup_test_db().await?;

        add_user(&db, "555", "Bob", Role::User).await?;
        let second = add_user(&db, "555", "Robert", Role::Admin).await?;

        // Insert-or-ignore: the first row wins
        assert_eq!(second.name, "Bob");
        assert_eq!(second.role, "user");
        Ok(())
    }

    #[tokio::test]
    async fn test_set_user_role_soft_delete() -> Result<()> {
        let db = setup_test_db().await?;

        add_user(&db, "555", "Bob", Role::User).await?;
        assert!(set_user_role(&db, "555", Role::Removed).await?);

        let stored = get_user(&db, "555").await?.unwrap();
        assert_eq!(stored.role, "removed");
        Ok(())
    }

    #[tokio::test]
    async fn test_set_user_role_unknown_id_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!set_user_role(&db, "ghost", Role::Admin).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_effective_role_env_admins_win() -> Result<()> {
        let db = setup_test_db().await?;
        add_user(&db, "555", "Bob", Role::User).await?;

        let env_admins = vec!["555".to_string()];
        assert_eq!(effective_role(&db, &env_admins, "555").await?, Role::Admin);
        assert_eq!(effective_role(&db, &[], "555").await?, Role::User);
        assert_eq!(effective_role(&db, &[], "unknown").await?, Role::User);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_admin_ids_merges_and_dedupes() -> Result<()> {
        let db = setup_test_db().await?;
        add_user(&db, "1", "Alice", Role::Admin).await?;
        add_user(&db, "2", "Bob", Role::User).await?;

        let env_admins = vec!["1".to_string(), "9".to_string()];
        let admins = list_admin_ids(&db, &env_admins).await?;
        assert_eq!(admins, vec!["1".to_string(), "9".to_string()]);

        let admins = list_admin_ids(&db, &[]).await?;
        assert_eq!(admins, vec!["1".to_string()]);
        Ok(())
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::User,
            Role::Staff,
            Role::Manager,
            Role::Admin,
            Role::Removed,
        ] {
            assert_eq!(Role::from_str_lossy(role.as_str()), role);
        }
        assert_eq!(Role::from_str_lossy("garbage"), Role::User);
    }
}
