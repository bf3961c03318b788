//! Role gate for restricted commands.
//!
//! Env-configured admin ids always pass; otherwise the users table decides.
//! Insufficient role is an explicit [`Error::AccessDenied`], which the
//! router turns into a visible denial reply - never a silent drop.

use crate::core::users::{self, Role};
use crate::errors::{Error, Result};
use sea_orm::DatabaseConnection;

/// Checks that the sender holds one of the allowed roles, returning the
/// effective role on success.
pub async fn require_role(
    db: &DatabaseConnection,
    env_admins: &[String],
    user_id: &str,
    allowed: &[Role],
) -> Result<Role> {
    let role = users::effective_role(db, env_admins, user_id).await?;
    if allowed.contains(&role) {
        Ok(role)
    } else {
        Err(Error::AccessDenied {
            required: allowed.iter().map(|r| r.as_str().to_string()).collect(),
        })
    }
}
