//! Admin wizard: add, soft-delete and promote users.
//!
//! Each action collects its chat id (and a name, for adduser) over text
//! messages, applies the mutation, and always returns the session to idle.

use crate::bot::{
    BotContext,
    router::AdminsAction,
    session::{AdminFlow, SessionState},
};
use crate::core::users::{self, Role};
use crate::errors::Result;
use tracing::info;

/// Arms the admin wizard for the chosen action.
pub async fn start(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    action: &AdminsAction,
) -> Result<()> {
    let (flow, prompt) = match action {
        AdminsAction::AddUser => (AdminFlow::AddUserId, "Enter the new user's chat ID:"),
        AdminsAction::DeleteUser => (
            AdminFlow::DeleteUser,
            "Enter the chat ID of the user to remove:",
        ),
        AdminsAction::Promote => (
            AdminFlow::Promote,
            "Enter the chat ID of the user to promote:",
        ),
        // List/ListUsers are plain commands; the router never sends them here
        AdminsAction::List | AdminsAction::ListUsers => return Ok(()),
    };

    *state = SessionState::Admin(flow);
    ctx.transport.send_text(user_id, prompt).await
}

/// Consumes one text input for the active admin flow.
pub async fn handle_text(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    text: &str,
) -> Result<()> {
    let SessionState::Admin(flow) = state.clone() else {
        *state = SessionState::Idle;
        return Ok(());
    };
    let text = text.trim();

    match flow {
        AdminFlow::AddUserId => {
            if text.is_empty() {
                return ctx
                    .transport
                    .send_text(user_id, "Chat ID cannot be empty. Enter the new user's chat ID:")
                    .await;
            }
            *state = SessionState::Admin(AdminFlow::AddUserName {
                id: text.to_string(),
            });
            ctx.transport
                .send_text(user_id, "Enter the new user's name:")
                .await
        }
        AdminFlow::AddUserName { id } => {
            *state = SessionState::Idle;
            let user = users::add_user(&ctx.db, &id, text, Role::User).await?;
            info!(admin = user_id, new_user = %id, "User added");
            ctx.transport
                .send_text(
                    user_id,
                    &format!("✅ User {} ({}) added as {}.", user.name, user.id, user.role),
                )
                .await
        }
        AdminFlow::DeleteUser => {
            *state = SessionState::Idle;
            if users::set_user_role(&ctx.db, text, Role::Removed).await? {
                info!(admin = user_id, target = %text, "User removed");
                ctx.transport
                    .send_text(user_id, &format!("✅ User {text} removed."))
                    .await
            } else {
                ctx.transport
                    .send_text(user_id, &format!("⚠️ User {text} not found."))
                    .await
            }
        }
        AdminFlow::Promote => {
            *state = SessionState::Idle;
            if users::set_user_role(&ctx.db, text, Role::Admin).await? {
                info!(admin = user_id, target = %text, "User promoted to admin");
                ctx.transport
                    .send_text(user_id, &format!("✅ User {text} promoted to admin."))
                    .await
            } else {
                ctx.transport
                    .send_text(user_id, &format!("⚠️ User {text} not found."))
                    .await
            }
        }
    }
}
