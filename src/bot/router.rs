//! Dialog Router.
//!
//! Inspects every inbound chat event and decides who handles it: button
//! presses are acknowledged immediately and parsed once into a closed
//! [`Callback`] set, slash commands go through the role gate to their
//! handlers, and plain text goes exclusively to the sender's active wizard.
//!
//! The router holds the sender's session lock for the whole event, so a
//! user's rapid successive inputs are processed one at a time.

use crate::bot::{
    BotContext, access, commands,
    session::{SessionState, SessionStore},
    wizards,
};
use crate::core::users::Role;
use crate::errors::{Error, Result};
use crate::providers::Platform;
use tracing::{debug, warn};

/// One inbound chat event, already validated by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A text message (commands included)
    Message {
        /// Sender identity, also the reply chat
        user_id: String,
        /// Message text
        text: String,
    },
    /// An inline-keyboard button press
    Callback {
        /// Sender identity, also the reply chat
        user_id: String,
        /// Transport-level id used to acknowledge the press
        callback_id: String,
        /// Callback data attached to the button
        data: String,
    },
}

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` - welcome message
    Start,
    /// `/help` - role-aware command list
    Help,
    /// `/faq` - frequently asked questions
    Faq,
    /// `/customers` - customer menu
    Customers,
    /// `/invoice` - invoice menu
    Invoice,
    /// `/admins` - admin menu
    Admins,
    /// `/report` - invoice summary
    Report,
    /// `/call` - start the call wizard
    Call,
    /// `/cancelcall` - cancel an active call wizard
    CancelCall,
    /// Anything else starting with `/`
    Unknown(String),
}

/// Parses a message as a slash command, if it is one.
#[must_use]
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    // "/cmd arg" and "/cmd@botname" both resolve on the bare command word
    let word = trimmed[1..]
        .split_whitespace()
        .next()
        .unwrap_or("")
        .split('@')
        .next()
        .unwrap_or("");
    Some(match word {
        "start" => Command::Start,
        "help" => Command::Help,
        "faq" => Command::Faq,
        "customers" => Command::Customers,
        "invoice" => Command::Invoice,
        "admins" => Command::Admins,
        "report" => Command::Report,
        "call" => Command::Call,
        "cancelcall" => Command::CancelCall,
        other => Command::Unknown(other.to_string()),
    })
}

/// Typed callback payloads, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// `customers:*` namespace
    Customers(CustomersAction),
    /// `invoices:*` namespace
    Invoices(InvoicesAction),
    /// `admins:*` namespace
    Admins(AdminsAction),
    /// Literal `download_report_pdf`
    DownloadReportPdf,
    /// Literal `download_report_csv`
    DownloadReportCsv,
    /// Anything that matched no known pattern
    Unrecognized(String),
}

/// Actions in the `customers:` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomersAction {
    /// List all customers
    List,
}

/// Actions in the `invoices:` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoicesAction {
    /// `invoices:service:<platform>` - start the create flow
    Service(Platform),
    /// `invoices:list` - list invoices for an email
    List,
    /// `invoices:view` - view one invoice
    View,
    /// `invoices:status` - poll provider status
    Status,
    /// `invoices:pdf` - download an invoice PDF
    Pdf,
    /// `invoices:select:<email>` - customer chosen in the create flow
    Select(String),
}

/// Actions in the `admins:` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminsAction {
    /// List admin ids
    List,
    /// List all users
    ListUsers,
    /// Start the adduser wizard
    AddUser,
    /// Start the deleteuser wizard
    DeleteUser,
    /// Start the promote wizard
    Promote,
}

/// Parses raw callback data into the closed [`Callback`] set. Downstream
/// code matches on the variant and never re-parses strings.
#[must_use]
pub fn parse_callback(data: &str) -> Callback {
    match data {
        "customers:list" => Callback::Customers(CustomersAction::List),
        "invoices:list" => Callback::Invoices(InvoicesAction::List),
        "invoices:view" => Callback::Invoices(InvoicesAction::View),
        "invoices:status" => Callback::Invoices(InvoicesAction::Status),
        "invoices:pdf" => Callback::Invoices(InvoicesAction::Pdf),
        "admins:list" => Callback::Admins(AdminsAction::List),
        "admins:listusers" => Callback::Admins(AdminsAction::ListUsers),
        "admins:adduser" => Callback::Admins(AdminsAction::AddUser),
        "admins:deleteuser" => Callback::Admins(AdminsAction::DeleteUser),
        "admins:promote" => Callback::Admins(AdminsAction::Promote),
        "download_report_pdf" => Callback::DownloadReportPdf,
        "download_report_csv" => Callback::DownloadReportCsv,
        _ => {
            if let Some(tag) = data.strip_prefix("invoices:service:") {
                if let Some(platform) = Platform::parse(tag) {
                    return Callback::Invoices(InvoicesAction::Service(platform));
                }
            }
            if let Some(email) = data.strip_prefix("invoices:select:") {
                return Callback::Invoices(InvoicesAction::Select(email.to_string()));
            }
            Callback::Unrecognized(data.to_string())
        }
    }
}

/// Handles one inbound chat event to completion.
pub async fn handle_event(ctx: &BotContext, sessions: &SessionStore, event: ChatEvent) {
    let result = match event {
        ChatEvent::Message { user_id, text } => {
            handle_message(ctx, sessions, &user_id, &text).await
        }
        ChatEvent::Callback {
            user_id,
            callback_id,
            data,
        } => {
            // Ack first so the client's processing indicator never hangs,
            // regardless of what the rest of the handling does
            if let Err(e) = ctx.transport.ack_callback(&callback_id).await {
                debug!(error = %e, "Callback ack failed (ignored)");
            }
            handle_callback(ctx, sessions, &user_id, &data).await
        }
    };

    if let Err(e) = result {
        warn!(error = %e, "Event handling failed");
    }
}

async fn handle_message(
    ctx: &BotContext,
    sessions: &SessionStore,
    user_id: &str,
    text: &str,
) -> Result<()> {
    let session = sessions.get(user_id).await;
    let mut state = session.lock().await;

    if let Some(command) = parse_command(text) {
        return dispatch_command(ctx, user_id, &mut state, command).await;
    }

    // Explicit cancel resets any wizard at any step
    if text.trim().eq_ignore_ascii_case("cancel") && *state != SessionState::Idle {
        *state = SessionState::Idle;
        return ctx.transport.send_text(user_id, "❌ Canceled.").await;
    }

    // Active wizards consume all plain text exclusively
    match &*state {
        SessionState::Idle => {
            debug!(user_id, "Plain text with no active wizard, ignored");
            Ok(())
        }
        SessionState::Call(_) => wizards::call::handle_text(ctx, user_id, &mut state, text).await,
        SessionState::Invoice(_) => {
            wizards::invoice::handle_text(ctx, user_id, &mut state, text).await
        }
        SessionState::Admin(_) => wizards::admin::handle_text(ctx, user_id, &mut state, text).await,
    }
}

async fn dispatch_command(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    command: Command,
) -> Result<()> {
    use Role::{Admin, Manager, Staff};

    let gated = match command {
        Command::Start => return commands::start(ctx, user_id).await,
        Command::Help => return commands::help(ctx, user_id).await,
        Command::Faq => return commands::faq(ctx, user_id).await,
        Command::CancelCall => return wizards::call::cancel(ctx, user_id, state).await,
        Command::Unknown(ref word) => {
            debug!(user_id, command = %word, "Unknown command, ignored");
            return Ok(());
        }
        gated => gated,
    };

    let allowed: &[Role] = match gated {
        Command::Customers => &[Admin, Manager, Staff],
        Command::Admins => &[Admin],
        _ => &[Admin, Manager],
    };
    if let Err(e) = access::require_role(&ctx.db, &ctx.admin_ids, user_id, allowed).await {
        return match e {
            Error::AccessDenied { .. } => {
                ctx.transport
                    .send_text(user_id, "⛔ You are not authorized to use this command.")
                    .await
            }
            other => Err(other),
        };
    }

    match gated {
        Command::Customers => commands::customers_menu(ctx, user_id).await,
        Command::Invoice => commands::invoice_menu(ctx, user_id).await,
        Command::Admins => commands::admins_menu(ctx, user_id).await,
        Command::Report => commands::report(ctx, user_id).await,
        Command::Call => wizards::call::start(ctx, user_id, state).await,
        // Open commands returned above
        _ => Ok(()),
    }
}

async fn handle_callback(
    ctx: &BotContext,
    sessions: &SessionStore,
    user_id: &str,
    data: &str,
) -> Result<()> {
    let session = sessions.get(user_id).await;
    let mut state = session.lock().await;

    match parse_callback(data) {
        Callback::Customers(CustomersAction::List) => commands::list_customers(ctx, user_id).await,
        Callback::Invoices(action) => match action {
            InvoicesAction::Service(platform) => {
                wizards::invoice::start_create(ctx, user_id, &mut state, platform).await
            }
            InvoicesAction::Select(email) => {
                wizards::invoice::select_customer(ctx, user_id, &mut state, &email).await
            }
            InvoicesAction::List
            | InvoicesAction::View
            | InvoicesAction::Status
            | InvoicesAction::Pdf => {
                wizards::invoice::start_simple(ctx, user_id, &mut state, action).await
            }
        },
        Callback::Admins(action) => match action {
            AdminsAction::List => commands::list_admins(ctx, user_id).await,
            AdminsAction::ListUsers => commands::list_users(ctx, user_id).await,
            AdminsAction::AddUser | AdminsAction::DeleteUser | AdminsAction::Promote => {
                wizards::admin::start(ctx, user_id, &mut state, &action).await
            }
        },
        Callback::DownloadReportPdf => commands::send_report_pdf(ctx, user_id).await,
        Callback::DownloadReportCsv => commands::send_report_csv(ctx, user_id).await,
        Callback::Unrecognized(data) => {
            debug!(user_id, data = %data, "Unrecognized callback data, ignored");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::bot::session::{CreateStep, InvoiceFlow};
    use crate::test_utils::{TestHarness, last_reply};

    #[test]
    fn test_parse_command_variants() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/cancelcall"), Some(Command::CancelCall));
        assert_eq!(parse_command("/report extra args"), Some(Command::Report));
        assert_eq!(parse_command("/invoice@cashly_bot"), Some(Command::Invoice));
        assert_eq!(
            parse_command("/frobnicate"),
            Some(Command::Unknown("frobnicate".to_string()))
        );
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn test_parse_callback_closed_set() {
        assert_eq!(
            parse_callback("invoices:service:paypal"),
            Callback::Invoices(InvoicesAction::Service(Platform::Paypal))
        );
        assert_eq!(
            parse_callback("invoices:select:a@b.com"),
            Callback::Invoices(InvoicesAction::Select("a@b.com".to_string()))
        );
        assert_eq!(
            parse_callback("admins:promote"),
            Callback::Admins(AdminsAction::Promote)
        );
        assert_eq!(parse_callback("download_report_csv"), Callback::DownloadReportCsv);
        assert_eq!(
            parse_callback("invoices:service:venmo"),
            Callback::Unrecognized("invoices:service:venmo".to_string())
        );
        assert_eq!(
            parse_callback("something:else"),
            Callback::Unrecognized("something:else".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_clears_any_wizard_and_frees_the_next_message() -> Result<()> {
        let h = TestHarness::new().await?;
        let sessions = SessionStore::new();
        sessions
            .set(
                "1",
                SessionState::Invoice(InvoiceFlow::Create {
                    platform: Platform::Stripe,
                    step: CreateStep::Description {
                        email: "a@b.com".to_string(),
                    },
                }),
            )
            .await;

        handle_message(&h.ctx, &sessions, "1", "cancel").await?;

        assert_eq!(*sessions.get("1").await.lock().await, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Canceled"));

        // A follow-up command runs normally instead of feeding the wizard
        handle_message(&h.ctx, &sessions, "1", "/help").await?;
        assert!(last_reply(&h.transport).contains("/invoice"));

        // Plain text with no wizard is dropped, not replayed as a description
        let before = h.transport.messages.lock().unwrap().len();
        handle_message(&h.ctx, &sessions, "1", "150").await?;
        assert_eq!(h.transport.messages.lock().unwrap().len(), before);
        assert!(h.provider.sent_requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_with_no_wizard_is_plain_text() -> Result<()> {
        let h = TestHarness::new().await?;
        let sessions = SessionStore::new();

        let before = h.transport.messages.lock().unwrap().len();
        handle_message(&h.ctx, &sessions, "1", "cancel").await?;

        // No active wizard: "cancel" is ordinary text and gets no reply
        assert_eq!(h.transport.messages.lock().unwrap().len(), before);
        assert_eq!(*sessions.get("1").await.lock().await, SessionState::Idle);
        Ok(())
    }
}
