//! Plain command handlers: menus, listings and the summary report.
//!
//! Everything here is a single request-reply exchange; anything that needs
//! follow-up messages lives in [`crate::bot::wizards`].

use crate::bot::{BotContext, transport::Keyboard};
use crate::core::{
    report,
    users::{self, Role},
};
use crate::errors::Result;

/// `/start` - welcome message with the main menu.
pub async fn start(ctx: &BotContext, user_id: &str) -> Result<()> {
    let keyboard = Keyboard::new()
        .text("👥 Customers", "customers:list")
        .text("🧾 Invoices", "invoices:list")
        .row()
        .text("📊 Report", "download_report_pdf");
    ctx.transport
        .send_keyboard(
            user_id,
            "👋 Welcome to Cashly!\n\
             I help you send invoices, track payments and call clients.\n\
             Use /help to see what I can do.",
            keyboard,
        )
        .await
}

/// `/help` - command list tailored to the caller's effective role.
pub async fn help(ctx: &BotContext, user_id: &str) -> Result<()> {
    let role = users::effective_role(&ctx.db, &ctx.admin_ids, user_id).await?;

    let mut lines = vec![
        "📖 Available commands:",
        "/start - welcome message",
        "/help - this list",
        "/faq - frequently asked questions",
    ];
    if matches!(role, Role::Admin | Role::Manager | Role::Staff) {
        lines.push("/customers - customer menu");
    }
    if matches!(role, Role::Admin | Role::Manager) {
        lines.push("/invoice - create and manage invoices");
        lines.push("/report - invoice summary");
        lines.push("/call - call a client");
        lines.push("/cancelcall - cancel an in-progress call setup");
    }
    if role == Role::Admin {
        lines.push("/admins - manage users");
    }

    ctx.transport.send_text(user_id, &lines.join("\n")).await
}

/// `/faq` - static answers.
pub async fn faq(ctx: &BotContext, user_id: &str) -> Result<()> {
    ctx.transport
        .send_text(
            user_id,
            "❓ FAQ\n\n\
             Q: Which payment platforms are supported?\n\
             A: Stripe, PayPal and Square.\n\n\
             Q: How do customers receive invoices?\n\
             A: The platform emails them a payment link directly.\n\n\
             Q: When is an invoice marked paid?\n\
             A: As soon as the platform's webhook confirms the payment.",
        )
        .await
}

/// `/customers` - customer menu.
pub async fn customers_menu(ctx: &BotContext, user_id: &str) -> Result<()> {
    let keyboard = Keyboard::new().text("📋 List customers", "customers:list");
    ctx.transport
        .send_keyboard(user_id, "👥 Customer menu:", keyboard)
        .await
}

/// `customers:list` - all customers on file.
pub async fn list_customers(ctx: &BotContext, user_id: &str) -> Result<()> {
    let customers = crate::core::customers::get_all_customers(&ctx.db).await?;
    if customers.is_empty() {
        return ctx
            .transport
            .send_text(user_id, "No customers found. Please add a customer first.")
            .await;
    }

    let listing = customers
        .iter()
        .map(|c| format!("👤 {}\n📧 {}", c.name, c.email))
        .collect::<Vec<_>>()
        .join("\n\n");
    ctx.transport.send_text(user_id, &listing).await
}

/// `/invoice` - platform choice plus the single-step actions.
pub async fn invoice_menu(ctx: &BotContext, user_id: &str) -> Result<()> {
    let keyboard = Keyboard::new()
        .text("💳 Stripe", "invoices:service:stripe")
        .text("🅿️ PayPal", "invoices:service:paypal")
        .text("⬛ Square", "invoices:service:square")
        .row()
        .text("📋 List", "invoices:list")
        .text("🔍 View", "invoices:view")
        .row()
        .text("🔄 Status", "invoices:status")
        .text("📄 PDF", "invoices:pdf");
    ctx.transport
        .send_keyboard(
            user_id,
            "🧾 Pick a platform to create an invoice, or an action:",
            keyboard,
        )
        .await
}

/// `/admins` - user management menu.
pub async fn admins_menu(ctx: &BotContext, user_id: &str) -> Result<()> {
    let keyboard = Keyboard::new()
        .text("📋 List admins", "admins:list")
        .text("👥 List users", "admins:listusers")
        .row()
        .text("➕ Add user", "admins:adduser")
        .text("➖ Delete user", "admins:deleteuser")
        .row()
        .text("⬆️ Promote", "admins:promote");
    ctx.transport
        .send_keyboard(user_id, "🔐 Admin menu:", keyboard)
        .await
}

/// `admins:list` - env-configured and promoted admin ids, merged.
pub async fn list_admins(ctx: &BotContext, user_id: &str) -> Result<()> {
    let ids = users::list_admin_ids(&ctx.db, &ctx.admin_ids).await?;
    if ids.is_empty() {
        return ctx.transport.send_text(user_id, "No admins configured.").await;
    }
    ctx.transport
        .send_text(user_id, &format!("🔐 Admins:\n{}", ids.join("\n")))
        .await
}

/// `admins:listusers` - every user row with its role.
pub async fn list_users(ctx: &BotContext, user_id: &str) -> Result<()> {
    let all = users::get_all_users(&ctx.db).await?;
    if all.is_empty() {
        return ctx.transport.send_text(user_id, "No users found.").await;
    }

    let listing = all
        .iter()
        .map(|u| format!("👤 {} ({}) - {}", u.name, u.id, u.role))
        .collect::<Vec<_>>()
        .join("\n");
    ctx.transport.send_text(user_id, &listing).await
}

/// `/report` - summary totals plus download buttons.
pub async fn report(ctx: &BotContext, user_id: &str) -> Result<()> {
    let summary = crate::core::invoices::summarize(&ctx.db).await?;
    let keyboard = Keyboard::new()
        .text("📄 Download PDF", "download_report_pdf")
        .text("📊 Download CSV", "download_report_csv");
    ctx.transport
        .send_keyboard(user_id, &report::summary_text(&summary), keyboard)
        .await
}

/// `download_report_pdf` - renders the summary and sends it as a document.
pub async fn send_report_pdf(ctx: &BotContext, user_id: &str) -> Result<()> {
    let summary = crate::core::invoices::summarize(&ctx.db).await?;
    let content = ctx.pdf.render_summary(&summary)?;
    ctx.transport
        .send_document(user_id, "report.pdf", "📄 Invoice report", content)
        .await
}

/// `download_report_csv` - one row per invoice.
pub async fn send_report_csv(ctx: &BotContext, user_id: &str) -> Result<()> {
    let rows = crate::core::invoices::all_invoices(&ctx.db).await?;
    let csv = report::build_csv(&rows);
    ctx.transport
        .send_document(user_id, "report.csv", "📊 Invoice report", csv.into_bytes())
        .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{TestHarness, last_reply};

    #[tokio::test]
    async fn test_help_hides_gated_commands_from_plain_users() -> Result<()> {
        let h = TestHarness::new().await?;

        help(&h.ctx, "nobody").await?;

        let reply = last_reply(&h.transport);
        assert!(reply.contains("/faq"));
        assert!(!reply.contains("/admins"));
        assert!(!reply.contains("/invoice"));
        Ok(())
    }

    #[tokio::test]
    async fn test_help_shows_everything_to_env_admin() -> Result<()> {
        let h = TestHarness::new().await?;

        // TestHarness configures "1" as an env admin
        help(&h.ctx, "1").await?;

        let reply = last_reply(&h.transport);
        assert!(reply.contains("/admins"));
        assert!(reply.contains("/call"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_customers_empty_prompts_to_add() -> Result<()> {
        let h = TestHarness::new().await?;

        list_customers(&h.ctx, "1").await?;

        assert!(last_reply(&h.transport).contains("No customers found"));
        Ok(())
    }
}
