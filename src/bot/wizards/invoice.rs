//! Invoice wizard: simple one-parameter actions and the create flow.
//!
//! Simple actions (list, view, status, pdf) consume the very next text
//! message as their parameter and execute immediately. The create flow is
//! scoped to a previously chosen platform and walks
//! select-customer → description → amount before calling the provider
//! adapter. Every terminal outcome, success or failure, resets the session
//! slot so no partial create state lingers.

use crate::bot::{
    BotContext,
    router::InvoicesAction,
    session::{CreateStep, InvoiceFlow, SessionState, SimpleInvoiceAction},
    transport::Keyboard,
};
use crate::core::{customers, invoices};
use crate::errors::Result;
use crate::providers::{InvoiceRequest, Platform};
use tracing::{info, warn};

/// Starts the create flow for a platform: presents up to 10 known customers
/// as selectable options.
pub async fn start_create(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    platform: Platform,
) -> Result<()> {
    let all = customers::get_all_customers(&ctx.db).await?;
    if all.is_empty() {
        *state = SessionState::Idle;
        return ctx
            .transport
            .send_text(user_id, "No customers found. Please add a customer first.")
            .await;
    }

    // One customer per row, capped at 10
    let mut keyboard = Keyboard::new();
    for (i, customer) in all.iter().take(10).enumerate() {
        if i > 0 {
            keyboard = keyboard.row();
        }
        keyboard = keyboard.text(
            format!("{} ({})", customer.name, customer.email),
            format!("invoices:select:{}", customer.email),
        );
    }

    *state = SessionState::Invoice(InvoiceFlow::Create {
        platform,
        step: CreateStep::SelectCustomer,
    });
    ctx.transport
        .send_keyboard(
            user_id,
            &format!(
                "Service: {}\nSelect a customer to invoice:",
                platform.display_name()
            ),
            keyboard,
        )
        .await
}

/// Advances the create flow after a customer button press.
pub async fn select_customer(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    email: &str,
) -> Result<()> {
    let SessionState::Invoice(InvoiceFlow::Create { platform, .. }) = &*state else {
        // Stale button press from an old keyboard: no platform to scope to
        *state = SessionState::Idle;
        return ctx
            .transport
            .send_text(user_id, "⚠️ Please choose a service first using /invoice.")
            .await;
    };
    let platform = *platform;

    *state = SessionState::Invoice(InvoiceFlow::Create {
        platform,
        step: CreateStep::Description {
            email: email.to_string(),
        },
    });
    ctx.transport
        .send_text(user_id, "Enter invoice description:")
        .await
}

/// Arms a single-step action; the next text message is its parameter.
pub async fn start_simple(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    action: InvoicesAction,
) -> Result<()> {
    let (simple, prompt) = match action {
        InvoicesAction::List => (
            SimpleInvoiceAction::List,
            "Enter customer email to list invoices:",
        ),
        InvoicesAction::View => (SimpleInvoiceAction::View, "Enter invoice ID to view:"),
        InvoicesAction::Status => (
            SimpleInvoiceAction::Status,
            "Enter invoice ID to check status:",
        ),
        InvoicesAction::Pdf => (SimpleInvoiceAction::Pdf, "Enter invoice ID to download PDF:"),
        // Service/Select never reach here; the router routes them directly
        InvoicesAction::Service(_) | InvoicesAction::Select(_) => return Ok(()),
    };

    *state = SessionState::Invoice(InvoiceFlow::Awaiting(simple));
    ctx.transport.send_text(user_id, prompt).await
}

/// Consumes one text input for the active invoice flow.
pub async fn handle_text(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    text: &str,
) -> Result<()> {
    let SessionState::Invoice(flow) = state.clone() else {
        *state = SessionState::Idle;
        return Ok(());
    };
    let text = text.trim();

    match flow {
        InvoiceFlow::Awaiting(action) => {
            // Single-step actions execute immediately and always reset
            *state = SessionState::Idle;
            let result = run_simple_action(ctx, user_id, action, text).await;
            if let Err(e) = result {
                warn!(error = %e, "Invoice action failed");
                return ctx
                    .transport
                    .send_text(user_id, &format!("❌ {e}"))
                    .await;
            }
            Ok(())
        }
        InvoiceFlow::Create { platform, step } => match step {
            CreateStep::SelectCustomer => {
                // Waiting for a button press; free text does not advance
                ctx.transport
                    .send_text(user_id, "Please select a customer from the list above.")
                    .await
            }
            CreateStep::Description { email } => {
                *state = SessionState::Invoice(InvoiceFlow::Create {
                    platform,
                    step: CreateStep::Amount {
                        email,
                        description: text.to_string(),
                    },
                });
                ctx.transport.send_text(user_id, "Enter invoice amount:").await
            }
            CreateStep::Amount { email, description } => {
                let Ok(amount) = text.parse::<f64>() else {
                    return ctx
                        .transport
                        .send_text(user_id, "Invalid amount. Please enter a positive number:")
                        .await;
                };
                if amount <= 0.0 || !amount.is_finite() {
                    return ctx
                        .transport
                        .send_text(user_id, "Invalid amount. Please enter a positive number:")
                        .await;
                }

                // Terminal step: session resets whatever happens next
                *state = SessionState::Idle;
                match create_and_record(ctx, user_id, platform, &email, &description, amount).await
                {
                    Ok(reply) => ctx.transport.send_text(user_id, &reply).await,
                    Err(e) => {
                        warn!(error = %e, platform = %platform, "Invoice creation failed");
                        ctx.transport
                            .send_text(user_id, &format!("❌ Failed to create invoice: {e}"))
                            .await
                    }
                }
            }
        },
    }
}

/// Runs the full create path: provider customer, send, persist, report.
async fn create_and_record(
    ctx: &BotContext,
    user_id: &str,
    platform: Platform,
    email: &str,
    description: &str,
    amount: f64,
) -> Result<String> {
    let name = customers::get_customer_by_email(&ctx.db, email)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    let provider = ctx.providers.get(platform)?;

    // Resolve the provider-side customer id once, caching it on the
    // (lazily created) row so later invoices skip the lookup
    let customer = customers::ensure_customer(&ctx.db, user_id, &name, email).await?;
    let customer_id = match customers::provider_customer_id(&customer, platform) {
        Some(id) => id,
        None => {
            let provider_id = provider.create_or_find_customer(&name, email).await?;
            customers::store_provider_customer_id(&ctx.db, customer, platform, &provider_id)
                .await?;
            provider_id
        }
    };

    let sent = provider
        .create_and_send_invoice(&InvoiceRequest {
            name,
            email: email.to_string(),
            customer_id: Some(customer_id),
            description: description.to_string(),
            amount,
        })
        .await?;

    // Persist only after the adapter confirmed the send
    invoices::record_sent_invoice(&ctx.db, platform, &sent, email, description, "USD").await?;
    info!(platform = %platform, invoice = %sent.provider_invoice_id, "Invoice created and sent");

    Ok(format!(
        "✅ Invoice created via {} and sent to {email}.\n💵 Amount: ${}\n📄 Status: {}\n🔗 {}",
        platform.display_name(),
        sent.amount,
        sent.status,
        sent.url,
    ))
}

async fn run_simple_action(
    ctx: &BotContext,
    user_id: &str,
    action: SimpleInvoiceAction,
    input: &str,
) -> Result<()> {
    match action {
        SimpleInvoiceAction::List => {
            let rows = invoices::get_invoices_by_email(&ctx.db, input).await?;
            if rows.is_empty() {
                return ctx
                    .transport
                    .send_text(user_id, "No invoices found for this customer.")
                    .await;
            }
            let listing = rows
                .iter()
                .map(|inv| {
                    format!(
                        "🧾 ID: {}\n💵 Amount: ${}\n📄 Status: {}\n📝 Desc: {}",
                        inv.id, inv.amount, inv.status, inv.description
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            ctx.transport.send_text(user_id, &listing).await
        }
        SimpleInvoiceAction::View => {
            let Some(inv) = lookup_invoice(ctx, input).await? else {
                return ctx.transport.send_text(user_id, "Invoice not found.").await;
            };
            let link = match Platform::parse(&inv.platform) {
                Some(Platform::Stripe) => format!(
                    "\n🔗 Stripe: https://invoice.stripe.com/i/{}",
                    inv.transaction_id
                ),
                Some(Platform::Paypal) => format!(
                    "\n🔗 PayPal: https://www.paypal.com/invoice/payerView/details/{}",
                    inv.transaction_id
                ),
                _ => String::new(),
            };
            ctx.transport
                .send_text(
                    user_id,
                    &format!(
                        "🧾 ID: {}\n💵 Amount: ${}\n📄 Status: {}\n📝 Desc: {}{link}",
                        inv.id, inv.amount, inv.status, inv.description
                    ),
                )
                .await
        }
        SimpleInvoiceAction::Status => {
            let Some(inv) = lookup_invoice(ctx, input).await? else {
                return ctx.transport.send_text(user_id, "Invoice not found.").await;
            };
            let Some(platform) = Platform::parse(&inv.platform) else {
                return ctx
                    .transport
                    .send_text(user_id, "No provider invoice ID found.")
                    .await;
            };
            let provider = ctx.providers.get(platform)?;
            let status = provider.invoice_status(&inv.transaction_id).await?;

            // A manual poll converges the row just like a webhook would
            invoices::update_status(&ctx.db, inv, &status).await?;
            ctx.transport
                .send_text(
                    user_id,
                    &format!("{} Invoice Status: {status}", platform.display_name()),
                )
                .await
        }
        SimpleInvoiceAction::Pdf => {
            let Some(inv) = lookup_invoice(ctx, input).await? else {
                return ctx.transport.send_text(user_id, "Invoice not found.").await;
            };
            let content = ctx.pdf.render_invoice(&inv)?;
            ctx.transport
                .send_document(
                    user_id,
                    &format!("invoice-{}.pdf", inv.id),
                    "🧾 Invoice PDF",
                    content,
                )
                .await
        }
    }
}

async fn lookup_invoice(
    ctx: &BotContext,
    input: &str,
) -> Result<Option<crate::entities::invoice::Model>> {
    let Ok(id) = input.parse::<i64>() else {
        return Ok(None);
    };
    invoices::get_invoice_by_id(&ctx.db, id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Invoice;
    use crate::test_utils::{TestHarness, last_reply, webhook_update};
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_create_flow_persists_one_invoice() -> Result<()> {
        let h = TestHarness::new().await?;
        h.seed_customer("a@b.com", "Jane").await?;
        let mut state = SessionState::Idle;

        // Full happy path: pick PayPal, pick a@b.com, "Consulting", "150"
        start_create(&h.ctx, "42", &mut state, Platform::Paypal).await?;
        assert!(matches!(
            state,
            SessionState::Invoice(InvoiceFlow::Create {
                platform: Platform::Paypal,
                step: CreateStep::SelectCustomer,
            })
        ));

        select_customer(&h.ctx, "42", &mut state, "a@b.com").await?;
        handle_text(&h.ctx, "42", &mut state, "Consulting").await?;
        handle_text(&h.ctx, "42", &mut state, "150").await?;

        // Exactly one adapter call
        assert_eq!(h.provider.sent_requests().len(), 1);
        assert_eq!(h.provider.sent_requests()[0].description, "Consulting");

        // Exactly one persisted row with the expected fields
        let rows = Invoice::find().all(&h.ctx.db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 150.0);
        assert_eq!(rows[0].platform, "paypal");
        assert_eq!(rows[0].customer_email, "a@b.com");

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Invoice created via PayPal"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_amount_reprompts_and_keeps_collected_fields() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Invoice(InvoiceFlow::Create {
            platform: Platform::Stripe,
            step: CreateStep::Amount {
                email: "a@b.com".to_string(),
                description: "Consulting".to_string(),
            },
        });

        for bad in ["abc", "-5", "0"] {
            handle_text(&h.ctx, "42", &mut state, bad).await?;
            assert_eq!(
                state,
                SessionState::Invoice(InvoiceFlow::Create {
                    platform: Platform::Stripe,
                    step: CreateStep::Amount {
                        email: "a@b.com".to_string(),
                        description: "Consulting".to_string(),
                    },
                })
            );
            assert!(last_reply(&h.transport).contains("Invalid amount"));
        }

        assert!(h.provider.sent_requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_provider_customer_id_skips_lookup() -> Result<()> {
        let h = TestHarness::new().await?;
        h.seed_customer("a@b.com", "Jane").await?;

        for txn in ["first", "second"] {
            let mut state = SessionState::Invoice(InvoiceFlow::Create {
                platform: Platform::Stripe,
                step: CreateStep::Amount {
                    email: "a@b.com".to_string(),
                    description: txn.to_string(),
                },
            });
            handle_text(&h.ctx, "42", &mut state, "150").await?;
        }

        // Resolved once, then served from the cached column; the adapter
        // always receives the resolved id
        assert_eq!(h.provider.customer_lookups(), 1);
        let requests = h.provider.sent_requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.customer_id.as_deref(), Some("cust_a@b.com"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_failure_resets_and_persists_nothing() -> Result<()> {
        let h = TestHarness::new().await?;
        h.seed_customer("a@b.com", "Jane").await?;
        h.provider.fail_next();
        let mut state = SessionState::Invoice(InvoiceFlow::Create {
            platform: Platform::Paypal,
            step: CreateStep::Amount {
                email: "a@b.com".to_string(),
                description: "Consulting".to_string(),
            },
        });

        handle_text(&h.ctx, "42", &mut state, "150").await?;

        assert_eq!(state, SessionState::Idle);
        assert!(Invoice::find().all(&h.ctx.db).await?.is_empty());
        assert!(last_reply(&h.transport).contains("Failed to create invoice"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_no_customers_resets() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Idle;

        start_create(&h.ctx, "42", &mut state, Platform::Stripe).await?;

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("No customers found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_action_consumes_next_message() -> Result<()> {
        let h = TestHarness::new().await?;
        crate::core::invoices::apply_webhook_update(
            &h.ctx.db,
            &webhook_update(Platform::Stripe, "in_1", "sent", 25.0),
        )
        .await?;
        let mut state = SessionState::Invoice(InvoiceFlow::Awaiting(SimpleInvoiceAction::List));

        handle_text(&h.ctx, "42", &mut state, "billed@example.com").await?;

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Status: sent"));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_action_polls_provider_and_updates_row() -> Result<()> {
        let h = TestHarness::new().await?;
        h.provider.set_status("paid");
        let row = crate::core::invoices::apply_webhook_update(
            &h.ctx.db,
            &webhook_update(Platform::Paypal, "in_9", "sent", 25.0),
        )
        .await?;
        let mut state = SessionState::Invoice(InvoiceFlow::Awaiting(SimpleInvoiceAction::Status));

        handle_text(&h.ctx, "42", &mut state, &row.id.to_string()).await?;

        assert!(last_reply(&h.transport).contains("Invoice Status: paid"));
        let reloaded = crate::core::invoices::get_invoice_by_id(&h.ctx.db, row.id)
            .await?
            .unwrap();
        assert_eq!(reloaded.status, "paid");
        Ok(())
    }

    #[tokio::test]
    async fn test_view_unknown_invoice() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Invoice(InvoiceFlow::Awaiting(SimpleInvoiceAction::View));

        handle_text(&h.ctx, "42", &mut state, "9999").await?;

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Invoice not found"));
        Ok(())
    }
}
