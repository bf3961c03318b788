//! Call wizard: phone → name → prompt → first_message.
//!
//! Collects the parameters for one outbound call and hands them to the call
//! server. The literal "default" (case-insensitive) for prompt and first
//! message maps to an empty string, which the call server replaces with its
//! own standard text. The session resets to idle after the call attempt,
//! whether it succeeded or not.

use crate::bot::{
    BotContext,
    outbound::CallRequest,
    session::{CallStep, SessionState},
};
use crate::errors::Result;
use tracing::info;

/// Digits only, 8 to 14 of them.
fn is_valid_phone(text: &str) -> bool {
    (8..=14).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_digit())
}

/// The "default" sentinel maps to an empty string, anything else is verbatim.
fn default_or(text: &str) -> String {
    if text.eq_ignore_ascii_case("default") {
        String::new()
    } else {
        text.to_string()
    }
}

/// Starts the wizard, replacing whatever was in the session slot.
pub async fn start(ctx: &BotContext, user_id: &str, state: &mut SessionState) -> Result<()> {
    *state = SessionState::Call(CallStep::Phone);
    ctx.transport
        .send_text(
            user_id,
            "📞 Please provide the client phone number to call (e.g., 33612345678):",
        )
        .await
}

/// Cancels an active call wizard; a no-op message otherwise.
pub async fn cancel(ctx: &BotContext, user_id: &str, state: &mut SessionState) -> Result<()> {
    if matches!(state, SessionState::Call(_)) {
        *state = SessionState::Idle;
        ctx.transport
            .send_text(user_id, "❌ Call session canceled.")
            .await
    } else {
        ctx.transport
            .send_text(user_id, "ℹ️ No active call session found.")
            .await
    }
}

/// Consumes one text input for whatever step the wizard is on.
pub async fn handle_text(
    ctx: &BotContext,
    user_id: &str,
    state: &mut SessionState,
    text: &str,
) -> Result<()> {
    let SessionState::Call(step) = state.clone() else {
        // Defensive fallback: a non-call state routed here resets the slot
        *state = SessionState::Idle;
        return ctx
            .transport
            .send_text(user_id, "⚠️ Unknown session step. Please restart using /call.")
            .await;
    };
    let text = text.trim();

    match step {
        CallStep::Phone => {
            if !is_valid_phone(text) {
                return ctx
                    .transport
                    .send_text(
                        user_id,
                        "❌ Invalid phone number. Please enter a valid number (e.g., 33612345678):",
                    )
                    .await;
            }
            *state = SessionState::Call(CallStep::Name {
                phone: text.to_string(),
            });
            ctx.transport
                .send_text(user_id, "👤 Please enter the customer name:")
                .await
        }
        CallStep::Name { phone } => {
            if text.chars().count() < 2 {
                return ctx
                    .transport
                    .send_text(user_id, "❌ Please enter a valid customer name:")
                    .await;
            }
            *state = SessionState::Call(CallStep::Prompt {
                phone,
                name: text.to_string(),
            });
            ctx.transport
                .send_text(
                    user_id,
                    "💬 Enter the prompt for the AI agent (or type \"default\" for standard):",
                )
                .await
        }
        CallStep::Prompt { phone, name } => {
            *state = SessionState::Call(CallStep::FirstMessage {
                phone,
                name,
                prompt: default_or(text),
            });
            ctx.transport
                .send_text(
                    user_id,
                    "🗣️ Enter the first message for the AI agent (or type \"default\" for standard):",
                )
                .await
        }
        CallStep::FirstMessage {
            phone,
            name,
            prompt,
        } => {
            let request = CallRequest {
                number: phone,
                name,
                prompt,
                first_message: default_or(text),
            };

            let reply = match ctx.dialer.place_call(&request).await {
                Ok(receipt) => {
                    info!(number = %request.number, call_sid = %receipt.call_sid, "Outbound call initiated");
                    format!(
                        "📲 Outbound call initiated!\n\nPhone: {}\nName: {}\nPrompt: {}\nFirst message: {}\nCall SID: {}",
                        request.number,
                        request.name,
                        if request.prompt.is_empty() { "default" } else { &request.prompt },
                        if request.first_message.is_empty() { "default" } else { &request.first_message },
                        receipt.call_sid,
                    )
                }
                Err(e) => format!("⚠️ Failed to initiate outbound call: {e}"),
            };

            // Reset unconditionally, even when the call failed
            *state = SessionState::Idle;
            ctx.transport.send_text(user_id, &reply).await
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{TestHarness, last_reply};

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("33612345678"));
        assert!(is_valid_phone("12345678"));
        assert!(is_valid_phone("12345678901234"));
        assert!(!is_valid_phone("123"));
        assert!(!is_valid_phone("123456789012345"));
        assert!(!is_valid_phone("3361234567a"));
        assert!(!is_valid_phone(""));
    }

    #[tokio::test]
    async fn test_full_flow_builds_expected_payload() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Idle;

        start(&h.ctx, "42", &mut state).await?;
        assert_eq!(state, SessionState::Call(CallStep::Phone));

        // Full happy path: "33612345678", "Jane Doe", "default", "Hello!"
        handle_text(&h.ctx, "42", &mut state, "33612345678").await?;
        handle_text(&h.ctx, "42", &mut state, "Jane Doe").await?;
        handle_text(&h.ctx, "42", &mut state, "default").await?;
        handle_text(&h.ctx, "42", &mut state, "Hello!").await?;

        let calls = h.dialer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            CallRequest {
                number: "33612345678".to_string(),
                name: "Jane Doe".to_string(),
                prompt: String::new(),
                first_message: "Hello!".to_string(),
            }
        );
        drop(calls);

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Outbound call initiated"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_phone_reprompts_without_advancing() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Call(CallStep::Phone);

        handle_text(&h.ctx, "42", &mut state, "123").await?;

        assert_eq!(state, SessionState::Call(CallStep::Phone));
        assert!(last_reply(&h.transport).contains("Invalid phone number"));
        Ok(())
    }

    #[tokio::test]
    async fn test_short_name_reprompts_and_keeps_phone() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Call(CallStep::Name {
            phone: "33612345678".to_string(),
        });

        // "é" is one character across two bytes and must still be too short
        for short in ["x", "é"] {
            handle_text(&h.ctx, "42", &mut state, short).await?;

            // Collected phone must be byte-identical after the failure
            assert_eq!(
                state,
                SessionState::Call(CallStep::Name {
                    phone: "33612345678".to_string()
                })
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_dialer_failure_still_resets_to_idle() -> Result<()> {
        let h = TestHarness::new().await?;
        h.dialer.fail_next();
        let mut state = SessionState::Call(CallStep::FirstMessage {
            phone: "33612345678".to_string(),
            name: "Jane".to_string(),
            prompt: String::new(),
        });

        handle_text(&h.ctx, "42", &mut state, "Hello!").await?;

        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Failed to initiate outbound call"));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_clears_active_wizard() -> Result<()> {
        let h = TestHarness::new().await?;
        let mut state = SessionState::Call(CallStep::Phone);

        cancel(&h.ctx, "42", &mut state).await?;
        assert_eq!(state, SessionState::Idle);
        assert!(last_reply(&h.transport).contains("Call session canceled"));

        cancel(&h.ctx, "42", &mut state).await?;
        assert!(last_reply(&h.transport).contains("No active call session"));
        Ok(())
    }
}
