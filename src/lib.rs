//! `CashlyPay` - a chat-driven invoicing assistant
//!
//! This crate drives multi-step conversational wizards for managing users,
//! building and dispatching invoices across Stripe, PayPal and Square, and
//! initiating outbound calls, while asynchronous payment-provider webhooks
//! reconcile invoice status into a single canonical record.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Chat-facing layer - session store, dialog router, wizards, commands
pub mod bot;
/// Configuration management for database and application settings
pub mod config;
/// Core business logic - users, customers, invoice lifecycle, reports, reminders
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Payment-platform adapters behind one uniform contract
pub mod providers;
/// HTTP webhook ingestion for provider lifecycle events
pub mod webhook;

#[cfg(test)]
pub mod test_utils;
