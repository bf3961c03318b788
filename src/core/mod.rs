//! Core business logic - framework-agnostic operations over the database.
//!
//! Nothing in here knows about the chat transport or the HTTP layer; the bot
//! and webhook modules call into these functions and format the results.

/// Customer lazy creation and provider-id caching
pub mod customers;
/// Invoice Lifecycle Engine - canonical invoice rows and webhook reconciliation
pub mod invoices;
/// Unpaid-invoice reminder sweep
pub mod reminder;
/// Summary and CSV report building
pub mod report;
/// User management and roles
pub mod users;
