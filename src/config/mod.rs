//! Configuration management.
//!
//! All configuration comes from the environment (optionally via a `.env`
//! file loaded in `main`): database location, provider credentials, webhook
//! secrets and the admin allow-list.

/// Database connection and table creation
pub mod database;
/// Application settings loaded from environment variables
pub mod settings;

pub use settings::{AppConfig, load_app_configuration};
