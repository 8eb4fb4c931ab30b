//! Infrastructure layer
//!
//! Concrete implementations of the domain ports plus ambient concerns:
//! - Allure TestOps HTTP client
//! - Telegram Bot API transport
//! - Configuration loading
//! - Logging

pub mod allure;
pub mod config;
pub mod logging;
pub mod telegram;
