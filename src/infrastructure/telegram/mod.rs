//! Telegram Bot API message transport.

pub mod client;

pub use client::TelegramTransport;
