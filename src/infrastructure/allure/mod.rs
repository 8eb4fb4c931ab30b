//! Allure TestOps API adapter

pub mod client;
pub mod query;
pub mod retry;
pub mod types;

pub use client::{AllureClient, AllureClientConfig, PAGE_SIZE};
pub use query::{encode_search, SearchFilter};
pub use retry::TransportRetry;
