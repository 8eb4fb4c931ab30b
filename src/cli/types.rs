//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{collect, reset, run, subscription};

#[derive(Parser)]
#[command(name = "allure-notifier")]
#[command(about = "Reports failed Allure TestOps launches to Telegram subscribers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project config file
    #[arg(short, long, global = true, env = "ALLURE_NOTIFIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run notification cycles and the daily reset until interrupted
    Run(run::RunArgs),

    /// Run a single collection cycle
    Collect(collect::CollectArgs),

    /// Forget every processed launch
    Reset(reset::ResetArgs),

    /// Subscribe a chat to a report
    Subscribe(subscription::SubscribeArgs),

    /// Remove a chat's subscription
    Unsubscribe(subscription::UnsubscribeArgs),

    /// List subscribed chats
    Subscribers(subscription::SubscribersArgs),
}
