//! Implementation of the `allure-notifier reset` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct ResetArgs {}

#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub success: bool,
    pub cleared: u64,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        format!("Processed launch store cleared ({} launch id(s) removed)", self.cleared)
    }
}

pub async fn execute(_args: ResetArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let cleared = ctx
        .dedup()
        .reset_all()
        .await
        .context("Failed to clear processed launches")?;

    output(&ResetOutput { success: true, cleared }, json_mode);
    Ok(())
}
