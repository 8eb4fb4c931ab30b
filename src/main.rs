//! allure-notifier CLI entry point.

use clap::Parser;

use allure_notifier::cli::commands::{collect, reset, run, subscription};
use allure_notifier::cli::context::{load_config, AppContext};
use allure_notifier::cli::{handle_error, Cli, Commands};
use allure_notifier::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let ctx = match AppContext::open(config).await {
        Ok(ctx) => ctx,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, ctx, cli.json).await,
        Commands::Collect(args) => collect::execute(args, ctx, cli.json).await,
        Commands::Reset(args) => reset::execute(args, ctx, cli.json).await,
        Commands::Subscribe(args) => subscription::subscribe(args, ctx, cli.json).await,
        Commands::Unsubscribe(args) => subscription::unsubscribe(args, ctx, cli.json).await,
        Commands::Subscribers(args) => subscription::list(args, ctx, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
