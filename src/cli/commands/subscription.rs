//! Implementation of the `subscribe`, `unsubscribe` and `subscribers` commands.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{Subscriber, SubscriptionKind};
use crate::domain::ports::SubscriptionRepository;

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Telegram chat id (negative for groups)
    #[arg(allow_negative_numbers = true)]
    pub chat_id: i64,

    /// Report to receive: all or critical
    #[arg(short, long, default_value = "all")]
    pub kind: SubscriptionKind,

    /// Group title
    #[arg(long)]
    pub title: Option<String>,

    /// Username of a private chat
    #[arg(long)]
    pub username: Option<String>,
}

#[derive(Args, Debug)]
pub struct UnsubscribeArgs {
    /// Telegram chat id
    #[arg(allow_negative_numbers = true)]
    pub chat_id: i64,
}

#[derive(Args, Debug)]
pub struct SubscribersArgs {
    /// Only list chats with this subscription
    #[arg(short, long)]
    pub kind: Option<SubscriptionKind>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeOutput {
    pub chat_id: i64,
    pub kind: SubscriptionKind,
    pub previous: Option<SubscriptionKind>,
}

impl CommandOutput for SubscribeOutput {
    fn to_human(&self) -> String {
        match self.previous {
            None => format!("Chat {} subscribed to '{}' reports", self.chat_id, self.kind),
            Some(previous) if previous == self.kind => {
                format!("Chat {} is already subscribed to '{}' reports", self.chat_id, self.kind)
            }
            Some(previous) => format!(
                "Chat {} switched from '{}' to '{}' reports",
                self.chat_id, previous, self.kind
            ),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeOutput {
    pub chat_id: i64,
    pub removed: bool,
}

impl CommandOutput for UnsubscribeOutput {
    fn to_human(&self) -> String {
        if self.removed {
            format!("Chat {} unsubscribed", self.chat_id)
        } else {
            format!("Chat {} has no active subscription", self.chat_id)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribersOutput {
    pub subscribers: Vec<Subscriber>,
}

impl CommandOutput for SubscribersOutput {
    fn to_human(&self) -> String {
        if self.subscribers.is_empty() {
            return "No subscribers found.".to_string();
        }

        let mut table = list_table(&["chat id", "kind", "title", "username"]);
        for subscriber in &self.subscribers {
            table.add_row(vec![
                subscriber.chat_id.to_string(),
                subscriber.kind.to_string(),
                subscriber.title.clone().unwrap_or_default(),
                subscriber.username.clone().unwrap_or_default(),
            ]);
        }
        format!("{} subscriber(s):\n{table}", self.subscribers.len())
    }
}

pub async fn subscribe(args: SubscribeArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let subscriber = Subscriber {
        chat_id: args.chat_id,
        kind: args.kind,
        title: args.title,
        username: args.username,
    };
    let previous = ctx
        .subscriptions()
        .subscribe(&subscriber)
        .await
        .context("Failed to save subscription")?;

    output(
        &SubscribeOutput {
            chat_id: subscriber.chat_id,
            kind: subscriber.kind,
            previous,
        },
        json_mode,
    );
    Ok(())
}

pub async fn unsubscribe(args: UnsubscribeArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let removed = ctx
        .subscriptions()
        .unsubscribe(args.chat_id)
        .await
        .context("Failed to remove subscription")?;

    output(
        &UnsubscribeOutput {
            chat_id: args.chat_id,
            removed,
        },
        json_mode,
    );
    Ok(())
}

pub async fn list(args: SubscribersArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let repository = ctx.subscriptions();
    let subscribers = match args.kind {
        Some(kind) => repository.list_by_kind(kind).await,
        None => repository.list().await,
    }
    .context("Failed to list subscribers")?;

    output(&SubscribersOutput { subscribers }, json_mode);
    Ok(())
}
