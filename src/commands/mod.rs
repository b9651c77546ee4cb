use crate::{
    state::StateStore,
    subscribers::{Subscriber, SubscriberRegistry},
    telegram::{BotCommand, MessageGateway, TelegramClient, Update},
};
use chrono::Utc;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::RwLock, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const LONG_POLL_SECS: u64 = 30;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Command menu registered with Telegram at startup.
pub const BOT_COMMANDS: &[BotCommand] = &[
    BotCommand {
        command: "start",
        description: "Welcome message and introduction",
    },
    BotCommand {
        command: "subscribe",
        description: "Subscribe to governance proposal notifications",
    },
    BotCommand {
        command: "unsubscribe",
        description: "Unsubscribe from notifications",
    },
    BotCommand {
        command: "status",
        description: "Check bot and subscription status",
    },
    BotCommand {
        command: "help",
        description: "Show help message and available commands",
    },
];

/// Consumes inbound Telegram updates and applies subscribe / unsubscribe /
/// status commands to the shared registry. Runs independently of the
/// poller's timer-driven cycle.
pub struct CommandHandler {
    client: Arc<TelegramClient>,
    registry: Arc<RwLock<SubscriberRegistry>>,
    store: Arc<StateStore>,
    last_processed_block: Arc<AtomicU64>,
    contract: String,
    poll_interval_minutes: u64,
    cancel_token: CancellationToken,
    offset: i64,
}

impl CommandHandler {
    pub fn new(
        client: Arc<TelegramClient>,
        registry: Arc<RwLock<SubscriberRegistry>>,
        store: Arc<StateStore>,
        last_processed_block: Arc<AtomicU64>,
        contract: String,
        poll_interval_minutes: u64,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            client,
            registry,
            store,
            last_processed_block,
            contract,
            poll_interval_minutes,
            cancel_token,
            offset: 0,
        }
    }

    pub async fn run(mut self) {
        info!("🤖 Command handler started");
        loop {
            let updates = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Shutdown signal received, exiting command handler...");
                    return;
                }
                result = self.client.get_updates(self.offset, LONG_POLL_SECS) => result,
            };
            match updates {
                Ok(updates) => {
                    for update in updates {
                        self.offset = self.offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch updates: {e}");
                    sleep(FETCH_RETRY_DELAY).await;
                }
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat_id = message.chat.id;
        // `/subscribe@BotName` in group chats maps to `/subscribe`.
        let command = text
            .split_whitespace()
            .next()
            .and_then(|word| word.split('@').next())
            .unwrap_or_default();

        let reply = match command {
            "/start" | "/help" => self.help_text(),
            "/subscribe" => {
                let username = message.from.as_ref().and_then(|u| u.username.clone());
                let first_name = message.from.as_ref().and_then(|u| u.first_name.clone());
                self.subscribe(chat_id, username, first_name).await
            }
            "/unsubscribe" => self.unsubscribe(chat_id).await,
            "/status" => self.status(chat_id).await,
            _ if command.starts_with('/') => {
                "❓ Unknown command. Use /help to see available commands.".to_string()
            }
            _ => return,
        };

        if let Err(e) = self.client.send_message(chat_id, &reply).await {
            warn!("Failed to reply to {chat_id}: {e}");
        }
    }

    async fn subscribe(
        &self,
        chat_id: i64,
        username: Option<String>,
        first_name: Option<String>,
    ) -> String {
        let display_name = username
            .clone()
            .or_else(|| first_name.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let (inserted, snapshot) = {
            let mut registry = self.registry.write().await;
            let inserted = registry.insert(Subscriber {
                chat_id,
                username,
                first_name,
                subscribed_at: Utc::now().to_rfc3339(),
            });
            (inserted, registry.clone())
        };

        if !inserted {
            return "✅ You are already subscribed to Scroll governance notifications!".to_string();
        }
        if let Err(e) = self.store.save_subscribers(&snapshot) {
            error!("Failed to persist subscriber registry: {e}");
        }
        info!("📥 New subscriber: {chat_id} ({display_name})");

        format!(
            "🎉 **Successfully subscribed!**\n\n\
            You will now receive notifications when new Scroll governance proposals are created.\n\n\
            • Subscriber ID: {chat_id}\n\
            • Monitoring: {}\n\n\
            Use `/unsubscribe` anytime to stop receiving notifications.",
            self.contract
        )
    }

    async fn unsubscribe(&self, chat_id: i64) -> String {
        let (removed, snapshot) = {
            let mut registry = self.registry.write().await;
            let removed = registry.remove(chat_id);
            (removed, registry.clone())
        };

        if !removed {
            return "❌ You are not currently subscribed to notifications.".to_string();
        }
        if let Err(e) = self.store.save_subscribers(&snapshot) {
            error!("Failed to persist subscriber registry: {e}");
        }
        info!("📤 Unsubscribed: {chat_id}");

        "👋 **Successfully unsubscribed!**\n\n\
        You will no longer receive Scroll governance proposal notifications.\n\n\
        Use `/subscribe` anytime to start receiving notifications again."
            .to_string()
    }

    async fn status(&self, chat_id: i64) -> String {
        let registry = self.registry.read().await;
        let subscription = if registry.contains(chat_id) {
            "✅ Active"
        } else {
            "❌ Not subscribed"
        };
        let mut status = format!(
            "📊 **Bot Status:**\n\n\
            • Last processed block: {}\n\
            • Total subscribers: {}\n\
            • Monitoring contract: `{}`\n\
            • Check interval: {} minutes\n\
            • Your subscription: {subscription}",
            self.last_processed_block.load(Ordering::Relaxed),
            registry.len(),
            self.contract,
            self.poll_interval_minutes,
        );
        if let Some(subscriber) = registry.get(chat_id) {
            status.push_str(&format!(
                "\n• Subscribed since: {}",
                subscriber.subscribed_at
            ));
        }
        status
    }

    fn help_text(&self) -> String {
        format!(
            "🏛️ **Scroll Governance Bot**\n\n\
            I monitor Scroll governance for new proposals and send you notifications.\n\n\
            **Available Commands:**\n\
            • `/subscribe` - Subscribe to proposal notifications\n\
            • `/unsubscribe` - Unsubscribe from notifications\n\
            • `/status` - Check bot and subscription status\n\
            • `/help` - Show this help message\n\n\
            **Contract Details:**\n\
            • Address: `{}`\n\
            • Network: Scroll Mainnet\n\
            • Event: ProposalCreated\n\n\
            Use `/subscribe` to start receiving notifications about new Scroll governance proposals!",
            self.contract
        )
    }
}
