use crate::{
    state::StateStore,
    subscribers::SubscriberRegistry,
    telegram::{MessageGateway, SendError},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans one message out to every current subscriber. Permanently unreachable
/// recipients are pruned from the registry and the change persisted; a single
/// recipient's failure never aborts delivery to the rest.
pub struct Dispatcher<G: MessageGateway> {
    gateway: Arc<G>,
    registry: Arc<RwLock<SubscriberRegistry>>,
    store: Arc<StateStore>,
}

impl<G: MessageGateway> Dispatcher<G> {
    pub fn new(
        gateway: Arc<G>,
        registry: Arc<RwLock<SubscriberRegistry>>,
        store: Arc<StateStore>,
    ) -> Self {
        Self {
            gateway,
            registry,
            store,
        }
    }

    pub async fn notify(&self, text: &str) -> DispatchReport {
        let recipients = self.registry.read().await.snapshot();
        if recipients.is_empty() {
            debug!("📭 No subscribers to notify");
            return DispatchReport::default();
        }

        let mut report = DispatchReport::default();
        let mut removed = Vec::new();
        for subscriber in &recipients {
            match self.gateway.send_message(subscriber.chat_id, text).await {
                Ok(()) => report.delivered += 1,
                Err(SendError::Permanent(reason)) => {
                    report.failed += 1;
                    removed.push(subscriber.chat_id);
                    warn!(
                        "🚫 Removing unreachable subscriber {} ({}): {reason}",
                        subscriber.chat_id,
                        subscriber
                            .username
                            .as_deref()
                            .or(subscriber.first_name.as_deref())
                            .unwrap_or("Unknown")
                    );
                }
                Err(SendError::Transient(reason)) => {
                    report.failed += 1;
                    warn!(
                        "❌ Failed to send message to {}: {reason}",
                        subscriber.chat_id
                    );
                }
            }
        }

        if !removed.is_empty() {
            let snapshot = {
                let mut registry = self.registry.write().await;
                for chat_id in &removed {
                    registry.remove(*chat_id);
                }
                registry.clone()
            };
            if let Err(e) = self.store.save_subscribers(&snapshot) {
                error!("Failed to persist subscriber registry: {e}");
            }
        }

        info!(
            "📤 Notification sent: {} successful, {} failed",
            report.delivered, report.failed
        );
        report
    }
}
