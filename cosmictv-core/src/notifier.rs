//! Push-notification boundary.
//!
//! The core only knows an abstract notifier capability; provider
//! credentials and SDK initialization live outside. Without a real
//! provider the service runs in simulation mode: deliveries are logged
//! and counted but nothing leaves the process.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;

/// Batch size for token sends.
const SEND_CHUNK: usize = 500;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub mode: String,
    pub sent: usize,
    pub failed: usize,
}

/// Abstract push-notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver to everyone subscribed to a topic.
    async fn send_to_topic(&self, topic: &str, title: &str, body: &str) -> Result<DeliveryReport>;

    /// Deliver to an explicit token batch.
    async fn send_to_tokens(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<DeliveryReport>;

    /// Subscribe tokens to a topic, when the provider supports it.
    async fn subscribe_to_topic(&self, tokens: &[String], topic: &str) -> Result<()>;
}

/// Notifier that only logs: the simulation mode of the admin surface.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_to_topic(&self, topic: &str, title: &str, _body: &str) -> Result<DeliveryReport> {
        info!(topic, title, "Notification to topic (simulation)");
        Ok(DeliveryReport {
            mode: "simulation".to_string(),
            sent: 0,
            failed: 0,
        })
    }

    async fn send_to_tokens(
        &self,
        tokens: &[String],
        title: &str,
        _body: &str,
    ) -> Result<DeliveryReport> {
        info!(tokens = tokens.len(), title, "Notification to tokens (simulation)");
        Ok(DeliveryReport {
            mode: "simulation".to_string(),
            sent: 0,
            failed: 0,
        })
    }

    async fn subscribe_to_topic(&self, tokens: &[String], topic: &str) -> Result<()> {
        info!(tokens = tokens.len(), topic, "Topic subscription (simulation)");
        Ok(())
    }
}

/// Registered device tokens, grouped by user.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: DashMap<String, HashSet<String>>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: &str, token: &str) {
        self.devices
            .entry(user_id.to_string())
            .or_default()
            .insert(token.to_string());
    }

    /// Remove a token wherever it is registered.
    pub fn unregister(&self, token: &str) {
        let mut emptied: Option<String> = None;
        for mut entry in self.devices.iter_mut() {
            if entry.value_mut().remove(token) {
                if entry.value().is_empty() {
                    emptied = Some(entry.key().clone());
                }
                break;
            }
        }
        if let Some(user_id) = emptied {
            self.devices.remove(&user_id);
        }
    }

    #[must_use]
    pub fn total_users(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.devices.iter().map(|entry| entry.value().len()).sum()
    }

    #[must_use]
    pub fn all_tokens(&self) -> Vec<String> {
        self.devices
            .iter()
            .flat_map(|entry| entry.value().iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// (user, tokens) pairs for the admin listing.
    #[must_use]
    pub fn by_user(&self) -> Vec<(String, Vec<String>)> {
        self.devices
            .iter()
            .map(|entry| {
                let mut tokens: Vec<String> = entry.value().iter().cloned().collect();
                tokens.sort();
                (entry.key().clone(), tokens)
            })
            .collect()
    }
}

/// One entry of the admin notification history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub audience: String,
    pub recipients: usize,
    pub sent_at: DateTime<Utc>,
    pub status: String,
    pub fcm_result: DeliveryReport,
}

/// Broadcast notifications on request and remember what was sent.
pub struct NotificationService {
    notifier: std::sync::Arc<dyn Notifier>,
    devices: std::sync::Arc<DeviceRegistry>,
    history: RwLock<Vec<NotificationRecord>>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService").finish()
    }
}

impl NotificationService {
    #[must_use]
    pub fn new(
        notifier: std::sync::Arc<dyn Notifier>,
        devices: std::sync::Arc<DeviceRegistry>,
    ) -> Self {
        Self {
            notifier,
            devices,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Send to all registered devices, or to an explicit token list.
    pub async fn send(
        &self,
        title: &str,
        message: &str,
        notification_type: &str,
        audience: &str,
        tokens: &[String],
    ) -> Result<NotificationRecord> {
        let target: Vec<String> = if audience == "all" {
            self.devices.all_tokens()
        } else {
            let mut seen = HashSet::new();
            tokens
                .iter()
                .filter(|t| !t.is_empty() && seen.insert(t.as_str()))
                .cloned()
                .collect()
        };

        let mut report = DeliveryReport {
            mode: "no_targets".to_string(),
            sent: 0,
            failed: 0,
        };
        if !target.is_empty() {
            for batch in target.chunks(SEND_CHUNK) {
                let r = self.notifier.send_to_tokens(batch, title, message).await?;
                report.mode = r.mode;
                report.sent += r.sent;
                report.failed += r.failed;
            }
        }

        let record = NotificationRecord {
            id: Utc::now().timestamp_millis(),
            title: title.to_string(),
            message: message.to_string(),
            notification_type: notification_type.to_string(),
            audience: audience.to_string(),
            recipients: if report.sent > 0 { report.sent } else { target.len() },
            sent_at: Utc::now(),
            status: if report.sent > 0 { "sent" } else { "queued" }.to_string(),
            fcm_result: report,
        };

        self.history.write().insert(0, record.clone());
        Ok(record)
    }

    /// Notification history, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<NotificationRecord> {
        self.history.read().clone()
    }

    /// The underlying notifier, for callers that talk to it directly.
    #[must_use]
    pub fn notifier(&self) -> &std::sync::Arc<dyn Notifier> {
        &self.notifier
    }
}
