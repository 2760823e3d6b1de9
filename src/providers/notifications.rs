//! In-process notification topic
//!
//! A producer handle plus one consumer task per topic. Records get a
//! monotonically increasing offset; the consumer logs each one and keeps
//! the most recent records around for inspection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{AppError, AppResult};

pub const NOTIFICATION_TOPIC: &str = "notification";
const CHANNEL_CAPACITY: usize = 1024;
const RECENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub message_id: Uuid,
    pub topic: String,
    pub key: String,
    pub value: String,
    pub offset: u64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationStats {
    pub topic: String,
    pub published: u64,
    pub failed: u64,
    pub consumed: u64,
}

type RecentRecords = Arc<Mutex<VecDeque<NotificationRecord>>>;

pub struct NotificationBus {
    topic: String,
    sender: mpsc::Sender<NotificationRecord>,
    next_offset: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
    consumed: Arc<AtomicU64>,
    recent: RecentRecords,
    shutdown_tx: watch::Sender<bool>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationBus {
    /// Create the topic and spawn its consumer. Must run inside a tokio runtime.
    pub fn start(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumed = Arc::new(AtomicU64::new(0));
        let recent: RecentRecords = Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)));

        let handle = tokio::spawn(consume(
            topic.clone(),
            receiver,
            shutdown_rx,
            consumed.clone(),
            recent.clone(),
        ));
        info!(topic = %topic, "Subscribed to topic");

        Self {
            topic,
            sender,
            next_offset: AtomicU64::new(0),
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            consumed,
            recent,
            shutdown_tx,
            consumer: Mutex::new(Some(handle)),
        }
    }

    pub async fn publish(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> AppResult<NotificationRecord> {
        let record = NotificationRecord {
            message_id: Uuid::new_v4(),
            topic: self.topic.clone(),
            key: key.into(),
            value: value.into(),
            offset: self.next_offset.fetch_add(1, Ordering::Relaxed),
            published_at: Utc::now(),
        };

        self.sender.send(record.clone()).await.map_err(|_| {
            self.failed.fetch_add(1, Ordering::Relaxed);
            error!(topic = %self.topic, "Error sending message: consumer has stopped");
            AppError::publish_failed(&self.topic)
        })?;
        self.published.fetch_add(1, Ordering::Relaxed);

        info!(topic = %self.topic, offset = record.offset, "Message sent to topic");
        Ok(record)
    }

    /// Up to `limit` most recently consumed records, oldest first
    pub fn recent(&self, limit: usize) -> Vec<NotificationRecord> {
        match self.recent.lock() {
            Ok(buffer) => {
                let skip = buffer.len().saturating_sub(limit);
                buffer.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn stats(&self) -> NotificationStats {
        NotificationStats {
            topic: self.topic.clone(),
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
        }
    }

    /// Stop the consumer and wait for it to finish. Records already
    /// accepted by `publish` are consumed before it exits.
    pub async fn shutdown(&self) {
        info!(topic = %self.topic, "Shutting down consumer...");
        let _ = self.shutdown_tx.send(true);

        let handle = self.consumer.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Consumer task for {} failed: {}", self.topic, e);
            }
        }
    }
}

async fn consume(
    topic: String,
    mut receiver: mpsc::Receiver<NotificationRecord>,
    mut shutdown: watch::Receiver<bool>,
    consumed: Arc<AtomicU64>,
    recent: RecentRecords,
) {
    let handle = |record: NotificationRecord| {
        info!(
            key = %record.key,
            value = %record.value,
            offset = record.offset,
            "Consumed message"
        );
        consumed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut buffer) = recent.lock() {
            if buffer.len() == RECENT_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(record);
        }
    };

    loop {
        tokio::select! {
            next = receiver.recv() => match next {
                Some(record) => handle(record),
                None => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    // Refuse new records, then drain what was already accepted
                    receiver.close();
                    while let Some(record) = receiver.recv().await {
                        handle(record);
                    }
                    break;
                }
            }
        }
    }

    info!(topic = %topic, "Consumer closed for topic");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for_consumed(bus: &NotificationBus, count: u64) {
        for _ in 0..100 {
            if bus.stats().consumed >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("consumer did not catch up to {} records", count);
    }

    #[tokio::test]
    async fn test_offsets_are_monotonic() {
        let bus = NotificationBus::start(NOTIFICATION_TOPIC);
        let first = bus.publish("a", "{}").await.unwrap();
        let second = bus.publish("b", "{}").await.unwrap();
        assert_eq!(first.offset, 0);
        assert_eq!(second.offset, 1);
        assert_eq!(second.topic, NOTIFICATION_TOPIC);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_consumer_records_messages() {
        let bus = NotificationBus::start(NOTIFICATION_TOPIC);
        for i in 0..3 {
            bus.publish(format!("key-{}", i), format!("value-{}", i))
                .await
                .unwrap();
        }
        wait_for_consumed(&bus, 3).await;

        let recent = bus.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].key, "key-1");
        assert_eq!(recent[1].value, "value-2");
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_recent_is_bounded() {
        let bus = NotificationBus::start(NOTIFICATION_TOPIC);
        let total = RECENT_CAPACITY as u64 + 5;
        for i in 0..total {
            bus.publish(i.to_string(), "{}").await.unwrap();
        }
        wait_for_consumed(&bus, total).await;

        let recent = bus.recent(usize::MAX);
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0].offset, 5);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_fails() {
        let bus = NotificationBus::start(NOTIFICATION_TOPIC);
        bus.shutdown().await;

        let err = bus.publish("late", "{}").await.unwrap_err();
        assert_eq!(err.code, crate::models::ErrorCode::NotificationPublishFailed);

        let stats = bus.stats();
        assert_eq!(stats.published, 0);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_accepted_records() {
        let bus = NotificationBus::start(NOTIFICATION_TOPIC);
        for i in 0..50 {
            bus.publish(i.to_string(), "{}").await.unwrap();
        }
        bus.shutdown().await;

        let stats = bus.stats();
        assert_eq!(stats.published, 50);
        assert_eq!(stats.consumed, 50);
        assert_eq!(bus.recent(1)[0].offset, 49);
    }
}
