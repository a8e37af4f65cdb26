//! Producer side of the notification queue.
//!
//! Jobs are serialized onto a Redis list consumed by an out-of-process
//! worker. Unlike the cache there is no silent fallback: a failed enqueue
//! propagates to the caller and aborts the surrounding operation.

use crate::error::AppResult;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const EMAIL_QUEUE_KEY: &str = "queue:email";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub name: String,
    pub data: EmailJob,
}

#[derive(Clone)]
enum QueueBackend {
    Redis(redis::Client),
    Memory(Arc<Mutex<Vec<QueuedJob>>>),
}

#[derive(Clone)]
pub struct NotificationQueue {
    backend: QueueBackend,
}

impl NotificationQueue {
    pub fn connect(url: Option<&str>) -> AppResult<Self> {
        let backend = match url {
            Some(url) => QueueBackend::Redis(redis::Client::open(url)?),
            None => {
                log::warn!("REDIS_URL not set, notification queue using in-memory backend");
                QueueBackend::Memory(Arc::new(Mutex::new(Vec::new())))
            }
        };

        Ok(Self { backend })
    }

    /// In-memory only queue.
    pub fn memory() -> Self {
        Self {
            backend: QueueBackend::Memory(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub async fn add(&self, name: &str, data: EmailJob) -> AppResult<()> {
        let job = QueuedJob {
            name: name.to_string(),
            data,
        };

        match &self.backend {
            QueueBackend::Redis(client) => {
                let payload = serde_json::to_string(&job)?;
                let mut conn = client.get_multiplexed_async_connection().await?;
                conn.lpush::<_, _, ()>(EMAIL_QUEUE_KEY, payload).await?;
            }
            QueueBackend::Memory(jobs) => {
                jobs.lock().await.push(job);
            }
        }

        log::debug!("Enqueued notification job: {name}");
        Ok(())
    }

    /// Jobs held by the in-memory backend; empty for the Redis backend.
    pub(crate) async fn memory_jobs(&self) -> Vec<QueuedJob> {
        match &self.backend {
            QueueBackend::Redis(_) => Vec::new(),
            QueueBackend::Memory(jobs) => jobs.lock().await.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_queue_keeps_order() {
        let queue = NotificationQueue::memory();
        queue
            .add(
                "monthly-statement",
                EmailJob {
                    to: "a@example.com".to_string(),
                    subject: "Statement 6/2025".to_string(),
                    html: "<p>Your charge for Netflix: $76.33</p>".to_string(),
                },
            )
            .await
            .unwrap();
        queue
            .add(
                "payment-receipt",
                EmailJob {
                    to: "b@example.com".to_string(),
                    subject: "Payment confirmation".to_string(),
                    html: "<p>Payment received: $50.00</p>".to_string(),
                },
            )
            .await
            .unwrap();

        let jobs = queue.memory_jobs().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "monthly-statement");
        assert_eq!(jobs[1].name, "payment-receipt");
    }
}
