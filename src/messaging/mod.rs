//! Player notifications
//!
//! The engine never talks to sockets; it queues notices and the host
//! drains them and delivers however it likes (chat line, toast, log).
//! Notices carry everything needed to render a message, tagged for
//! JSON transport.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A notice for a player or the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notice {
    /// Sent to a target right before they are moved
    #[serde(rename = "teleporting")]
    Teleporting { target: String, destination: String },
    /// Sent to the actor when a target is denied; `node` is the
    /// missing permission
    #[serde(rename = "permission_denied")]
    PermissionDenied { target: String, node: String },
    /// Sent to the actor when the destination did not resolve
    #[serde(rename = "invalid_destination")]
    InvalidDestination { input: String },
    /// Sent to the actor when no safe arrival exists for a target
    #[serde(rename = "no_safe_location")]
    NoSafeLocation { target: String, world: String },
}

/// A notice addressed to a recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedNotice {
    /// Who should receive this notice
    pub recipient: String,
    pub notice: Notice,
}

/// Queue of undelivered notices
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: RwLock<Vec<QueuedNotice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue a notice for a recipient
    pub async fn notify(&self, recipient: &str, notice: Notice) {
        let mut notices = self.notices.write().await;
        notices.push(QueuedNotice {
            recipient: recipient.to_string(),
            notice,
        });
    }

    /// Take all pending notices
    pub async fn drain(&self) -> Vec<QueuedNotice> {
        let mut notices = self.notices.write().await;
        std::mem::take(&mut *notices)
    }

    /// Take pending notices for one recipient, leaving the rest queued
    pub async fn drain_for(&self, recipient: &str) -> Vec<Notice> {
        let mut notices = self.notices.write().await;
        let mut taken = Vec::new();
        notices.retain(|queued| {
            if queued.recipient == recipient {
                taken.push(queued.notice.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    /// Number of queued notices
    pub async fn len(&self) -> usize {
        self.notices.read().await.len()
    }

    /// Check if the queue is empty
    pub async fn is_empty(&self) -> bool {
        self.notices.read().await.is_empty()
    }
}
