//! Notification dispatch boundary
//!
//! Notification delivery is fire-and-forget: a failed dispatch is logged and
//! never propagated into the transaction that triggered it. Dispatchers are
//! injected as trait objects, constructed once at process start.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::model::notification::{Notification, NotificationKind};

/// Consumer of domain events, fanning out to stored notifications and push
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a notification to a user. Never fails the caller.
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
        booking_id: Option<Uuid>,
    );
}

/// In-memory dispatcher that stores notifications for later retrieval
pub struct InMemoryDispatcher {
    /// Notifications by recipient
    notifications: DashMap<Uuid, Vec<Notification>>,
}

impl InMemoryDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            notifications: DashMap::new(),
        }
    }

    /// All notifications stored for a user, newest last
    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.notifications
            .get(&user_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryDispatcher {
    async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
        booking_id: Option<Uuid>,
    ) {
        debug!("Notifying user {}: {}", user_id, title);

        let notification =
            Notification::new(user_id, kind, title.to_string(), body.to_string(), booking_id);

        self.notifications
            .entry(user_id)
            .or_default()
            .push(notification);
    }
}
