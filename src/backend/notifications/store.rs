//! Notification persistence
//!
//! `NotificationStore` is the seam between the service and its storage. Every
//! operation that touches an existing record is scoped by recipient, so one
//! user can never read or mutate another user's notifications.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::{Notification, NotificationType, Priority};

/// Page request against a user's notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u32,
    pub unread_only: bool,
}

/// Total and unread counts for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: u64,
    pub unread: u64,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid, recipient: Uuid) -> Result<Option<Notification>, StoreError>;

    /// Mark one notification read. Returns `false` when it does not exist for
    /// `recipient`. An already-read notification keeps its `read_at`.
    async fn mark_read(&self, id: Uuid, recipient: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Mark every unread notification read. Returns how many changed.
    async fn mark_all_read(&self, recipient: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Newest first, ties broken by id descending
    async fn list(&self, recipient: Uuid, query: ListQuery) -> Result<Vec<Notification>, StoreError>;

    async fn counts(&self, recipient: Uuid) -> Result<Counts, StoreError>;

    async fn count_by_type(&self, recipient: Uuid) -> Result<BTreeMap<NotificationType, u64>, StoreError>;

    async fn count_by_priority(&self, recipient: Uuid) -> Result<BTreeMap<Priority, u64>, StoreError>;

    async fn delete(&self, id: Uuid, recipient: Uuid) -> Result<bool, StoreError>;

    async fn delete_all(&self, recipient: Uuid) -> Result<u64, StoreError>;
}

/// In-memory store used when no database is configured
#[derive(Default)]
pub struct MemoryNotificationStore {
    notifications: Mutex<HashMap<Uuid, Notification>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Notification>>, StoreError> {
        self.notifications.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), StoreError> {
        self.lock()?.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid, recipient: Uuid) -> Result<Option<Notification>, StoreError> {
        Ok(self
            .lock()?
            .get(&id)
            .filter(|n| n.recipient == recipient)
            .cloned())
    }

    async fn mark_read(&self, id: Uuid, recipient: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut notifications = self.lock()?;
        match notifications.get_mut(&id).filter(|n| n.recipient == recipient) {
            Some(notification) => {
                notification.mark_read(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut notifications = self.lock()?;
        let changed = notifications
            .values_mut()
            .filter(|n| n.recipient == recipient)
            .map(|n| n.mark_read(now))
            .filter(|changed| *changed)
            .count();
        Ok(changed as u64)
    }

    async fn list(&self, recipient: Uuid, query: ListQuery) -> Result<Vec<Notification>, StoreError> {
        let notifications = self.lock()?;
        let mut matching: Vec<&Notification> = notifications
            .values()
            .filter(|n| n.recipient == recipient && (!query.unread_only || !n.is_read))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn counts(&self, recipient: Uuid) -> Result<Counts, StoreError> {
        let notifications = self.lock()?;
        let mut counts = Counts::default();
        for n in notifications.values().filter(|n| n.recipient == recipient) {
            counts.total += 1;
            if !n.is_read {
                counts.unread += 1;
            }
        }
        Ok(counts)
    }

    async fn count_by_type(&self, recipient: Uuid) -> Result<BTreeMap<NotificationType, u64>, StoreError> {
        let notifications = self.lock()?;
        let mut by_type = BTreeMap::new();
        for n in notifications.values().filter(|n| n.recipient == recipient) {
            *by_type.entry(n.kind).or_insert(0) += 1;
        }
        Ok(by_type)
    }

    async fn count_by_priority(&self, recipient: Uuid) -> Result<BTreeMap<Priority, u64>, StoreError> {
        let notifications = self.lock()?;
        let mut by_priority = BTreeMap::new();
        for n in notifications.values().filter(|n| n.recipient == recipient) {
            *by_priority.entry(n.priority).or_insert(0) += 1;
        }
        Ok(by_priority)
    }

    async fn delete(&self, id: Uuid, recipient: Uuid) -> Result<bool, StoreError> {
        let mut notifications = self.lock()?;
        let owned = notifications.get(&id).is_some_and(|n| n.recipient == recipient);
        if owned {
            notifications.remove(&id);
        }
        Ok(owned)
    }

    async fn delete_all(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let mut notifications = self.lock()?;
        let before = notifications.len();
        notifications.retain(|_, n| n.recipient != recipient);
        Ok((before - notifications.len()) as u64)
    }
}
