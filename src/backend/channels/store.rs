//! Channel persistence

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::messaging::{Channel, ChannelType};

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn insert(&self, channel: &Channel) -> Result<(), StoreError>;

    async fn channel(&self, id: Uuid) -> Result<Option<Channel>, StoreError>;

    async fn by_name(&self, name: &str) -> Result<Option<Channel>, StoreError>;

    /// Unarchived channels where `user` is a member, newest first
    async fn list_for_member(&self, user: Uuid, kind: Option<ChannelType>) -> Result<Vec<Channel>, StoreError>;

    /// Replace the stored record. Returns `false` if it does not exist.
    async fn update(&self, channel: &Channel) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct MemoryChannelStore {
    channels: Mutex<HashMap<Uuid, Channel>>,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Channel>>, StoreError> {
        self.channels.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn insert(&self, channel: &Channel) -> Result<(), StoreError> {
        self.lock()?.insert(channel.id, channel.clone());
        Ok(())
    }

    async fn channel(&self, id: Uuid) -> Result<Option<Channel>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn by_name(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        Ok(self.lock()?.values().find(|c| c.name == name).cloned())
    }

    async fn list_for_member(&self, user: Uuid, kind: Option<ChannelType>) -> Result<Vec<Channel>, StoreError> {
        let channels = self.lock()?;
        let mut found: Vec<Channel> = channels
            .values()
            .filter(|c| !c.is_archived && c.is_member(user))
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update(&self, channel: &Channel) -> Result<bool, StoreError> {
        let mut channels = self.lock()?;
        match channels.get_mut(&channel.id) {
            Some(stored) => {
                *stored = channel.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
