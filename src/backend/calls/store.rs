//! Call record persistence

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::messaging::{CallRecord, CallStatus, CallType};

/// Optional filters of the call history listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub call_type: Option<CallType>,
    pub status: Option<CallStatus>,
}

impl HistoryFilter {
    fn matches(&self, call: &CallRecord) -> bool {
        self.call_type.is_none_or(|t| call.call_type == t) && self.status.is_none_or(|s| call.status == s)
    }
}

#[async_trait]
pub trait CallStore: Send + Sync {
    async fn insert(&self, call: &CallRecord) -> Result<(), StoreError>;

    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError>;

    /// Replace the stored record. Returns `false` if it does not exist.
    async fn update(&self, call: &CallRecord) -> Result<bool, StoreError>;

    /// Calls `user` took part in, newest first
    async fn history(&self, user: Uuid, filter: HistoryFilter, offset: u64, limit: u32) -> Result<Vec<CallRecord>, StoreError>;

    async fn count_history(&self, user: Uuid, filter: HistoryFilter) -> Result<u64, StoreError>;

    /// Ringing or active calls `user` takes part in
    async fn active_for(&self, user: Uuid) -> Result<Vec<CallRecord>, StoreError>;
}

#[derive(Default)]
pub struct MemoryCallStore {
    calls: Mutex<HashMap<String, CallRecord>>,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CallRecord>>, StoreError> {
        self.calls.lock().map_err(|_| StoreError::Poisoned)
    }

    fn matching(&self, user: Uuid, filter: HistoryFilter) -> Result<Vec<CallRecord>, StoreError> {
        let calls = self.lock()?;
        let mut found: Vec<CallRecord> = calls
            .values()
            .filter(|c| c.is_participant(user) && filter.matches(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.call_id.cmp(&a.call_id)));
        Ok(found)
    }
}

#[async_trait]
impl CallStore for MemoryCallStore {
    async fn insert(&self, call: &CallRecord) -> Result<(), StoreError> {
        let mut calls = self.lock()?;
        if calls.contains_key(&call.call_id) {
            return Err(StoreError::Duplicate(call.call_id.clone()));
        }
        calls.insert(call.call_id.clone(), call.clone());
        Ok(())
    }

    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError> {
        Ok(self.lock()?.get(call_id).cloned())
    }

    async fn update(&self, call: &CallRecord) -> Result<bool, StoreError> {
        let mut calls = self.lock()?;
        match calls.get_mut(&call.call_id) {
            Some(stored) => {
                *stored = call.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn history(&self, user: Uuid, filter: HistoryFilter, offset: u64, limit: u32) -> Result<Vec<CallRecord>, StoreError> {
        Ok(self
            .matching(user, filter)?
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_history(&self, user: Uuid, filter: HistoryFilter) -> Result<u64, StoreError> {
        Ok(self.matching(user, filter)?.len() as u64)
    }

    async fn active_for(&self, user: Uuid) -> Result<Vec<CallRecord>, StoreError> {
        Ok(self
            .matching(user, HistoryFilter::default())?
            .into_iter()
            .filter(|c| c.status.is_live())
            .collect())
    }
}
