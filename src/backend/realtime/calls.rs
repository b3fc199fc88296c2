/**
 * Call Signaling State
 *
 * In-memory tracking of socket-signaled calls, keyed by call id:
 *
 * ```text
 * idle ──initiate──▶ ringing ──answer──▶ active ──end──▶ (removed)
 *                       │
 *                       ├──reject──▶ (removed)
 *                       └──ring timeout──▶ (removed, both sides get call_ended)
 * ```
 *
 * Disconnecting the last socket of a participant ends every call that user is
 * in. Nothing here survives a restart.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::messaging::call::call_id;
use crate::shared::messaging::CallType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Ringing,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCall {
    pub call_id: String,
    pub caller: Uuid,
    pub callee: Uuid,
    pub conversation_id: Option<Uuid>,
    pub call_type: CallType,
    pub phase: CallPhase,
    pub created_at: DateTime<Utc>,
}

impl TrackedCall {
    /// The other side of the call, if `user` is a participant
    pub fn peer_of(&self, user: Uuid) -> Option<Uuid> {
        if user == self.caller {
            Some(self.callee)
        } else if user == self.callee {
            Some(self.caller)
        } else {
            None
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("unknown call {0}")]
    UnknownCall(String),
    #[error("user is not a participant of call {0}")]
    NotParticipant(String),
    #[error("call {call_id} cannot {action} while {phase:?}")]
    InvalidTransition {
        call_id: String,
        action: &'static str,
        phase: CallPhase,
    },
}

#[derive(Clone, Default)]
pub struct CallTracker {
    calls: Arc<Mutex<HashMap<String, TrackedCall>>>,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TrackedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start ringing `callee`
    pub fn initiate(
        &self,
        caller: Uuid,
        callee: Uuid,
        conversation_id: Option<Uuid>,
        call_type: CallType,
        now: DateTime<Utc>,
    ) -> TrackedCall {
        let mut calls = self.lock();
        let mut id = call_id(now, caller);
        while calls.contains_key(&id) {
            id = call_id(now, caller);
        }
        let call = TrackedCall {
            call_id: id,
            caller,
            callee,
            conversation_id,
            call_type,
            phase: CallPhase::Ringing,
            created_at: now,
        };
        calls.insert(call.call_id.clone(), call.clone());
        drop(calls);
        tracing::info!("[Calls] {} ringing {} -> {}", call.call_id, caller, callee);
        call
    }

    /// Callee accepts a ringing call. Returns the caller.
    pub fn answer(&self, call_id: &str, user: Uuid) -> Result<Uuid, CallError> {
        let mut calls = self.lock();
        let call = calls
            .get_mut(call_id)
            .ok_or_else(|| CallError::UnknownCall(call_id.to_string()))?;
        if user != call.callee {
            return Err(CallError::NotParticipant(call_id.to_string()));
        }
        if call.phase != CallPhase::Ringing {
            return Err(CallError::InvalidTransition {
                call_id: call_id.to_string(),
                action: "answer",
                phase: call.phase,
            });
        }
        call.phase = CallPhase::Active;
        Ok(call.caller)
    }

    /// Callee declines a ringing call. Returns the caller.
    pub fn reject(&self, call_id: &str, user: Uuid) -> Result<Uuid, CallError> {
        let mut calls = self.lock();
        let call = calls
            .get(call_id)
            .ok_or_else(|| CallError::UnknownCall(call_id.to_string()))?;
        if user != call.callee {
            return Err(CallError::NotParticipant(call_id.to_string()));
        }
        if call.phase != CallPhase::Ringing {
            return Err(CallError::InvalidTransition {
                call_id: call_id.to_string(),
                action: "reject",
                phase: call.phase,
            });
        }
        let caller = call.caller;
        calls.remove(call_id);
        Ok(caller)
    }

    /// Either side hangs up. Returns the peer.
    pub fn end(&self, call_id: &str, user: Uuid) -> Result<Uuid, CallError> {
        let mut calls = self.lock();
        let peer = calls
            .get(call_id)
            .ok_or_else(|| CallError::UnknownCall(call_id.to_string()))?
            .peer_of(user)
            .ok_or_else(|| CallError::NotParticipant(call_id.to_string()))?;
        calls.remove(call_id);
        Ok(peer)
    }

    /// Remove every call `user` is part of
    pub fn drop_user(&self, user: Uuid) -> Vec<TrackedCall> {
        let mut calls = self.lock();
        let ids: Vec<String> = calls
            .values()
            .filter(|call| call.peer_of(user).is_some())
            .map(|call| call.call_id.clone())
            .collect();
        ids.iter().filter_map(|id| calls.remove(id)).collect()
    }

    /// Remove ringing calls created before `now - timeout`
    pub fn expire_ringing(&self, timeout: Duration, now: DateTime<Utc>) -> Vec<TrackedCall> {
        let cutoff = now - timeout;
        let mut calls = self.lock();
        let ids: Vec<String> = calls
            .values()
            .filter(|call| call.phase == CallPhase::Ringing && call.created_at <= cutoff)
            .map(|call| call.call_id.clone())
            .collect();
        ids.iter().filter_map(|id| calls.remove(id)).collect()
    }

    pub fn get(&self, call_id: &str) -> Option<TrackedCall> {
        self.lock().get(call_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
