//! Realtime hub
//!
//! Owns the room registry and the in-memory call tracker, and turns call
//! terminations the server decides on (disconnects, ring timeouts) into
//! `call_ended` frames.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::calls::{CallTracker, TrackedCall};
use super::rooms::{Room, RoomRegistry};
use crate::shared::event::{CallSignalEvent, ServerEvent};

/// How often the ring sweeper looks for stale calls
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

pub const REASON_DISCONNECTED: &str = "disconnected";
pub const REASON_TIMEOUT: &str = "timeout";

#[derive(Clone, Default)]
pub struct RealtimeHub {
    rooms: RoomRegistry,
    calls: CallTracker,
}

impl RealtimeHub {
    pub fn new(rooms: RoomRegistry) -> Self {
        Self {
            rooms,
            calls: CallTracker::new(),
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn calls(&self) -> &CallTracker {
        &self.calls
    }

    /// End every call `user` is in, telling each peer why
    pub fn end_calls_for(&self, user: Uuid, reason: &str) -> usize {
        let dropped = self.calls.drop_user(user);
        for call in &dropped {
            if let Some(peer) = call.peer_of(user) {
                self.signal_ended(call, user, peer, reason);
            }
        }
        if !dropped.is_empty() {
            tracing::info!("[Calls] Ended {} call(s) for {} ({})", dropped.len(), user, reason);
        }
        dropped.len()
    }

    /// End ringing calls older than `timeout`; both sides are told
    pub fn expire_ringing(&self, timeout: chrono::Duration) -> usize {
        let expired = self.calls.expire_ringing(timeout, Utc::now());
        for call in &expired {
            tracing::info!("[Calls] {} was not answered in time", call.call_id);
            self.signal_ended(call, call.callee, call.caller, REASON_TIMEOUT);
            self.signal_ended(call, call.callee, call.callee, REASON_TIMEOUT);
        }
        expired.len()
    }

    /// Periodically expire unanswered calls
    pub fn spawn_ring_sweeper(&self, ring_timeout: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        let timeout = chrono::Duration::from_std(ring_timeout).unwrap_or_else(|_| chrono::Duration::seconds(45));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL.min(ring_timeout.max(Duration::from_millis(100))));
            loop {
                interval.tick().await;
                hub.expire_ringing(timeout);
            }
        })
    }

    fn signal_ended(&self, call: &TrackedCall, user_id: Uuid, recipient: Uuid, reason: &str) {
        let event = CallSignalEvent {
            call_id: call.call_id.clone(),
            user_id,
            reason: Some(reason.to_string()),
        };
        self.rooms.emit(Room::User(recipient), ServerEvent::CallEnded, &event);
    }
}
