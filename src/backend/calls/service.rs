/**
 * Call Service
 *
 * Persistent call records for meeting-room calls. Media never touches this
 * server; a record only tracks who joined, when the call ran and how long.
 * Starting and ending a call tied to a conversation or a channel posts a
 * system message there.
 */

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::store::{CallStore, HistoryFilter};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::MessagingService;
use crate::shared::messaging::call::format_duration;
use crate::shared::messaging::{CallRecord, CallType, CreateMeetingRequest, MessageParent, MessageType};
use crate::shared::Pagination;

#[derive(Clone)]
pub struct CallService {
    calls: Arc<dyn CallStore>,
    messaging: MessagingService,
}

fn call_type_label(call_type: CallType) -> &'static str {
    match call_type {
        CallType::Voice => "voice",
        CallType::Video => "video",
        CallType::ScreenShare => "screen share",
    }
}

impl CallService {
    pub fn new(calls: Arc<dyn CallStore>, messaging: MessagingService) -> Self {
        Self { calls, messaging }
    }

    pub async fn history(
        &self,
        user: Uuid,
        filter: HistoryFilter,
        page: u32,
        limit: u32,
    ) -> BackendResult<(Vec<CallRecord>, Pagination)> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let (calls, total) = tokio::try_join!(
            self.calls.history(user, filter, offset, limit),
            self.calls.count_history(user, filter),
        )?;
        Ok((calls, Pagination::new(page, limit, total)))
    }

    /// Call `call_id`, visible to participants only
    pub async fn get(&self, user: Uuid, call_id: &str) -> BackendResult<CallRecord> {
        let call = self
            .calls
            .get(call_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Call not found"))?;
        if !call.is_participant(user) {
            return Err(BackendError::forbidden("Access denied to this call"));
        }
        Ok(call)
    }

    pub async fn create_meeting(&self, user: Uuid, request: CreateMeetingRequest) -> BackendResult<CallRecord> {
        if let Some(conversation_id) = request.conversation_id {
            self.messaging.conversation_for(user, conversation_id).await?;
        }
        if let Some(channel_id) = request.channel_id {
            if !self.messaging.can_access(user, MessageParent::Channel(channel_id)).await? {
                return Err(BackendError::forbidden("Access denied to this channel"));
            }
        }

        let call = CallRecord::new_meeting(&request, user, Utc::now());
        self.calls.insert(&call).await?;

        tracing::info!("[Calls] Meeting {} ({}) created by {}", call.call_id, call.room_name, user);
        Ok(call)
    }

    pub async fn start(&self, user: Uuid, user_name: &str, call_id: &str) -> BackendResult<CallRecord> {
        let mut call = self.live_call(user, call_id).await?;
        call.start(Utc::now());
        self.save(&call).await?;

        let content = format!("{} started a {} call", user_name, call_type_label(call.call_type));
        self.announce(&call, user, content, MessageType::CallStart).await;
        Ok(call)
    }

    pub async fn end(&self, user: Uuid, user_name: &str, call_id: &str) -> BackendResult<CallRecord> {
        let mut call = self.live_call(user, call_id).await?;
        call.end(Utc::now());
        self.save(&call).await?;

        let content = format!("{} ended the {} call", user_name, call_type_label(call.call_type));
        self.announce(&call, user, content, MessageType::CallEnd).await;
        tracing::info!(
            "[Calls] {} ended by {} after {}",
            call.call_id,
            user,
            format_duration(call.duration_secs.unwrap_or(0))
        );
        Ok(call)
    }

    /// Anyone holding the call id may join until the call ends
    pub async fn join(&self, user: Uuid, call_id: &str) -> BackendResult<CallRecord> {
        let mut call = self
            .calls
            .get(call_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Call not found"))?;
        if call.status.is_terminal() {
            return Err(BackendError::validation("callId", "Call has ended"));
        }
        call.join(user, Utc::now());
        self.save(&call).await?;
        Ok(call)
    }

    pub async fn leave(&self, user: Uuid, call_id: &str) -> BackendResult<CallRecord> {
        let mut call = self.get(user, call_id).await?;
        if call.leave(user, Utc::now()) {
            self.save(&call).await?;
        }
        Ok(call)
    }

    pub async fn active(&self, user: Uuid) -> BackendResult<Vec<CallRecord>> {
        Ok(self.calls.active_for(user).await?)
    }

    async fn live_call(&self, user: Uuid, call_id: &str) -> BackendResult<CallRecord> {
        let call = self.get(user, call_id).await?;
        if call.status.is_terminal() {
            return Err(BackendError::validation("callId", "Call has ended"));
        }
        Ok(call)
    }

    async fn save(&self, call: &CallRecord) -> BackendResult<()> {
        if !self.calls.update(call).await? {
            return Err(BackendError::not_found("Call not found"));
        }
        Ok(())
    }

    /// The call itself already succeeded; a failed system message is logged only
    async fn announce(&self, call: &CallRecord, user: Uuid, content: String, message_type: MessageType) {
        let Some(parent) = call.message_parent() else {
            return;
        };
        if let Err(e) = self
            .messaging
            .post_system_message(parent, user, content, message_type)
            .await
        {
            tracing::warn!("[Calls] System message for {} failed: {}", call.call_id, e);
        }
    }
}
