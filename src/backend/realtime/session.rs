/**
 * Socket Session
 *
 * Handles the frames of one authenticated connection. Every client event is
 * relayed to a room; nothing here persists (REST is the persisting path).
 * Failures never produce an acknowledgement: the frame is logged and dropped.
 */

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::calls::CallError;
use super::hub::{RealtimeHub, REASON_DISCONNECTED};
use super::rooms::{ConnectionId, Room};
use crate::backend::messaging::MessagingService;
use crate::backend::middleware::AuthenticatedUser;
use crate::shared::event::{
    CallActionPayload, CallInitiatePayload, CallSignalEvent, ChannelRef, ClientEvent, ConversationRef,
    IncomingCallEvent, PresencePayload, PresenceUpdateEvent, ReactionEvent, ReactionPayload, ServerEvent,
    SocketFrame, TypingEvent, TypingPayload,
};
use crate::shared::messaging::MessageParent;

pub const STATUS_OFFLINE: &str = "offline";

pub struct SocketSession {
    conn: ConnectionId,
    user: AuthenticatedUser,
    name: String,
    hub: RealtimeHub,
    messaging: MessagingService,
}

impl SocketSession {
    pub fn new(
        conn: ConnectionId,
        user: AuthenticatedUser,
        name: String,
        hub: RealtimeHub,
        messaging: MessagingService,
    ) -> Self {
        Self {
            conn,
            user,
            name,
            hub,
            messaging,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// Parse and dispatch one text frame
    pub async fn handle_text(&self, text: &str) {
        match SocketFrame::parse(text) {
            Ok(frame) => self.handle_frame(frame).await,
            Err(e) => tracing::warn!("[Realtime] Unparseable frame from {}: {}", self.user.user_id, e),
        }
    }

    pub async fn handle_frame(&self, frame: SocketFrame) {
        let Some(event) = ClientEvent::from_str(&frame.event) else {
            tracing::warn!("[Realtime] Unknown event '{}' from {}", frame.event, self.user.user_id);
            return;
        };

        match event {
            ClientEvent::JoinConversation => {
                if let Some(r) = self.payload::<ConversationRef>(&frame) {
                    self.join(MessageParent::Conversation(r.conversation_id)).await;
                }
            }
            ClientEvent::LeaveConversation => {
                if let Some(r) = self.payload::<ConversationRef>(&frame) {
                    self.leave(Room::Conversation(r.conversation_id));
                }
            }
            ClientEvent::JoinChannel => {
                if let Some(r) = self.payload::<ChannelRef>(&frame) {
                    self.join(MessageParent::Channel(r.channel_id)).await;
                }
            }
            ClientEvent::LeaveChannel => {
                if let Some(r) = self.payload::<ChannelRef>(&frame) {
                    self.leave(Room::Channel(r.channel_id));
                }
            }
            ClientEvent::SendMessage => self.relay_message(frame),
            ClientEvent::TypingStart => self.typing(&frame, ServerEvent::UserTyping),
            ClientEvent::TypingStop => self.typing(&frame, ServerEvent::UserStoppedTyping),
            ClientEvent::AddReaction => self.reaction(&frame),
            ClientEvent::CallInitiate => self.call_initiate(&frame),
            ClientEvent::CallAnswer | ClientEvent::CallReject | ClientEvent::CallEnd => self.call_action(event, &frame),
            ClientEvent::UpdatePresence => {
                if let Some(p) = self.payload::<PresencePayload>(&frame) {
                    self.broadcast_presence(&p.status);
                }
            }
        }
    }

    /// Leave every room; on the user's last connection go offline and end their calls
    pub fn disconnect(&self) {
        let Some(departure) = self.hub.rooms().unregister(self.conn) else {
            return;
        };
        if departure.remaining == 0 {
            self.broadcast_presence(STATUS_OFFLINE);
            self.hub.end_calls_for(departure.user_id, REASON_DISCONNECTED);
        }
    }

    fn payload<T: DeserializeOwned>(&self, frame: &SocketFrame) -> Option<T> {
        match frame.payload() {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("[Realtime] Malformed {} payload from {}: {}", frame.event, self.user.user_id, e);
                None
            }
        }
    }

    async fn join(&self, parent: MessageParent) {
        let room = Room::from(parent);
        match self.messaging.can_access(self.user.user_id, parent).await {
            Ok(true) => {
                self.hub.rooms().join(self.conn, room);
                tracing::debug!("[Realtime] {} joined {}", self.user.user_id, room);
            }
            Ok(false) => tracing::warn!("[Realtime] {} may not join {}", self.user.user_id, room),
            Err(e) => tracing::error!("[Realtime] Access check for {} failed: {}", room, e),
        }
    }

    fn leave(&self, room: Room) {
        if self.hub.rooms().leave(self.conn, room) {
            tracing::debug!("[Realtime] {} left {}", self.user.user_id, room);
        }
    }

    fn in_room(&self, room: Room) -> bool {
        if self.hub.rooms().is_member(self.conn, room) {
            return true;
        }
        tracing::warn!("[Realtime] {} is not in {}; frame dropped", self.user.user_id, room);
        false
    }

    fn relay_message(&self, frame: SocketFrame) {
        let Some(target) = self.payload::<ConversationRef>(&frame) else {
            return;
        };
        let room = Room::Conversation(target.conversation_id);
        if !self.in_room(room) {
            return;
        }

        let mut data = match frame.data {
            Value::Object(map) => map,
            _ => return,
        };
        data.insert("sender".into(), Value::String(self.user.user_id.to_string()));
        data.insert("senderName".into(), Value::String(self.name.clone()));
        data.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));

        self.hub.rooms().emit(room, ServerEvent::NewMessage, &data);
    }

    fn typing(&self, frame: &SocketFrame, event: ServerEvent) {
        let Some(target) = self.payload::<TypingPayload>(frame) else {
            return;
        };
        let room = match (target.channel_id, target.conversation_id) {
            (Some(channel), _) => Room::Channel(channel),
            (None, Some(conversation)) => Room::Conversation(conversation),
            (None, None) => {
                tracing::warn!("[Realtime] {} without a target from {}", frame.event, self.user.user_id);
                return;
            }
        };
        if !self.in_room(room) {
            return;
        }

        let typing = TypingEvent {
            user_id: self.user.user_id,
            username: self.name.clone(),
            conversation_id: target.conversation_id,
            channel_id: target.channel_id,
        };
        self.hub.rooms().emit_except(room, self.conn, event, &typing);
    }

    fn reaction(&self, frame: &SocketFrame) {
        let Some(payload) = self.payload::<ReactionPayload>(frame) else {
            return;
        };
        let reaction = ReactionEvent {
            message_id: payload.message_id,
            reaction_type: payload.reaction_type,
            user_id: self.user.user_id,
            timestamp: Utc::now(),
        };
        let room = payload
            .channel_id
            .map(Room::Channel)
            .or(payload.conversation_id.map(Room::Conversation));
        match room {
            Some(room) => self.hub.rooms().emit(room, ServerEvent::MessageReaction, &reaction),
            None => self.hub.rooms().broadcast(ServerEvent::MessageReaction, &reaction),
        };
    }

    fn call_initiate(&self, frame: &SocketFrame) {
        let Some(payload) = self.payload::<CallInitiatePayload>(frame) else {
            return;
        };
        if payload.target_user_id == self.user.user_id {
            tracing::warn!("[Calls] {} tried to call themselves", self.user.user_id);
            return;
        }

        let call = self.hub.calls().initiate(
            self.user.user_id,
            payload.target_user_id,
            payload.conversation_id,
            payload.call_type,
            Utc::now(),
        );
        let incoming = IncomingCallEvent {
            caller_id: self.user.user_id,
            caller_name: self.name.clone(),
            conversation_id: call.conversation_id,
            call_type: call.call_type,
            call_id: call.call_id,
        };
        if self.hub.rooms().emit(Room::User(payload.target_user_id), ServerEvent::IncomingCall, &incoming) == 0 {
            tracing::debug!("[Calls] {} is offline; call rings until timeout", payload.target_user_id);
        }
    }

    fn call_action(&self, event: ClientEvent, frame: &SocketFrame) {
        let Some(payload) = self.payload::<CallActionPayload>(frame) else {
            return;
        };
        let calls = self.hub.calls();
        let user = self.user.user_id;
        let (result, outgoing) = match event {
            ClientEvent::CallAnswer => (calls.answer(&payload.call_id, user), ServerEvent::CallAnswered),
            ClientEvent::CallReject => (calls.reject(&payload.call_id, user), ServerEvent::CallRejected),
            _ => (calls.end(&payload.call_id, user), ServerEvent::CallEnded),
        };

        match result {
            Ok(peer) => {
                let signal = CallSignalEvent {
                    call_id: payload.call_id,
                    user_id: user,
                    reason: None,
                };
                self.hub.rooms().emit(Room::User(peer), outgoing, &signal);
            }
            Err(CallError::UnknownCall(call_id)) => {
                tracing::warn!("[Calls] {} for unknown call {} from {}", event.as_str(), call_id, user)
            }
            Err(e) => tracing::warn!("[Calls] {} from {} rejected: {}", event.as_str(), user, e),
        }
    }

    fn broadcast_presence(&self, status: &str) {
        let update = PresenceUpdateEvent {
            user_id: self.user.user_id,
            status: status.to_string(),
            timestamp: Utc::now(),
        };
        self.hub.rooms().broadcast(ServerEvent::PresenceUpdate, &update);
    }
}
