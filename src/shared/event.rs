/**
 * Socket Event Contract
 *
 * Every socket frame is a JSON object `{"event": <name>, "data": <payload>}`.
 * Event names are fixed strings shared by the gateway and the client wrapper;
 * payloads are camelCase JSON objects. There is no schema versioning: an
 * unknown event name or a payload that fails to parse is logged and dropped
 * by whichever side receives it.
 *
 * # Client → Server
 *
 * `join_conversation`, `leave_conversation`, `join_channel`, `leave_channel`,
 * `send_message`, `typing_start`, `typing_stop`, `add_reaction`,
 * `call_initiate`, `call_answer`, `call_reject`, `call_end`, `update_presence`
 *
 * # Server → Client
 *
 * `new_message`, `user_typing`, `user_stopped_typing`, `message_reaction`,
 * `message_edited`, `message_deleted`, `new_notification`, `incoming_call`,
 * `call_answered`, `call_rejected`, `call_ended`, `presence_update`
 */
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::messaging::CallType;
use crate::shared::notification::{Notification, NotificationType, Priority, SenderProfile};

/// A single frame on the socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SocketFrame {
    /// Build a frame from any serializable payload
    pub fn new(event: impl Into<String>, data: &impl Serialize) -> Result<Self, SharedError> {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn from_value(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn parse(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_text(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the payload into a typed struct
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, SharedError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Events a client may send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    JoinConversation,
    LeaveConversation,
    JoinChannel,
    LeaveChannel,
    SendMessage,
    TypingStart,
    TypingStop,
    AddReaction,
    CallInitiate,
    CallAnswer,
    CallReject,
    CallEnd,
    UpdatePresence,
}

impl ClientEvent {
    pub const ALL: [ClientEvent; 13] = [
        ClientEvent::JoinConversation,
        ClientEvent::LeaveConversation,
        ClientEvent::JoinChannel,
        ClientEvent::LeaveChannel,
        ClientEvent::SendMessage,
        ClientEvent::TypingStart,
        ClientEvent::TypingStop,
        ClientEvent::AddReaction,
        ClientEvent::CallInitiate,
        ClientEvent::CallAnswer,
        ClientEvent::CallReject,
        ClientEvent::CallEnd,
        ClientEvent::UpdatePresence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientEvent::JoinConversation => "join_conversation",
            ClientEvent::LeaveConversation => "leave_conversation",
            ClientEvent::JoinChannel => "join_channel",
            ClientEvent::LeaveChannel => "leave_channel",
            ClientEvent::SendMessage => "send_message",
            ClientEvent::TypingStart => "typing_start",
            ClientEvent::TypingStop => "typing_stop",
            ClientEvent::AddReaction => "add_reaction",
            ClientEvent::CallInitiate => "call_initiate",
            ClientEvent::CallAnswer => "call_answer",
            ClientEvent::CallReject => "call_reject",
            ClientEvent::CallEnd => "call_end",
            ClientEvent::UpdatePresence => "update_presence",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|event| event.as_str() == s)
    }
}

/// Events the server emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEvent {
    NewMessage,
    UserTyping,
    UserStoppedTyping,
    MessageReaction,
    MessageEdited,
    MessageDeleted,
    NewNotification,
    IncomingCall,
    CallAnswered,
    CallRejected,
    CallEnded,
    PresenceUpdate,
}

impl ServerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage => "new_message",
            ServerEvent::UserTyping => "user_typing",
            ServerEvent::UserStoppedTyping => "user_stopped_typing",
            ServerEvent::MessageReaction => "message_reaction",
            ServerEvent::MessageEdited => "message_edited",
            ServerEvent::MessageDeleted => "message_deleted",
            ServerEvent::NewNotification => "new_notification",
            ServerEvent::IncomingCall => "incoming_call",
            ServerEvent::CallAnswered => "call_answered",
            ServerEvent::CallRejected => "call_rejected",
            ServerEvent::CallEnded => "call_ended",
            ServerEvent::PresenceUpdate => "presence_update",
        }
    }
}

// Client → server payloads

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRef {
    pub conversation_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub channel_id: Uuid,
}

/// Typing indicator target. `channel_id` wins over `conversation_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub message_id: Uuid,
    pub reaction_type: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallInitiatePayload {
    pub target_user_id: Uuid,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub call_type: CallType,
}

/// Payload of `call_answer`, `call_reject` and `call_end`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallActionPayload {
    pub call_id: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresencePayload {
    pub status: String,
}

// Server → client payloads

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub user_id: Uuid,
    pub username: String,
    pub conversation_id: Option<Uuid>,
    pub channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub message_id: Uuid,
    pub reaction_type: String,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageEditedEvent {
    pub message_id: Uuid,
    pub content: String,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedEvent {
    pub message_id: Uuid,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCallEvent {
    pub caller_id: Uuid,
    pub caller_name: String,
    pub conversation_id: Option<Uuid>,
    pub call_type: CallType,
    pub call_id: String,
}

/// Payload of `call_answered`, `call_rejected` and `call_ended`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallSignalEvent {
    pub call_id: String,
    pub user_id: Uuid,
    /// Set on server-generated terminations ("disconnected", "timeout")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdateEvent {
    pub user_id: Uuid,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `new_notification`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPush {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: Priority,
    pub sender: Option<SenderProfile>,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationPush {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            data: notification.data.clone(),
            priority: notification.priority,
            sender: notification.sender_profile.clone(),
            created_at: notification.created_at,
        }
    }
}
