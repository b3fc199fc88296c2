//! Chat Message Data Structure
//!
//! A message belongs to exactly one parent: a conversation or a channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Maximum message content length in characters
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    System,
    JobContext,
    CommunityContext,
    CallStart,
    CallEnd,
    ScreenShare,
}

impl MessageType {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::System => "system",
            MessageType::JobContext => "job_context",
            MessageType::CommunityContext => "community_context",
            MessageType::CallStart => "call_start",
            MessageType::CallEnd => "call_end",
            MessageType::ScreenShare => "screen_share",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "image" => Some(MessageType::Image),
            "file" => Some(MessageType::File),
            "system" => Some(MessageType::System),
            "job_context" => Some(MessageType::JobContext),
            "community_context" => Some(MessageType::CommunityContext),
            "call_start" => Some(MessageType::CallStart),
            "call_end" => Some(MessageType::CallEnd),
            "screen_share" => Some(MessageType::ScreenShare),
            _ => None,
        }
    }
}

/// Owner of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageParent {
    #[serde(rename = "conversationId")]
    Conversation(Uuid),
    #[serde(rename = "channelId")]
    Channel(Uuid),
}

impl MessageParent {
    pub fn id(&self) -> Uuid {
        match self {
            MessageParent::Conversation(id) | MessageParent::Channel(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: Uuid,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    #[serde(flatten)]
    pub parent: MessageParent,
    pub sender: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to: Option<Uuid>,
    pub reactions: Vec<Reaction>,
    pub attachments: Vec<Attachment>,
    pub read_by: Vec<Uuid>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A new message, already read by its sender
    pub fn new(parent: MessageParent, sender: Uuid, content: String, message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent,
            sender,
            content,
            message_type,
            reply_to: None,
            reactions: Vec::new(),
            attachments: Vec::new(),
            read_by: vec![sender],
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Add or remove `user`'s `reaction_type`.
    ///
    /// Returns `true` when the reaction was added.
    pub fn toggle_reaction(&mut self, user: Uuid, reaction_type: &str, now: DateTime<Utc>) -> bool {
        let existing = self
            .reactions
            .iter()
            .position(|r| r.user_id == user && r.reaction_type == reaction_type);
        match existing {
            Some(index) => {
                self.reactions.remove(index);
                false
            }
            None => {
                self.reactions.push(Reaction {
                    user_id: user,
                    reaction_type: reaction_type.to_string(),
                    created_at: now,
                });
                true
            }
        }
    }

    pub fn is_read_by(&self, user: Uuid) -> bool {
        self.read_by.contains(&user)
    }
}

/// Validate message content length
pub fn validate_content(content: &str) -> Result<(), SharedError> {
    let count = content.trim().chars().count();
    if count == 0 {
        return Err(SharedError::validation("content", "Message content is required"));
    }
    if count > MAX_CONTENT_CHARS {
        return Err(SharedError::validation(
            "content",
            format!("Message content cannot exceed {} characters", MAX_CONTENT_CHARS),
        ));
    }
    Ok(())
}

/// Request body for sending a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub message_type: Option<MessageType>,
    #[serde(default)]
    pub reply_to: Option<Uuid>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_read_by_sender() {
        let sender = Uuid::new_v4();
        let msg = Message::new(
            MessageParent::Conversation(Uuid::new_v4()),
            sender,
            "hi".to_string(),
            MessageType::Text,
        );
        assert!(msg.is_read_by(sender));
        assert!(!msg.is_edited);
    }

    #[test]
    fn test_toggle_reaction() {
        let user = Uuid::new_v4();
        let mut msg = Message::new(
            MessageParent::Channel(Uuid::new_v4()),
            Uuid::new_v4(),
            "hi".to_string(),
            MessageType::Text,
        );
        let now = Utc::now();
        assert!(msg.toggle_reaction(user, "like", now));
        assert!(msg.toggle_reaction(user, "love", now));
        assert_eq!(msg.reactions.len(), 2);
        assert!(!msg.toggle_reaction(user, "like", now));
        assert_eq!(msg.reactions.len(), 1);
        assert_eq!(msg.reactions[0].reaction_type, "love");
    }

    #[test]
    fn test_parent_flattens_to_id_field() {
        let conversation_id = Uuid::new_v4();
        let msg = Message::new(
            MessageParent::Conversation(conversation_id),
            Uuid::new_v4(),
            "hi".to_string(),
            MessageType::Text,
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["conversationId"], conversation_id.to_string());
        assert!(value.get("channelId").is_none());

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back.parent, MessageParent::Conversation(conversation_id));
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content("hello").is_ok());
        assert!(validate_content("  ").is_err());
        assert!(validate_content(&"a".repeat(2000)).is_ok());
        assert!(validate_content(&"a".repeat(2001)).is_err());
    }
}
