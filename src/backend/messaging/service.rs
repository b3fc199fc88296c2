/**
 * Messaging Service
 *
 * Conversations and their messages. REST is the persisting path: every write
 * lands in the store first and only then is announced to the parent room.
 *
 * Access rules:
 * - conversation content is visible to participants only;
 * - channel content is visible to members only;
 * - only the sender may edit or delete a message.
 */

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::store::ConversationStore;
use crate::backend::channels::ChannelStore;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::notifications::NotificationService;
use crate::backend::realtime::{Room, RoomRegistry};
use crate::shared::event::{MessageDeletedEvent, MessageEditedEvent, ReactionEvent};
use crate::shared::messaging::message::validate_content;
use crate::shared::messaging::{
    Conversation, CreateConversationRequest, Message, MessageParent, MessageType, SendMessageRequest,
};
use crate::shared::{Pagination, ServerEvent};

#[derive(Clone)]
pub struct MessagingService {
    conversations: Arc<dyn ConversationStore>,
    channels: Arc<dyn ChannelStore>,
    notifications: NotificationService,
    rooms: RoomRegistry,
}

impl MessagingService {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        channels: Arc<dyn ChannelStore>,
        notifications: NotificationService,
        rooms: RoomRegistry,
    ) -> Self {
        Self {
            conversations,
            channels,
            notifications,
            rooms,
        }
    }

    pub async fn list_conversations(&self, user: Uuid) -> BackendResult<Vec<Conversation>> {
        Ok(self.conversations.list_for_user(user).await?)
    }

    /// Create a conversation, or return the active one with the same
    /// participants and type. The flag is `true` when a new one was made.
    pub async fn create_conversation(
        &self,
        user: Uuid,
        request: CreateConversationRequest,
    ) -> BackendResult<(Conversation, bool)> {
        let participants = request.participants_with(user)?;
        let kind = request.kind.unwrap_or_default();

        if let Some(existing) = self.conversations.find_active(&participants, kind).await? {
            return Ok((existing, false));
        }

        let title = request.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let conversation = Conversation::new(participants, kind, title);
        self.conversations.insert_conversation(&conversation).await?;

        tracing::info!(
            "[Messaging] Conversation {} created by {} ({} participants)",
            conversation.id,
            user,
            conversation.participants.len()
        );
        Ok((conversation, true))
    }

    /// Active conversation `id`, visible to participants only
    pub async fn conversation_for(&self, user: Uuid, id: Uuid) -> BackendResult<Conversation> {
        let conversation = self
            .conversations
            .conversation(id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| BackendError::not_found("Conversation not found"))?;

        if !conversation.has_participant(user) {
            return Err(BackendError::forbidden("Access denied to this conversation"));
        }
        Ok(conversation)
    }

    pub async fn delete_conversation(&self, user: Uuid, id: Uuid) -> BackendResult<()> {
        self.conversation_for(user, id).await?;
        self.conversations.deactivate(id).await?;
        tracing::info!("[Messaging] Conversation {} deleted by {}", id, user);
        Ok(())
    }

    pub async fn conversation_messages(
        &self,
        user: Uuid,
        id: Uuid,
        page: u32,
        limit: u32,
    ) -> BackendResult<(Vec<Message>, Pagination)> {
        self.conversation_for(user, id).await?;
        self.parent_messages(MessageParent::Conversation(id), page, limit).await
    }

    /// One page of a parent's live messages, newest first. No access check.
    pub async fn parent_messages(
        &self,
        parent: MessageParent,
        page: u32,
        limit: u32,
    ) -> BackendResult<(Vec<Message>, Pagination)> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let (messages, total) = tokio::try_join!(
            self.conversations.list_messages(parent, offset, limit),
            self.conversations.count_messages(parent),
        )?;
        Ok((messages, Pagination::new(page, limit, total)))
    }

    /// Persist a conversation message, announce it, and notify the other
    /// participants.
    pub async fn send_message(
        &self,
        user: Uuid,
        sender_name: &str,
        conversation_id: Uuid,
        request: SendMessageRequest,
    ) -> BackendResult<Message> {
        validate_content(&request.content)?;
        let conversation = self.conversation_for(user, conversation_id).await?;

        let mut message = Message::new(
            MessageParent::Conversation(conversation_id),
            user,
            request.content.trim().to_string(),
            request.message_type.unwrap_or_default(),
        );
        message.reply_to = request.reply_to;
        message.attachments = request.attachments;

        self.store_and_announce(&message).await?;

        for recipient in conversation.others(user) {
            if let Err(e) = self
                .notifications
                .create_message_notification(recipient, user, sender_name, &message.content, conversation_id)
                .await
            {
                tracing::warn!("[Messaging] Message notification for {} failed: {}", recipient, e);
            }
        }

        Ok(message)
    }

    /// Persist a server-authored message (calls use this) and announce it
    pub async fn post_system_message(
        &self,
        parent: MessageParent,
        sender: Uuid,
        content: String,
        message_type: MessageType,
    ) -> BackendResult<Message> {
        let message = Message::new(parent, sender, content, message_type);
        self.store_and_announce(&message).await?;
        Ok(message)
    }

    /// Insert then emit `new_message` to the parent room
    pub async fn store_and_announce(&self, message: &Message) -> BackendResult<()> {
        self.conversations.insert_message(message).await.map_err(|e| {
            tracing::error!("[Messaging] Failed to store message {}: {}", message.id, e);
            e
        })?;
        self.rooms
            .emit(Room::from(message.parent), ServerEvent::NewMessage, message);
        Ok(())
    }

    pub async fn edit_message(&self, user: Uuid, message_id: Uuid, content: &str) -> BackendResult<Message> {
        validate_content(content)?;
        self.own_message(user, message_id).await?;

        let message = self
            .conversations
            .edit_message(message_id, content.trim(), Utc::now())
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))?;

        self.rooms.emit(
            Room::from(message.parent),
            ServerEvent::MessageEdited,
            &MessageEditedEvent {
                message_id,
                content: message.content.clone(),
                edited_at: message.edited_at.unwrap_or_else(Utc::now),
            },
        );
        Ok(message)
    }

    pub async fn delete_message(&self, user: Uuid, message_id: Uuid) -> BackendResult<()> {
        self.own_message(user, message_id).await?;

        let message = self
            .conversations
            .delete_message(message_id, Utc::now())
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))?;

        self.rooms.emit(
            Room::from(message.parent),
            ServerEvent::MessageDeleted,
            &MessageDeletedEvent {
                message_id,
                deleted_at: message.deleted_at.unwrap_or_else(Utc::now),
            },
        );
        Ok(())
    }

    /// Toggle the caller's reaction. The flag is `true` when it was added.
    pub async fn toggle_reaction(
        &self,
        user: Uuid,
        message_id: Uuid,
        reaction_type: &str,
    ) -> BackendResult<(Message, bool)> {
        let reaction_type = reaction_type.trim();
        if reaction_type.is_empty() {
            return Err(BackendError::validation("reactionType", "Reaction type is required"));
        }

        let message = self.live_message(message_id).await?;
        if !self.can_access(user, message.parent).await? {
            return Err(BackendError::forbidden("Access denied to this message"));
        }

        let now = Utc::now();
        let (message, added) = self
            .conversations
            .toggle_reaction(message_id, user, reaction_type, now)
            .await?
            .ok_or_else(|| BackendError::not_found("Message not found"))?;

        self.rooms.emit(
            Room::from(message.parent),
            ServerEvent::MessageReaction,
            &ReactionEvent {
                message_id,
                reaction_type: reaction_type.to_string(),
                user_id: user,
                timestamp: now,
            },
        );
        Ok((message, added))
    }

    pub async fn mark_conversation_read(&self, user: Uuid, conversation_id: Uuid) -> BackendResult<u64> {
        self.conversation_for(user, conversation_id).await?;
        Ok(self.conversations.mark_read(conversation_id, user).await?)
    }

    pub async fn unread_count(&self, user: Uuid) -> BackendResult<u64> {
        Ok(self.conversations.unread_count(user).await?)
    }

    /// Whether `user` may see content of `parent`
    pub async fn can_access(&self, user: Uuid, parent: MessageParent) -> BackendResult<bool> {
        Ok(match parent {
            MessageParent::Conversation(id) => self
                .conversations
                .conversation(id)
                .await?
                .is_some_and(|c| c.is_active && c.has_participant(user)),
            MessageParent::Channel(id) => self
                .channels
                .channel(id)
                .await?
                .is_some_and(|c| !c.is_archived && c.is_member(user)),
        })
    }

    async fn live_message(&self, message_id: Uuid) -> BackendResult<Message> {
        self.conversations
            .message(message_id)
            .await?
            .filter(|m| !m.is_deleted)
            .ok_or_else(|| BackendError::not_found("Message not found"))
    }

    async fn own_message(&self, user: Uuid, message_id: Uuid) -> BackendResult<Message> {
        let message = self.live_message(message_id).await?;
        if message.sender != user {
            return Err(BackendError::forbidden("You can only modify your own messages"));
        }
        Ok(message)
    }
}
