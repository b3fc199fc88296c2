//! Conversation and message persistence
//!
//! Messages of both conversations and channels live behind one store so that
//! edits, deletes and reactions work the same way regardless of parent.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::shared::messaging::{Conversation, ConversationType, Message, MessageParent};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError>;

    async fn conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Active conversation with exactly this (sorted) participant set and type
    async fn find_active(
        &self,
        participants: &[Uuid],
        kind: ConversationType,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Active conversations of `user`, most recent activity first
    async fn list_for_user(&self, user: Uuid) -> Result<Vec<Conversation>, StoreError>;

    /// Soft delete. Returns `false` if the conversation does not exist.
    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Insert a message. For a conversation parent the conversation's
    /// last-message fields and count move in the same transaction.
    async fn insert_message(&self, message: &Message) -> Result<(), StoreError>;

    async fn message(&self, id: Uuid) -> Result<Option<Message>, StoreError>;

    /// Non-deleted messages of `parent`, newest first
    async fn list_messages(&self, parent: MessageParent, offset: u64, limit: u32) -> Result<Vec<Message>, StoreError>;

    async fn count_messages(&self, parent: MessageParent) -> Result<u64, StoreError>;

    /// Replace the content of a live message
    async fn edit_message(&self, id: Uuid, content: &str, now: DateTime<Utc>) -> Result<Option<Message>, StoreError>;

    /// Soft delete a live message
    async fn delete_message(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Message>, StoreError>;

    /// Add or remove one reaction. The flag is `true` when it was added.
    async fn toggle_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Message, bool)>, StoreError>;

    /// Mark every message in the conversation not sent by `user` as read by
    /// `user`. Returns how many changed.
    async fn mark_read(&self, conversation: Uuid, user: Uuid) -> Result<u64, StoreError>;

    /// Unread messages across the user's active conversations
    async fn unread_count(&self, user: Uuid) -> Result<u64, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Message>,
}

#[derive(Default)]
pub struct MemoryConversationStore {
    state: Mutex<MemoryState>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn is_unread_for(message: &Message, user: Uuid) -> bool {
    !message.is_deleted && message.sender != user && !message.is_read_by(user)
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.lock()?
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.lock()?.conversations.get(&id).cloned())
    }

    async fn find_active(
        &self,
        participants: &[Uuid],
        kind: ConversationType,
    ) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .lock()?
            .conversations
            .values()
            .find(|c| c.is_active && c.kind == kind && c.participants == participants)
            .cloned())
    }

    async fn list_for_user(&self, user: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let state = self.lock()?;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.is_active && c.has_participant(user))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(conversations)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        match state.conversations.get_mut(&id) {
            Some(conversation) => {
                conversation.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_message(&self, message: &Message) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let MessageParent::Conversation(id) = message.parent {
            let conversation = state
                .conversations
                .get_mut(&id)
                .ok_or_else(|| StoreError::Corrupt(format!("conversation {} missing", id)))?;
            conversation.last_message = Some(message.id);
            conversation.last_message_at = Some(message.created_at);
            conversation.message_count += 1;
        }
        state.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn message(&self, id: Uuid) -> Result<Option<Message>, StoreError> {
        Ok(self.lock()?.messages.get(&id).cloned())
    }

    async fn list_messages(&self, parent: MessageParent, offset: u64, limit: u32) -> Result<Vec<Message>, StoreError> {
        let state = self.lock()?;
        let mut messages: Vec<&Message> = state
            .messages
            .values()
            .filter(|m| m.parent == parent && !m.is_deleted)
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_messages(&self, parent: MessageParent) -> Result<u64, StoreError> {
        let state = self.lock()?;
        Ok(state
            .messages
            .values()
            .filter(|m| m.parent == parent && !m.is_deleted)
            .count() as u64)
    }

    async fn edit_message(&self, id: Uuid, content: &str, now: DateTime<Utc>) -> Result<Option<Message>, StoreError> {
        let mut state = self.lock()?;
        Ok(state.messages.get_mut(&id).filter(|m| !m.is_deleted).map(|m| {
            m.content = content.to_string();
            m.is_edited = true;
            m.edited_at = Some(now);
            m.clone()
        }))
    }

    async fn delete_message(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Message>, StoreError> {
        let mut state = self.lock()?;
        Ok(state.messages.get_mut(&id).filter(|m| !m.is_deleted).map(|m| {
            m.is_deleted = true;
            m.deleted_at = Some(now);
            m.clone()
        }))
    }

    async fn toggle_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Message, bool)>, StoreError> {
        let mut state = self.lock()?;
        Ok(state.messages.get_mut(&id).filter(|m| !m.is_deleted).map(|m| {
            let added = m.toggle_reaction(user, reaction_type, now);
            (m.clone(), added)
        }))
    }

    async fn mark_read(&self, conversation: Uuid, user: Uuid) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let mut changed = 0;
        for message in state
            .messages
            .values_mut()
            .filter(|m| m.parent == MessageParent::Conversation(conversation))
        {
            if is_unread_for(message, user) {
                message.read_by.push(user);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn unread_count(&self, user: Uuid) -> Result<u64, StoreError> {
        let state = self.lock()?;
        let count = state
            .messages
            .values()
            .filter(|m| match m.parent {
                MessageParent::Conversation(id) => state
                    .conversations
                    .get(&id)
                    .is_some_and(|c| c.is_active && c.has_participant(user)),
                MessageParent::Channel(_) => false,
            })
            .filter(|m| is_unread_for(m, user))
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::messaging::MessageType;

    async fn seeded() -> (MemoryConversationStore, Conversation, Uuid, Uuid) {
        let store = MemoryConversationStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conversation = Conversation::new(vec![a, b], ConversationType::Direct, None);
        store.insert_conversation(&conversation).await.unwrap();
        (store, conversation, a, b)
    }

    #[tokio::test]
    async fn test_insert_message_updates_conversation() {
        let (store, conversation, a, _b) = seeded().await;
        let message = Message::new(MessageParent::Conversation(conversation.id), a, "hi".into(), MessageType::Text);
        store.insert_message(&message).await.unwrap();

        let updated = store.conversation(conversation.id).await.unwrap().unwrap();
        assert_eq!(updated.last_message, Some(message.id));
        assert_eq!(updated.message_count, 1);
    }

    #[tokio::test]
    async fn test_insert_into_missing_conversation_fails() {
        let store = MemoryConversationStore::new();
        let message = Message::new(MessageParent::Conversation(Uuid::new_v4()), Uuid::new_v4(), "x".into(), MessageType::Text);
        assert!(store.insert_message(&message).await.is_err());
        assert!(store.message(message.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_tracking() {
        let (store, conversation, a, b) = seeded().await;
        for text in ["one", "two"] {
            let m = Message::new(MessageParent::Conversation(conversation.id), a, text.into(), MessageType::Text);
            store.insert_message(&m).await.unwrap();
        }

        assert_eq!(store.unread_count(b).await.unwrap(), 2);
        assert_eq!(store.unread_count(a).await.unwrap(), 0);
        assert_eq!(store.mark_read(conversation.id, b).await.unwrap(), 2);
        assert_eq!(store.mark_read(conversation.id, b).await.unwrap(), 0);
        assert_eq!(store.unread_count(b).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_messages_are_hidden() {
        let (store, conversation, a, _b) = seeded().await;
        let parent = MessageParent::Conversation(conversation.id);
        let m = Message::new(parent, a, "oops".into(), MessageType::Text);
        store.insert_message(&m).await.unwrap();

        assert!(store.delete_message(m.id, Utc::now()).await.unwrap().is_some());
        assert!(store.delete_message(m.id, Utc::now()).await.unwrap().is_none());
        assert!(store.edit_message(m.id, "fixed", Utc::now()).await.unwrap().is_none());
        assert_eq!(store.count_messages(parent).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_active_ignores_inactive() {
        let (store, conversation, _a, _b) = seeded().await;
        let found = store
            .find_active(&conversation.participants, ConversationType::Direct)
            .await
            .unwrap();
        assert_eq!(found.map(|c| c.id), Some(conversation.id));

        store.deactivate(conversation.id).await.unwrap();
        assert!(store
            .find_active(&conversation.participants, ConversationType::Direct)
            .await
            .unwrap()
            .is_none());
    }
}
