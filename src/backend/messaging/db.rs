//! Database operations for messaging
//!
//! Postgres implementation of `ConversationStore`. Participants and read
//! receipts are `UUID[]`; reactions and attachments are JSONB.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use super::store::ConversationStore;
use crate::backend::error::StoreError;
use crate::shared::messaging::{
    Attachment, Conversation, ConversationType, Message, MessageParent, MessageType, Reaction,
};

const CONVERSATION_COLUMNS: &str =
    "id, participants, kind, title, last_message, last_message_at, message_count, is_active, created_at";

const MESSAGE_COLUMNS: &str = "id, conversation_id, channel_id, sender, content, message_type, reply_to, \
     reactions, attachments, read_by, is_edited, edited_at, is_deleted, deleted_at, created_at";

pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, StoreError> {
    let kind: &str = row.get("kind");
    Ok(Conversation {
        id: row.get("id"),
        participants: row.get("participants"),
        kind: ConversationType::from_str(kind)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown conversation type '{}'", kind)))?,
        title: row.get("title"),
        last_message: row.get("last_message"),
        last_message_at: row.get("last_message_at"),
        message_count: row.get::<i64, _>("message_count").max(0) as u64,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let id: Uuid = row.get("id");
    let parent = match (
        row.get::<Option<Uuid>, _>("conversation_id"),
        row.get::<Option<Uuid>, _>("channel_id"),
    ) {
        (Some(conversation), None) => MessageParent::Conversation(conversation),
        (None, Some(channel)) => MessageParent::Channel(channel),
        _ => return Err(StoreError::Corrupt(format!("message {} has no single parent", id))),
    };
    let message_type: &str = row.get("message_type");

    Ok(Message {
        id,
        parent,
        sender: row.get("sender"),
        content: row.get("content"),
        message_type: MessageType::from_str(message_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown message type '{}'", message_type)))?,
        reply_to: row.get("reply_to"),
        reactions: row.get::<Json<Vec<Reaction>>, _>("reactions").0,
        attachments: row.get::<Json<Vec<Attachment>>, _>("attachments").0,
        read_by: row.get("read_by"),
        is_edited: row.get("is_edited"),
        edited_at: row.get("edited_at"),
        is_deleted: row.get("is_deleted"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
    })
}

fn parent_columns(parent: MessageParent) -> (Option<Uuid>, Option<Uuid>) {
    match parent {
        MessageParent::Conversation(id) => (Some(id), None),
        MessageParent::Channel(id) => (None, Some(id)),
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn insert_conversation(&self, c: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, participants, kind, title, last_message, last_message_at, message_count, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(c.id)
        .bind(&c.participants)
        .bind(c.kind.as_str())
        .bind(&c.title)
        .bind(c.last_message)
        .bind(c.last_message_at)
        .bind(i64::try_from(c.message_count).unwrap_or(i64::MAX))
        .bind(c.is_active)
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn conversation(&self, id: Uuid) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn find_active(
        &self,
        participants: &[Uuid],
        kind: ConversationType,
    ) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE participants = $1 AND kind = $2 AND is_active LIMIT 1",
            CONVERSATION_COLUMNS
        ))
        .bind(participants)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn list_for_user(&self, user: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM conversations
            WHERE $1 = ANY(participants) AND is_active
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(conversation_from_row).collect()
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE conversations SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_message(&self, m: &Message) -> Result<(), StoreError> {
        let (conversation_id, channel_id) = parent_columns(m.parent);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, channel_id, sender, content, message_type, reply_to,
                                  reactions, attachments, read_by, is_edited, edited_at, is_deleted, deleted_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(m.id)
        .bind(conversation_id)
        .bind(channel_id)
        .bind(m.sender)
        .bind(&m.content)
        .bind(m.message_type.as_str())
        .bind(m.reply_to)
        .bind(Json(&m.reactions))
        .bind(Json(&m.attachments))
        .bind(&m.read_by)
        .bind(m.is_edited)
        .bind(m.edited_at)
        .bind(m.is_deleted)
        .bind(m.deleted_at)
        .bind(m.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(conversation_id) = conversation_id {
            let updated = sqlx::query(
                r#"
                UPDATE conversations
                SET last_message = $2, last_message_at = $3, message_count = message_count + 1
                WHERE id = $1
                "#,
            )
            .bind(conversation_id)
            .bind(m.id)
            .bind(m.created_at)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(StoreError::Corrupt(format!("conversation {} missing", conversation_id)));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn message(&self, id: Uuid) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn list_messages(&self, parent: MessageParent, offset: u64, limit: u32) -> Result<Vec<Message>, StoreError> {
        let (conversation_id, channel_id) = parent_columns(parent);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE conversation_id IS NOT DISTINCT FROM $1
              AND channel_id IS NOT DISTINCT FROM $2
              AND is_deleted = FALSE
            ORDER BY created_at DESC, id DESC
            OFFSET $3 LIMIT $4
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .bind(channel_id)
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn count_messages(&self, parent: MessageParent) -> Result<u64, StoreError> {
        let (conversation_id, channel_id) = parent_columns(parent);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE conversation_id IS NOT DISTINCT FROM $1
              AND channel_id IS NOT DISTINCT FROM $2
              AND is_deleted = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn edit_message(&self, id: Uuid, content: &str, now: DateTime<Utc>) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE messages
            SET content = $2, is_edited = TRUE, edited_at = $3
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(content)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn delete_message(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE messages
            SET is_deleted = TRUE, deleted_at = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(message_from_row).transpose()
    }

    async fn toggle_reaction(
        &self,
        id: Uuid,
        user: Uuid,
        reaction_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Message, bool)>, StoreError> {
        // One statement: drop the (user, reaction) pair if present, else append it.
        let row = sqlx::query(&format!(
            r#"
            UPDATE messages
            SET reactions = CASE
                WHEN EXISTS (
                    SELECT 1 FROM jsonb_array_elements(reactions) r
                    WHERE r->>'userId' = $2 AND r->>'reactionType' = $3
                )
                THEN (
                    SELECT COALESCE(jsonb_agg(r), '[]'::jsonb)
                    FROM jsonb_array_elements(reactions) r
                    WHERE NOT (r->>'userId' = $2 AND r->>'reactionType' = $3)
                )
                ELSE reactions || jsonb_build_array(
                    jsonb_build_object('userId', $2, 'reactionType', $3, 'createdAt', $4)
                )
            END
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(user.to_string())
        .bind(reaction_type)
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let message = message_from_row(&row)?;
        let added = message
            .reactions
            .iter()
            .any(|r| r.user_id == user && r.reaction_type == reaction_type);
        Ok(Some((message, added)))
    }

    async fn mark_read(&self, conversation: Uuid, user: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_by = array_append(read_by, $2)
            WHERE conversation_id = $1
              AND sender <> $2
              AND is_deleted = FALSE
              AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(conversation)
        .bind(user)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user: Uuid) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE $1 = ANY(c.participants)
              AND c.is_active
              AND m.sender <> $1
              AND m.is_deleted = FALSE
              AND NOT ($1 = ANY(m.read_by))
            "#,
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}
