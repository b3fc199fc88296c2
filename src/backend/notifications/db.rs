//! Database operations for notifications
//!
//! Postgres implementation of `NotificationStore`. See
//! `migrations/0001_comms_schema.sql` for the table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::store::{Counts, ListQuery, NotificationStore};
use crate::backend::error::StoreError;
use crate::shared::{Notification, NotificationType, Priority};

const COLUMNS: &str =
    "id, recipient, sender, kind, title, message, data, priority, is_read, read_at, expires_at, created_at, updated_at";

pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_kind(value: &str) -> Result<NotificationType, StoreError> {
    NotificationType::from_str(value)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown notification type '{}'", value)))
}

fn parse_priority(value: &str) -> Result<Priority, StoreError> {
    Priority::from_str(value).ok_or_else(|| StoreError::Corrupt(format!("unknown priority '{}'", value)))
}

fn notification_from_row(row: &PgRow) -> Result<Notification, StoreError> {
    Ok(Notification {
        id: row.get("id"),
        recipient: row.get("recipient"),
        sender: row.get("sender"),
        sender_profile: None,
        kind: parse_kind(row.get::<&str, _>("kind"))?,
        title: row.get("title"),
        message: row.get("message"),
        data: row.get("data"),
        priority: parse_priority(row.get::<&str, _>("priority"))?,
        is_read: row.get("is_read"),
        read_at: row.get("read_at"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, n: &Notification) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient, sender, kind, title, message, data, priority, is_read, read_at, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(n.id)
        .bind(n.recipient)
        .bind(n.sender)
        .bind(n.kind.as_str())
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.data)
        .bind(n.priority.as_str())
        .bind(n.is_read)
        .bind(n.read_at)
        .bind(n.expires_at)
        .bind(n.created_at)
        .bind(n.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid, recipient: Uuid) -> Result<Option<Notification>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE id = $1 AND recipient = $2",
            COLUMNS
        ))
        .bind(id)
        .bind(recipient)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(notification_from_row).transpose()
    }

    async fn mark_read(&self, id: Uuid, recipient: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        // Matches the row even when already read so ownership is still reported;
        // read_at and updated_at only move on the first transition.
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE,
                read_at = COALESCE(read_at, $3),
                updated_at = CASE WHEN is_read THEN updated_at ELSE $3 END
            WHERE id = $1 AND recipient = $2
            "#,
        )
        .bind(id)
        .bind(recipient)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $2, updated_at = $2
            WHERE recipient = $1 AND is_read = FALSE
            "#,
        )
        .bind(recipient)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list(&self, recipient: Uuid, query: ListQuery) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE recipient = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC, id DESC
            OFFSET $3 LIMIT $4
            "#,
            COLUMNS
        ))
        .bind(recipient)
        .bind(query.unread_only)
        .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
        .bind(i64::from(query.limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn counts(&self, recipient: Uuid) -> Result<Counts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_read = FALSE) AS unread
            FROM notifications
            WHERE recipient = $1
            "#,
        )
        .bind(recipient)
        .fetch_one(&self.pool)
        .await?;

        Ok(Counts {
            total: row.get::<i64, _>("total").max(0) as u64,
            unread: row.get::<i64, _>("unread").max(0) as u64,
        })
    }

    async fn count_by_type(&self, recipient: Uuid) -> Result<BTreeMap<NotificationType, u64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT kind, COUNT(*) AS count
            FROM notifications
            WHERE recipient = $1
            GROUP BY kind
            "#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let kind = parse_kind(row.get::<&str, _>("kind"))?;
                Ok((kind, row.get::<i64, _>("count").max(0) as u64))
            })
            .collect()
    }

    async fn count_by_priority(&self, recipient: Uuid) -> Result<BTreeMap<Priority, u64>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT priority, COUNT(*) AS count
            FROM notifications
            WHERE recipient = $1
            GROUP BY priority
            "#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let priority = parse_priority(row.get::<&str, _>("priority"))?;
                Ok((priority, row.get::<i64, _>("count").max(0) as u64))
            })
            .collect()
    }

    async fn delete(&self, id: Uuid, recipient: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient = $2")
            .bind(id)
            .bind(recipient)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, recipient: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient = $1")
            .bind(recipient)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
