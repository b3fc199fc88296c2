//! Database operations for channels
//!
//! Members and settings are stored as JSONB on the channel row; membership
//! queries use JSONB containment on `members`.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use super::store::ChannelStore;
use crate::backend::error::StoreError;
use crate::shared::messaging::{Channel, ChannelMember, ChannelSettings, ChannelType};

const COLUMNS: &str = "id, name, description, topic, kind, created_by, members, settings, is_archived, created_at";

pub struct PgChannelStore {
    pool: PgPool,
}

impl PgChannelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn channel_from_row(row: &PgRow) -> Result<Channel, StoreError> {
    let kind: &str = row.get("kind");
    Ok(Channel {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        topic: row.get("topic"),
        kind: ChannelType::from_str(kind)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown channel type '{}'", kind)))?,
        created_by: row.get("created_by"),
        members: row.get::<Json<Vec<ChannelMember>>, _>("members").0,
        settings: row.get::<Json<ChannelSettings>, _>("settings").0,
        is_archived: row.get("is_archived"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl ChannelStore for PgChannelStore {
    async fn insert(&self, c: &Channel) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO channels (id, name, description, topic, kind, created_by, members, settings, is_archived, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(&c.topic)
        .bind(c.kind.as_str())
        .bind(c.created_by)
        .bind(Json(&c.members))
        .bind(Json(&c.settings))
        .bind(c.is_archived)
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn channel(&self, id: Uuid) -> Result<Option<Channel>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM channels WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(channel_from_row).transpose()
    }

    async fn by_name(&self, name: &str) -> Result<Option<Channel>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM channels WHERE name = $1", COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(channel_from_row).transpose()
    }

    async fn list_for_member(&self, user: Uuid, kind: Option<ChannelType>) -> Result<Vec<Channel>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM channels
            WHERE members @> jsonb_build_array(jsonb_build_object('userId', $1::text))
              AND is_archived = FALSE
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            "#,
            COLUMNS
        ))
        .bind(user)
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(channel_from_row).collect()
    }

    async fn update(&self, c: &Channel) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE channels
            SET name = $2, description = $3, topic = $4, kind = $5, members = $6, settings = $7, is_archived = $8
            WHERE id = $1
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(&c.topic)
        .bind(c.kind.as_str())
        .bind(Json(&c.members))
        .bind(Json(&c.settings))
        .bind(c.is_archived)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
