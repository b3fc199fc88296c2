//! Database operations for call records

use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use super::store::{CallStore, HistoryFilter};
use crate::backend::error::StoreError;
use crate::shared::messaging::{CallParticipant, CallRecord, CallStatus, CallType};

const COLUMNS: &str = "call_id, room_name, jitsi_url, call_type, initiator, participants, conversation_id, \
     channel_id, status, started_at, ended_at, duration_secs, created_at";

/// Rows where `$1` (the user) is the initiator or a participant
const PARTICIPANT_CLAUSE: &str =
    "(initiator = $1 OR participants @> jsonb_build_array(jsonb_build_object('userId', $1::text)))";

pub struct PgCallStore {
    pool: PgPool,
}

impl PgCallStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn call_from_row(row: &PgRow) -> Result<CallRecord, StoreError> {
    let call_type: &str = row.get("call_type");
    let status: &str = row.get("status");
    Ok(CallRecord {
        call_id: row.get("call_id"),
        room_name: row.get("room_name"),
        jitsi_url: row.get("jitsi_url"),
        call_type: CallType::from_str(call_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown call type '{}'", call_type)))?,
        initiator: row.get("initiator"),
        participants: row.get::<Json<Vec<CallParticipant>>, _>("participants").0,
        conversation_id: row.get("conversation_id"),
        channel_id: row.get("channel_id"),
        status: CallStatus::from_str(status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown call status '{}'", status)))?,
        started_at: row.get("started_at"),
        ended_at: row.get("ended_at"),
        duration_secs: row.get("duration_secs"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl CallStore for PgCallStore {
    async fn insert(&self, c: &CallRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO calls (call_id, room_name, jitsi_url, call_type, initiator, participants, conversation_id,
                               channel_id, status, started_at, ended_at, duration_secs, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&c.call_id)
        .bind(&c.room_name)
        .bind(&c.jitsi_url)
        .bind(c.call_type.as_str())
        .bind(c.initiator)
        .bind(Json(&c.participants))
        .bind(c.conversation_id)
        .bind(c.channel_id)
        .bind(c.status.as_str())
        .bind(c.started_at)
        .bind(c.ended_at)
        .bind(c.duration_secs)
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM calls WHERE call_id = $1", COLUMNS))
            .bind(call_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(call_from_row).transpose()
    }

    async fn update(&self, c: &CallRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE calls
            SET participants = $2, status = $3, started_at = $4, ended_at = $5, duration_secs = $6
            WHERE call_id = $1
            "#,
        )
        .bind(&c.call_id)
        .bind(Json(&c.participants))
        .bind(c.status.as_str())
        .bind(c.started_at)
        .bind(c.ended_at)
        .bind(c.duration_secs)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn history(&self, user: Uuid, filter: HistoryFilter, offset: u64, limit: u32) -> Result<Vec<CallRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM calls
            WHERE {}
              AND ($2::text IS NULL OR call_type = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, call_id DESC
            OFFSET $4 LIMIT $5
            "#,
            COLUMNS, PARTICIPANT_CLAUSE
        ))
        .bind(user)
        .bind(filter.call_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(call_from_row).collect()
    }

    async fn count_history(&self, user: Uuid, filter: HistoryFilter) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM calls
            WHERE {}
              AND ($2::text IS NULL OR call_type = $2)
              AND ($3::text IS NULL OR status = $3)
            "#,
            PARTICIPANT_CLAUSE
        ))
        .bind(user)
        .bind(filter.call_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn active_for(&self, user: Uuid) -> Result<Vec<CallRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM calls
            WHERE {} AND status IN ('ringing', 'active')
            ORDER BY created_at DESC
            "#,
            COLUMNS, PARTICIPANT_CLAUSE
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(call_from_row).collect()
    }
}
