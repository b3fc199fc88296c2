/**
 * User Directory
 *
 * Read-only lookup of user display fields. Accounts are owned by another
 * service; this server only needs names and photos to populate notification
 * senders and socket payloads.
 */

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::error::StoreError;
use crate::backend::middleware::AuthenticatedUser;
use crate::shared::SenderProfile;

/// Display fields for a user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub profile_photo: Option<String>,
}

impl From<UserProfile> for SenderProfile {
    fn from(user: UserProfile) -> Self {
        SenderProfile {
            id: user.id,
            full_name: user.full_name,
            profile_photo: user.profile_photo,
        }
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError>;
}

/// Name shown to other users for `user`.
///
/// Prefers the username carried in the token, then the directory's full name,
/// then the email.
pub async fn display_name(directory: &dyn UserDirectory, user: &AuthenticatedUser) -> String {
    if let Some(name) = user.username.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.to_string();
    }
    match directory.profile(user.user_id).await {
        Ok(Some(profile)) if !profile.full_name.trim().is_empty() => profile.full_name,
        Ok(_) => user.fallback_name(),
        Err(e) => {
            tracing::warn!("Display name lookup failed for {}: {}", user.user_id, e);
            user.fallback_name()
        }
    }
}

/// In-memory directory used when no database is configured
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Mutex<HashMap<Uuid, UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) -> Result<(), StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(profile.id, profile);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let users = self.users.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(&user_id).cloned())
    }
}

/// Directory backed by the `users` table
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, full_name, profile_photo
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
