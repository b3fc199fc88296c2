/**
 * Notification Service
 *
 * Persists notifications and pushes a `new_notification` hint to the
 * recipient's private room. The stored record is authoritative; the push is
 * fire-and-forget and an offline recipient is not an error.
 *
 * One service is built at startup and shared through `AppState`.
 */

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::store::{ListQuery, NotificationStore};
use super::templates::{self, CommunityAction, JobDecision, PaymentDirection, VerificationOutcome};
use crate::backend::auth::UserDirectory;
use crate::backend::error::BackendResult;
use crate::backend::realtime::{Room, RoomRegistry};
use crate::shared::event::NotificationPush;
use crate::shared::{
    Notification, NotificationDraft, NotificationPage, NotificationStats, Priority, SenderProfile,
    ServerEvent,
};

/// Preview length used for message notifications
pub const MESSAGE_PREVIEW_CHARS: usize = 100;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    users: Arc<dyn UserDirectory>,
    rooms: RoomRegistry,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, users: Arc<dyn UserDirectory>, rooms: RoomRegistry) -> Self {
        Self { store, users, rooms }
    }

    /// Validate, persist and push one notification
    pub async fn create_notification(&self, draft: NotificationDraft) -> BackendResult<Notification> {
        draft.validate()?;

        let mut notification = Notification::from_draft(draft, Utc::now());
        self.store.insert(&notification).await.map_err(|e| {
            tracing::error!("[Notifications] Failed to store notification: {}", e);
            e
        })?;

        if let Some(sender) = notification.sender {
            notification.sender_profile = self.sender_profile(sender).await;
        }

        let delivered = self.rooms.emit(
            Room::User(notification.recipient),
            ServerEvent::NewNotification,
            &NotificationPush::from(&notification),
        );
        if delivered == 0 {
            tracing::debug!(
                "[Notifications] Recipient {} offline, {} stored only",
                notification.recipient,
                notification.id
            );
        }

        tracing::info!(
            "[Notifications] Created {} ({}) for {}",
            notification.id,
            notification.kind.as_str(),
            notification.recipient
        );
        Ok(notification)
    }

    /// Returns `false` when the notification does not exist for `user_id`
    pub async fn mark_as_read(&self, notification_id: Uuid, user_id: Uuid) -> BackendResult<bool> {
        Ok(self.store.mark_read(notification_id, user_id, Utc::now()).await?)
    }

    /// Returns how many notifications changed
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> BackendResult<u64> {
        let changed = self.store.mark_all_read(user_id, Utc::now()).await?;
        tracing::debug!("[Notifications] Marked {} read for {}", changed, user_id);
        Ok(changed)
    }

    /// One page of a user's notifications, newest first.
    ///
    /// `page` is 1-based. `unread_count` always covers every notification the
    /// user has, regardless of `unread_only`.
    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
        unread_only: bool,
    ) -> BackendResult<NotificationPage> {
        let page = page.max(1);
        let query = ListQuery {
            offset: u64::from(page - 1) * u64::from(limit),
            limit,
            unread_only,
        };

        let (mut notifications, counts) =
            tokio::try_join!(self.store.list(user_id, query), self.store.counts(user_id))?;

        let mut profiles: HashMap<Uuid, Option<SenderProfile>> = HashMap::new();
        for notification in &mut notifications {
            let Some(sender) = notification.sender else { continue };
            if !profiles.contains_key(&sender) {
                let profile = self.sender_profile(sender).await;
                profiles.insert(sender, profile);
            }
            notification.sender_profile = profiles.get(&sender).cloned().flatten();
        }

        let total = if unread_only { counts.unread } else { counts.total };
        Ok(NotificationPage {
            notifications,
            total,
            unread_count: counts.unread,
            page,
            limit,
        })
    }

    pub async fn unread_count(&self, user_id: Uuid) -> BackendResult<u64> {
        Ok(self.store.counts(user_id).await?.unread)
    }

    pub async fn delete_notification(&self, notification_id: Uuid, user_id: Uuid) -> BackendResult<bool> {
        Ok(self.store.delete(notification_id, user_id).await?)
    }

    pub async fn delete_all_notifications(&self, user_id: Uuid) -> BackendResult<u64> {
        let deleted = self.store.delete_all(user_id).await?;
        tracing::debug!("[Notifications] Deleted {} for {}", deleted, user_id);
        Ok(deleted)
    }

    pub async fn get_notification_stats(&self, user_id: Uuid) -> BackendResult<NotificationStats> {
        let (counts, by_type, by_priority) = tokio::try_join!(
            self.store.counts(user_id),
            self.store.count_by_type(user_id),
            self.store.count_by_priority(user_id),
        )?;

        Ok(NotificationStats {
            total: counts.total,
            unread: counts.unread,
            by_type,
            by_priority,
        })
    }

    // Typed constructors

    pub async fn create_system_notification(
        &self,
        recipient: Uuid,
        title: &str,
        message: &str,
        data: Option<serde_json::Value>,
        priority: Option<Priority>,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::system(recipient, title, message, data, priority))
            .await
    }

    pub async fn create_connection_request_notification(
        &self,
        recipient: Uuid,
        sender: Uuid,
        sender_name: &str,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::connection_request(recipient, sender, sender_name))
            .await
    }

    pub async fn create_connection_accepted_notification(
        &self,
        recipient: Uuid,
        sender: Uuid,
        sender_name: &str,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::connection_accepted(recipient, sender, sender_name))
            .await
    }

    pub async fn create_job_application_notification(
        &self,
        employer: Uuid,
        applicant: Uuid,
        applicant_name: &str,
        job_title: &str,
        job_id: &str,
        application_id: &str,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::job_application(
            employer,
            applicant,
            applicant_name,
            job_title,
            job_id,
            application_id,
        ))
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_job_status_notification(
        &self,
        applicant: Uuid,
        employer: Uuid,
        employer_name: &str,
        job_title: &str,
        decision: JobDecision,
        job_id: &str,
        application_id: &str,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::job_status(
            applicant,
            employer,
            employer_name,
            job_title,
            decision,
            job_id,
            application_id,
        ))
        .await
    }

    /// `content` is cut to a short preview before it becomes the message
    pub async fn create_message_notification(
        &self,
        recipient: Uuid,
        sender: Uuid,
        sender_name: &str,
        content: &str,
        conversation_id: Uuid,
    ) -> BackendResult<Notification> {
        let preview = crate::shared::notification::truncate_chars(content.trim(), MESSAGE_PREVIEW_CHARS);
        self.create_notification(templates::message(
            recipient,
            sender,
            sender_name,
            &preview,
            conversation_id,
        ))
        .await
    }

    pub async fn create_verification_notification(
        &self,
        recipient: Uuid,
        verification_type: &str,
        outcome: VerificationOutcome,
        reason: Option<&str>,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::verification(recipient, verification_type, outcome, reason))
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_payment_notification(
        &self,
        recipient: Uuid,
        counterparty: Option<Uuid>,
        counterparty_name: &str,
        amount: f64,
        direction: PaymentDirection,
        transaction_id: &str,
        description: Option<&str>,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::payment(
            recipient,
            counterparty,
            counterparty_name,
            amount,
            direction,
            transaction_id,
            description,
        ))
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_community_notification(
        &self,
        recipient: Uuid,
        sender: Uuid,
        sender_name: &str,
        action: CommunityAction,
        post_id: &str,
        post_title: &str,
        comment_content: Option<&str>,
    ) -> BackendResult<Notification> {
        self.create_notification(templates::community(
            recipient,
            sender,
            sender_name,
            action,
            post_id,
            post_title,
            comment_content,
        ))
        .await
    }

    /// Directory failures only cost the display fields
    async fn sender_profile(&self, sender: Uuid) -> Option<SenderProfile> {
        match self.users.profile(sender).await {
            Ok(profile) => profile.map(Into::into),
            Err(e) => {
                tracing::warn!("[Notifications] Sender lookup failed for {}: {}", sender, e);
                None
            }
        }
    }
}
