//! Notification Data Structures
//!
//! A notification is a persisted record addressed to one recipient. The record
//! is the durable source of truth; the `new_notification` socket push that
//! accompanies it is only a low-latency hint.
//!
//! # Invariants
//!
//! - `read_at` is `Some` exactly when `is_read` is true, and is written once on
//!   the first transition to read.
//! - Titles hold 1..=100 characters and messages 1..=500 characters. Both are
//!   checked by [`NotificationDraft::validate`] before anything is stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Maximum title length in characters
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Kind of notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JobApplication,
    JobApproved,
    JobRejected,
    Message,
    System,
    ConnectionRequest,
    ConnectionAccepted,
    VerificationApproved,
    VerificationRejected,
    PaymentReceived,
    PaymentSent,
    CommunityLike,
    CommunityComment,
    CommunityMention,
    BlogComment,
    ApplicationStatus,
}

impl NotificationType {
    pub const ALL: [NotificationType; 16] = [
        NotificationType::JobApplication,
        NotificationType::JobApproved,
        NotificationType::JobRejected,
        NotificationType::Message,
        NotificationType::System,
        NotificationType::ConnectionRequest,
        NotificationType::ConnectionAccepted,
        NotificationType::VerificationApproved,
        NotificationType::VerificationRejected,
        NotificationType::PaymentReceived,
        NotificationType::PaymentSent,
        NotificationType::CommunityLike,
        NotificationType::CommunityComment,
        NotificationType::CommunityMention,
        NotificationType::BlogComment,
        NotificationType::ApplicationStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::JobApplication => "job_application",
            NotificationType::JobApproved => "job_approved",
            NotificationType::JobRejected => "job_rejected",
            NotificationType::Message => "message",
            NotificationType::System => "system",
            NotificationType::ConnectionRequest => "connection_request",
            NotificationType::ConnectionAccepted => "connection_accepted",
            NotificationType::VerificationApproved => "verification_approved",
            NotificationType::VerificationRejected => "verification_rejected",
            NotificationType::PaymentReceived => "payment_received",
            NotificationType::PaymentSent => "payment_sent",
            NotificationType::CommunityLike => "community_like",
            NotificationType::CommunityComment => "community_comment",
            NotificationType::CommunityMention => "community_mention",
            NotificationType::BlogComment => "blog_comment",
            NotificationType::ApplicationStatus => "application_status",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == s)
    }
}

/// Delivery priority. Defaults to `Medium`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Display fields of the sender, populated on read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SenderProfile {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

/// A stored notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Uuid,
    pub sender: Option<Uuid>,
    /// Populated sender display fields (absent for system notifications)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_profile: Option<SenderProfile>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Build a fresh unread notification from a validated draft
    pub fn from_draft(draft: NotificationDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: draft.recipient,
            sender: draft.sender,
            sender_profile: None,
            kind: draft.kind,
            title: draft.title.trim().to_string(),
            message: draft.message.trim().to_string(),
            data: draft.data.unwrap_or_else(|| serde_json::json!({})),
            priority: draft.priority.unwrap_or_default(),
            is_read: false,
            read_at: None,
            expires_at: draft.expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to read.
    ///
    /// Returns `true` if the notification changed. An already-read notification
    /// keeps its original `read_at`.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Human readable age, e.g. "5m ago"
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let age = now.signed_duration_since(self.created_at);
        let seconds = age.num_seconds();

        if seconds < 60 {
            "Just now".to_string()
        } else if seconds < 3_600 {
            format!("{}m ago", age.num_minutes())
        } else if seconds < 86_400 {
            format!("{}h ago", age.num_hours())
        } else if age.num_days() < 30 {
            format!("{}d ago", age.num_days())
        } else {
            self.created_at.format("%Y-%m-%d").to_string()
        }
    }
}

/// Input to `create_notification`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub recipient: Uuid,
    #[serde(default)]
    pub sender: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    pub fn new(
        recipient: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            sender: None,
            kind,
            title: title.into(),
            message: message.into(),
            data: None,
            priority: None,
            expires_at: None,
        }
    }

    pub fn with_sender(mut self, sender: Uuid) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Enforce the title/message length bounds.
    ///
    /// Lengths are counted in characters after trimming surrounding whitespace.
    pub fn validate(&self) -> Result<(), SharedError> {
        check_length("title", &self.title, MAX_TITLE_CHARS)?;
        check_length("message", &self.message, MAX_MESSAGE_CHARS)?;
        if let Some(data) = &self.data {
            if !data.is_object() {
                return Err(SharedError::validation("data", "Data must be an object"));
            }
        }
        Ok(())
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), SharedError> {
    let count = value.trim().chars().count();
    if count == 0 {
        return Err(SharedError::validation(field, format!("{} is required", capitalize(field))));
    }
    if count > max {
        return Err(SharedError::validation(
            field,
            format!("{} cannot exceed {} characters", capitalize(field), max),
        ));
    }
    Ok(())
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cut `value` to at most `max` characters, ending with "..." when shortened.
pub fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// One page of a user's notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    /// Count matching the current filter
    pub total: u64,
    /// Unread count over all of the user's notifications, independent of the filter
    pub unread_count: u64,
    pub page: u32,
    pub limit: u32,
}

impl NotificationPage {
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit)) as u32
    }
}

/// Pagination block of the notification list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_notifications: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// `data` of `GET /api/v1/notifications`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub pagination: NotificationPagination,
}

impl From<NotificationPage> for NotificationList {
    fn from(page: NotificationPage) -> Self {
        let total_pages = page.total_pages();
        Self {
            pagination: NotificationPagination {
                current_page: page.page,
                total_pages,
                total_notifications: page.total,
                has_next: page.page < total_pages,
                has_prev: page.page > 1,
            },
            unread_count: page.unread_count,
            notifications: page.notifications,
        }
    }
}

/// Aggregate counts for a user's notifications
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_type: BTreeMap<NotificationType, u64>,
    pub by_priority: BTreeMap<Priority, u64>,
}

/// Per-user notification preferences. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub job_alerts: bool,
    pub message_notifications: bool,
    pub application_updates: bool,
    pub blog_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            job_alerts: true,
            message_notifications: true,
            application_updates: true,
            blog_notifications: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> NotificationDraft {
        NotificationDraft::new(Uuid::new_v4(), NotificationType::System, "Hello", "World")
    }

    #[test]
    fn test_type_round_trips_through_str() {
        for kind in NotificationType::ALL {
            assert_eq!(NotificationType::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationType::from_str("nope"), None);
    }

    #[test]
    fn test_type_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationType::VerificationApproved).unwrap();
        assert_eq!(json, "\"verification_approved\"");
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        let n = Notification::from_draft(draft(), Utc::now());
        assert_eq!(n.priority, Priority::Medium);
        assert_eq!(n.data, serde_json::json!({}));
        assert!(!n.is_read);
        assert!(n.read_at.is_none());
    }

    #[test]
    fn test_mark_read_sets_timestamp_once() {
        let created = Utc::now();
        let mut n = Notification::from_draft(draft(), created);
        let first = created + Duration::seconds(5);
        assert!(n.mark_read(first));
        assert_eq!(n.read_at, Some(first));

        assert!(!n.mark_read(first + Duration::seconds(60)));
        assert_eq!(n.read_at, Some(first));
        assert!(n.is_read);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(draft().validate().is_ok());

        let mut long_title = draft();
        long_title.title = "x".repeat(101);
        match long_title.validate() {
            Err(SharedError::ValidationError { field, .. }) => assert_eq!(field, "title"),
            other => panic!("Expected title ValidationError, got {:?}", other),
        }

        let mut exact = draft();
        exact.title = "é".repeat(100);
        exact.message = "ü".repeat(500);
        assert!(exact.validate().is_ok());

        let mut empty = draft();
        empty.message = "   ".to_string();
        match empty.validate() {
            Err(SharedError::ValidationError { field, .. }) => assert_eq!(field, "message"),
            other => panic!("Expected message ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_object_data() {
        let bad = draft().with_data(serde_json::json!([1, 2]));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_time_ago() {
        let created = Utc::now();
        let n = Notification::from_draft(draft(), created);
        assert_eq!(n.time_ago(created + Duration::seconds(10)), "Just now");
        assert_eq!(n.time_ago(created + Duration::minutes(5)), "5m ago");
        assert_eq!(n.time_ago(created + Duration::hours(3)), "3h ago");
        assert_eq!(n.time_ago(created + Duration::days(2)), "2d ago");
        assert_eq!(
            n.time_ago(created + Duration::days(45)),
            created.format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 6), "abc...");
        assert_eq!(truncate_chars(&"é".repeat(20), 10).chars().count(), 10);
    }

    #[test]
    fn test_total_pages() {
        let page = NotificationPage {
            notifications: vec![],
            total: 41,
            unread_count: 0,
            page: 1,
            limit: 20,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn test_wire_shape_uses_type_key() {
        let n = Notification::from_draft(draft(), Utc::now());
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "system");
        assert_eq!(value["isRead"], false);
        assert!(value.get("senderProfile").is_none());
    }

    #[test]
    fn test_list_pagination_keys() {
        let page = NotificationPage {
            notifications: vec![],
            total: 25,
            unread_count: 4,
            page: 2,
            limit: 10,
        };
        let value = serde_json::to_value(NotificationList::from(page)).unwrap();
        assert_eq!(value["unreadCount"], 4);
        assert_eq!(value["pagination"]["totalNotifications"], 25);
        assert_eq!(value["pagination"]["totalPages"], 3);
        assert_eq!(value["pagination"]["hasNext"], true);
        assert_eq!(value["pagination"]["hasPrev"], true);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: NotificationSettings = serde_json::from_str(r#"{"jobAlerts": false}"#).unwrap();
        assert!(!settings.job_alerts);
        assert!(settings.email_notifications);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = NotificationSettings::default();
        assert!(settings.email_notifications);
        assert!(!settings.blog_notifications);
    }
}
