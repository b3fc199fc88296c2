//! Conversation Data Structure
//!
//! Represents a conversation between two or more users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// What a conversation is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    #[default]
    Direct,
    Group,
    JobRelated,
    CommunityRelated,
    NetworkRelated,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Direct => "direct",
            ConversationType::Group => "group",
            ConversationType::JobRelated => "job_related",
            ConversationType::CommunityRelated => "community_related",
            ConversationType::NetworkRelated => "network_related",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(ConversationType::Direct),
            "group" => Some(ConversationType::Group),
            "job_related" => Some(ConversationType::JobRelated),
            "community_related" => Some(ConversationType::CommunityRelated),
            "network_related" => Some(ConversationType::NetworkRelated),
            _ => None,
        }
    }
}

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    /// Participant user IDs, sorted and unique
    pub participants: Vec<Uuid>,
    #[serde(rename = "type")]
    pub kind: ConversationType,
    pub title: Option<String>,
    pub last_message: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub message_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(participants: Vec<Uuid>, kind: ConversationType, title: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants: normalize_participants(participants),
            kind,
            title,
            last_message: None,
            last_message_at: None,
            message_count: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Participants other than `user_id`
    pub fn others(&self, user_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.participants.iter().copied().filter(move |id| *id != user_id)
    }
}

/// Sort and de-duplicate a participant list
pub fn normalize_participants(mut participants: Vec<Uuid>) -> Vec<Uuid> {
    participants.sort();
    participants.dedup();
    participants
}

/// Request to create a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participant_ids: Vec<Uuid>,
    #[serde(default, rename = "type")]
    pub kind: Option<ConversationType>,
    #[serde(default)]
    pub title: Option<String>,
}

impl CreateConversationRequest {
    /// Participant set including the caller
    pub fn participants_with(&self, caller: Uuid) -> Result<Vec<Uuid>, SharedError> {
        let mut all = self.participant_ids.clone();
        all.push(caller);
        let all = normalize_participants(all);
        if all.len() < 2 {
            return Err(SharedError::validation(
                "participantIds",
                "At least 2 participants required",
            ));
        }
        Ok(all)
    }
}
