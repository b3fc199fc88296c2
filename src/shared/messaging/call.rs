//! Call Data Structures
//!
//! Calls carry signaling metadata only. Media runs through an external
//! meeting room (`https://meet.jit.si/<room>`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::MessageParent;

pub const MEETING_BASE_URL: &str = "https://meet.jit.si";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    #[serde(alias = "audio")]
    Voice,
    #[default]
    Video,
    ScreenShare,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Voice => "voice",
            CallType::Video => "video",
            CallType::ScreenShare => "screen_share",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "voice" | "audio" => Some(CallType::Voice),
            "video" => Some(CallType::Video),
            "screen_share" => Some(CallType::ScreenShare),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiated,
    Ringing,
    Active,
    Ended,
    Missed,
    Rejected,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Initiated => "initiated",
            CallStatus::Ringing => "ringing",
            CallStatus::Active => "active",
            CallStatus::Ended => "ended",
            CallStatus::Missed => "missed",
            CallStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initiated" => Some(CallStatus::Initiated),
            "ringing" => Some(CallStatus::Ringing),
            "active" => Some(CallStatus::Active),
            "ended" => Some(CallStatus::Ended),
            "missed" => Some(CallStatus::Missed),
            "rejected" => Some(CallStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, CallStatus::Ringing | CallStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Ended | CallStatus::Missed | CallStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallParticipant {
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub call_id: String,
    pub room_name: String,
    pub jitsi_url: String,
    pub call_type: CallType,
    pub initiator: Uuid,
    pub participants: Vec<CallParticipant>,
    pub conversation_id: Option<Uuid>,
    pub channel_id: Option<Uuid>,
    pub status: CallStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    /// A fresh meeting room with `initiator` already joined
    pub fn new_meeting(request: &CreateMeetingRequest, initiator: Uuid, now: DateTime<Utc>) -> Self {
        let room_name = meeting_room_name(now);
        let mut participants = vec![CallParticipant {
            user_id: initiator,
            joined_at: now,
            left_at: None,
        }];
        for user_id in &request.participants {
            if participants.iter().all(|p| p.user_id != *user_id) {
                participants.push(CallParticipant {
                    user_id: *user_id,
                    joined_at: now,
                    left_at: None,
                });
            }
        }

        Self {
            call_id: call_id(now, initiator),
            jitsi_url: format!("{}/{}", MEETING_BASE_URL, room_name),
            room_name,
            call_type: request.call_type.unwrap_or_default(),
            initiator,
            participants,
            conversation_id: request.conversation_id,
            channel_id: request.channel_id,
            status: CallStatus::Initiated,
            started_at: None,
            ended_at: None,
            duration_secs: None,
            created_at: now,
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.initiator == user_id || self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Where call system messages go. A conversation wins over a channel.
    pub fn message_parent(&self) -> Option<MessageParent> {
        self.conversation_id
            .map(MessageParent::Conversation)
            .or(self.channel_id.map(MessageParent::Channel))
    }

    /// Add `user_id`, or reopen their entry if they had left
    pub fn join(&mut self, user_id: Uuid, now: DateTime<Utc>) {
        match self.participants.iter_mut().find(|p| p.user_id == user_id) {
            Some(entry) => {
                if entry.left_at.is_some() {
                    entry.joined_at = now;
                    entry.left_at = None;
                }
            }
            None => self.participants.push(CallParticipant {
                user_id,
                joined_at: now,
                left_at: None,
            }),
        }
    }

    /// Close `user_id`'s open entry. Returns `false` if there was none.
    pub fn leave(&mut self, user_id: Uuid, now: DateTime<Utc>) -> bool {
        match self
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id && p.left_at.is_none())
        {
            Some(entry) => {
                entry.left_at = Some(now);
                true
            }
            None => false,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = CallStatus::Active;
        self.started_at = Some(now);
    }

    /// End the call, closing every open participant entry
    pub fn end(&mut self, now: DateTime<Utc>) {
        self.status = CallStatus::Ended;
        self.ended_at = Some(now);
        let since = self.started_at.unwrap_or(self.created_at);
        self.duration_secs = Some(now.signed_duration_since(since).num_seconds().max(0));
        for entry in self.participants.iter_mut().filter(|p| p.left_at.is_none()) {
            entry.left_at = Some(now);
        }
    }
}

/// `call_<epoch_millis>_<user>_<random>`. The random tail keeps two calls
/// opened by one user in the same millisecond apart.
pub fn call_id(now: DateTime<Utc>, user_id: Uuid) -> String {
    format!(
        "call_{}_{}_{}",
        now.timestamp_millis(),
        user_id.simple(),
        Uuid::new_v4().simple()
    )
}

/// `comms-<epoch_millis>-<6 base36 chars>`
pub fn meeting_room_name(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let suffix: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(6)
        .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
        .collect();
    format!("comms-{}-{}", now.timestamp_millis(), suffix)
}

/// Format a duration as `m:ss`
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub call_type: Option<CallType>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub channel_id: Option<Uuid>,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_meeting_shape() {
        let creator = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let now = Utc::now();
        let request = CreateMeetingRequest {
            participants: vec![guest, creator],
            ..Default::default()
        };
        let call = CallRecord::new_meeting(&request, creator, now);

        assert!(call.room_name.starts_with("comms-"));
        assert_eq!(call.room_name.rsplit('-').next().unwrap().len(), 6);
        assert_eq!(call.jitsi_url, format!("https://meet.jit.si/{}", call.room_name));
        assert_eq!(call.status, CallStatus::Initiated);
        assert_eq!(call.participants.len(), 2);
        assert!(call.is_participant(guest));
        assert!(call.call_id.starts_with("call_"));
    }

    #[test]
    fn test_join_leave_and_end() {
        let creator = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let now = Utc::now();
        let mut call = CallRecord::new_meeting(&CreateMeetingRequest::default(), creator, now);

        call.join(guest, now);
        assert!(call.leave(guest, now));
        assert!(!call.leave(guest, now));
        call.join(guest, now);
        assert_eq!(call.participants.len(), 2);
        assert!(call.participants[1].left_at.is_none());

        call.start(now);
        call.end(now + Duration::seconds(125));
        assert_eq!(call.status, CallStatus::Ended);
        assert_eq!(call.duration_secs, Some(125));
        assert!(call.participants.iter().all(|p| p.left_at.is_some()));
    }

    #[test]
    fn test_message_parent_prefers_conversation() {
        let (conversation, channel) = (Uuid::new_v4(), Uuid::new_v4());
        let creator = Uuid::new_v4();
        let now = Utc::now();
        let in_channel = CallRecord::new_meeting(
            &CreateMeetingRequest {
                channel_id: Some(channel),
                ..Default::default()
            },
            creator,
            now,
        );
        assert_eq!(in_channel.message_parent(), Some(MessageParent::Channel(channel)));

        let both = CallRecord::new_meeting(
            &CreateMeetingRequest {
                conversation_id: Some(conversation),
                channel_id: Some(channel),
                ..Default::default()
            },
            creator,
            now,
        );
        assert_eq!(both.message_parent(), Some(MessageParent::Conversation(conversation)));

        let bare = CallRecord::new_meeting(&CreateMeetingRequest::default(), creator, now);
        assert_eq!(bare.message_parent(), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(-3), "0:00");
    }

    #[test]
    fn test_call_ids_differ_within_one_millisecond() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let first = call_id(now, user);
        let second = call_id(now, user);

        assert_ne!(first, second);
        assert!(first.starts_with(&format!("call_{}_{}_", now.timestamp_millis(), user.simple())));
    }

    #[test]
    fn test_audio_is_accepted_as_voice() {
        let parsed: CallType = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(parsed, CallType::Voice);
        assert_eq!(CallType::from_str("audio"), Some(CallType::Voice));
        assert_eq!(serde_json::to_value(parsed).unwrap(), "voice");
    }

    #[test]
    fn test_status_flags() {
        assert!(CallStatus::Ringing.is_live());
        assert!(!CallStatus::Initiated.is_live());
        assert!(CallStatus::Rejected.is_terminal());
    }
}
