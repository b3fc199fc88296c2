//! Channel Data Structures
//!
//! Channels are named rooms with explicit membership. Each member carries a
//! role and a set of permission flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    #[default]
    Public,
    Private,
    Announcement,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Public => "public",
            ChannelType::Private => "private",
            ChannelType::Announcement => "announcement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(ChannelType::Public),
            "private" => Some(ChannelType::Private),
            "announcement" => Some(ChannelType::Announcement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Moderator,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Moderator => "moderator",
            MemberRole::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(MemberRole::Admin),
            "moderator" => Some(MemberRole::Moderator),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }

    /// Permission set granted when a member is given this role
    pub fn default_permissions(&self) -> MemberPermissions {
        match self {
            MemberRole::Admin => MemberPermissions::all(),
            MemberRole::Moderator => MemberPermissions {
                can_pin: true,
                ..MemberPermissions::default()
            },
            MemberRole::Member => MemberPermissions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberPermissions {
    pub can_post: bool,
    pub can_react: bool,
    pub can_pin: bool,
    pub can_invite: bool,
}

impl Default for MemberPermissions {
    fn default() -> Self {
        Self {
            can_post: true,
            can_react: true,
            can_pin: false,
            can_invite: false,
        }
    }
}

impl MemberPermissions {
    pub fn all() -> Self {
        Self {
            can_post: true,
            can_react: true,
            can_pin: true,
            can_invite: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMember {
    pub user_id: Uuid,
    pub role: MemberRole,
    pub permissions: MemberPermissions,
    pub joined_at: DateTime<Utc>,
}

impl ChannelMember {
    pub fn new(user_id: Uuid, role: MemberRole) -> Self {
        Self {
            user_id,
            role,
            permissions: role.default_permissions(),
            joined_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettings {
    pub allow_file_uploads: bool,
    pub allow_reactions: bool,
    pub allow_threads: bool,
    pub allow_mentions: bool,
    pub require_approval: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            allow_file_uploads: true,
            allow_reactions: true,
            allow_threads: true,
            allow_mentions: true,
            require_approval: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub created_by: Uuid,
    pub members: Vec<ChannelMember>,
    pub settings: ChannelSettings,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// New channel with `creator` as its only admin
    pub fn new(request: CreateChannelRequest, creator: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            topic: request.topic,
            kind: request.kind.unwrap_or_default(),
            created_by: creator,
            members: vec![ChannelMember::new(creator, MemberRole::Admin)],
            settings: request.settings.unwrap_or_default(),
            is_archived: false,
            created_at: Utc::now(),
        }
    }

    pub fn member(&self, user_id: Uuid) -> Option<&ChannelMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: Uuid) -> Option<&mut ChannelMember> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.member(user_id).is_some_and(|m| m.role == MemberRole::Admin)
    }

    /// Whether `user_id` may post. Announcement channels accept admin posts only.
    pub fn can_post(&self, user_id: Uuid) -> bool {
        match self.member(user_id) {
            Some(member) if self.kind == ChannelType::Announcement => member.role == MemberRole::Admin,
            Some(member) => member.permissions.can_post,
            None => false,
        }
    }
}

fn check_optional(field: &str, value: Option<&str>, max: usize, label: &str) -> Result<(), SharedError> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(SharedError::validation(
                field,
                format!("{} cannot exceed {} characters", label, max),
            ));
        }
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), SharedError> {
    let count = name.trim().chars().count();
    if count == 0 {
        return Err(SharedError::validation("name", "Channel name is required"));
    }
    if count > MAX_NAME_CHARS {
        return Err(SharedError::validation(
            "name",
            format!("Channel name cannot exceed {} characters", MAX_NAME_CHARS),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<ChannelType>,
    #[serde(default)]
    pub settings: Option<ChannelSettings>,
}

impl CreateChannelRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        check_name(&self.name)?;
        check_optional("description", self.description.as_deref(), MAX_DESCRIPTION_CHARS, "Description")?;
        check_optional("topic", self.topic.as_deref(), MAX_TOPIC_CHARS, "Topic")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChannelRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub settings: Option<ChannelSettings>,
}

impl UpdateChannelRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        check_optional("description", self.description.as_deref(), MAX_DESCRIPTION_CHARS, "Description")?;
        check_optional("topic", self.topic.as_deref(), MAX_TOPIC_CHARS, "Topic")
    }

    pub fn apply(self, channel: &mut Channel) {
        if let Some(name) = self.name {
            channel.name = name.trim().to_string();
        }
        if self.description.is_some() {
            channel.description = self.description;
        }
        if self.topic.is_some() {
            channel.topic = self.topic;
        }
        if let Some(settings) = self.settings {
            channel.settings = settings;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: MemberRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateChannelRequest {
        CreateChannelRequest {
            name: name.to_string(),
            description: None,
            topic: None,
            kind: None,
            settings: None,
        }
    }

    #[test]
    fn test_creator_is_admin_with_all_permissions() {
        let creator = Uuid::new_v4();
        let channel = Channel::new(request("general"), creator);
        let member = channel.member(creator).unwrap();
        assert_eq!(member.role, MemberRole::Admin);
        assert_eq!(member.permissions, MemberPermissions::all());
        assert_eq!(channel.kind, ChannelType::Public);
        assert!(channel.settings.allow_reactions);
        assert!(!channel.settings.require_approval);
    }

    #[test]
    fn test_default_member_permissions() {
        let member = ChannelMember::new(Uuid::new_v4(), MemberRole::Member);
        assert!(member.permissions.can_post);
        assert!(member.permissions.can_react);
        assert!(!member.permissions.can_pin);
        assert!(!member.permissions.can_invite);
    }

    #[test]
    fn test_announcement_posting_is_admin_only() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut req = request("news");
        req.kind = Some(ChannelType::Announcement);
        let mut channel = Channel::new(req, creator);
        channel.members.push(ChannelMember::new(other, MemberRole::Member));
        assert!(channel.can_post(creator));
        assert!(!channel.can_post(other));
        assert!(!channel.can_post(Uuid::new_v4()));
    }

    #[test]
    fn test_name_validation() {
        assert!(request("ok").validate().is_ok());
        assert!(request(" ").validate().is_err());
        assert!(request(&"n".repeat(51)).validate().is_err());

        let mut long_topic = request("ok");
        long_topic.topic = Some("t".repeat(201));
        assert!(long_topic.validate().is_err());
    }
}
