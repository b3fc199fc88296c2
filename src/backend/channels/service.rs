/**
 * Channel Service
 *
 * Named rooms with role-based membership. Admins manage the channel and its
 * members; `canInvite` gates adding members and `canPost` gates messages.
 * Announcement channels take posts from admins only.
 */

use std::sync::Arc;

use uuid::Uuid;

use super::store::ChannelStore;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::MessagingService;
use crate::shared::messaging::message::validate_content;
use crate::shared::messaging::{
    AddMemberRequest, Channel, ChannelMember, ChannelType, CreateChannelRequest, MemberRole, Message,
    MessageParent, SendMessageRequest, UpdateChannelRequest,
};
use crate::shared::Pagination;

#[derive(Clone)]
pub struct ChannelService {
    channels: Arc<dyn ChannelStore>,
    messaging: MessagingService,
}

impl ChannelService {
    pub fn new(channels: Arc<dyn ChannelStore>, messaging: MessagingService) -> Self {
        Self { channels, messaging }
    }

    pub async fn list(&self, user: Uuid, kind: Option<ChannelType>) -> BackendResult<Vec<Channel>> {
        Ok(self.channels.list_for_member(user, kind).await?)
    }

    pub async fn create(&self, user: Uuid, request: CreateChannelRequest) -> BackendResult<Channel> {
        request.validate()?;
        self.ensure_name_free(request.name.trim(), None).await?;

        let channel = Channel::new(request, user);
        self.channels.insert(&channel).await?;

        tracing::info!("[Channels] {} ({}) created by {}", channel.name, channel.id, user);
        Ok(channel)
    }

    /// Channel `id`, visible to members only
    pub async fn get(&self, user: Uuid, id: Uuid) -> BackendResult<Channel> {
        let channel = self.find(id).await?;
        if !channel.is_member(user) {
            return Err(BackendError::forbidden("Access denied to this channel"));
        }
        Ok(channel)
    }

    pub async fn update(&self, user: Uuid, id: Uuid, request: UpdateChannelRequest) -> BackendResult<Channel> {
        let mut channel = self.admin_channel(user, id).await?;
        request.validate()?;
        if let Some(name) = request.name.as_deref().map(str::trim) {
            if name != channel.name {
                self.ensure_name_free(name, Some(id)).await?;
            }
        }

        request.apply(&mut channel);
        self.save(&channel).await?;
        Ok(channel)
    }

    pub async fn add_member(&self, user: Uuid, id: Uuid, request: AddMemberRequest) -> BackendResult<Channel> {
        let mut channel = self.find(id).await?;
        let can_invite = channel
            .member(user)
            .is_some_and(|m| m.permissions.can_invite);
        if !can_invite {
            return Err(BackendError::forbidden("You do not have permission to add members"));
        }
        if channel.is_member(request.user_id) {
            return Err(BackendError::validation("userId", "User is already a member"));
        }

        channel
            .members
            .push(ChannelMember::new(request.user_id, request.role.unwrap_or_default()));
        self.save(&channel).await?;

        tracing::debug!("[Channels] {} added {} to {}", user, request.user_id, id);
        Ok(channel)
    }

    /// Admins may remove anyone; members may remove themselves
    pub async fn remove_member(&self, user: Uuid, id: Uuid, target: Uuid) -> BackendResult<Channel> {
        let mut channel = self.find(id).await?;
        if user != target && !channel.is_admin(user) {
            return Err(BackendError::forbidden("Only channel admins can remove other members"));
        }
        if !channel.is_member(target) {
            return Err(BackendError::not_found("Member not found"));
        }

        channel.members.retain(|m| m.user_id != target);
        self.save(&channel).await?;
        Ok(channel)
    }

    pub async fn update_role(&self, user: Uuid, id: Uuid, target: Uuid, role: MemberRole) -> BackendResult<Channel> {
        let mut channel = self.admin_channel(user, id).await?;
        let member = channel
            .member_mut(target)
            .ok_or_else(|| BackendError::not_found("Member not found"))?;
        member.role = role;
        member.permissions = role.default_permissions();

        self.save(&channel).await?;
        Ok(channel)
    }

    pub async fn archive(&self, user: Uuid, id: Uuid) -> BackendResult<Channel> {
        let mut channel = self.admin_channel(user, id).await?;
        channel.is_archived = true;
        self.save(&channel).await?;
        tracing::info!("[Channels] {} archived by {}", id, user);
        Ok(channel)
    }

    pub async fn messages(
        &self,
        user: Uuid,
        id: Uuid,
        page: u32,
        limit: u32,
    ) -> BackendResult<(Vec<Message>, Pagination)> {
        self.get(user, id).await?;
        self.messaging
            .parent_messages(MessageParent::Channel(id), page, limit)
            .await
    }

    pub async fn post(&self, user: Uuid, id: Uuid, request: SendMessageRequest) -> BackendResult<Message> {
        let channel = self.find(id).await?;
        if channel.is_archived {
            return Err(BackendError::validation("channelId", "Channel is archived"));
        }
        if !channel.can_post(user) {
            return Err(BackendError::forbidden("You do not have permission to post in this channel"));
        }
        validate_content(&request.content)?;

        let mut message = Message::new(
            MessageParent::Channel(id),
            user,
            request.content.trim().to_string(),
            request.message_type.unwrap_or_default(),
        );
        message.reply_to = request.reply_to;
        message.attachments = request.attachments;

        self.messaging.store_and_announce(&message).await?;
        Ok(message)
    }

    async fn find(&self, id: Uuid) -> BackendResult<Channel> {
        self.channels
            .channel(id)
            .await?
            .ok_or_else(|| BackendError::not_found("Channel not found"))
    }

    async fn admin_channel(&self, user: Uuid, id: Uuid) -> BackendResult<Channel> {
        let channel = self.find(id).await?;
        if !channel.is_admin(user) {
            return Err(BackendError::forbidden("Only channel admins can perform this action"));
        }
        Ok(channel)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> BackendResult<()> {
        match self.channels.by_name(name).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(BackendError::validation("name", "Channel name already exists"))
            }
            _ => Ok(()),
        }
    }

    async fn save(&self, channel: &Channel) -> BackendResult<()> {
        if !self.channels.update(channel).await? {
            return Err(BackendError::not_found("Channel not found"));
        }
        Ok(())
    }
}
