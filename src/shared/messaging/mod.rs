//! Messaging Module
//!
//! This module contains the data structures for conversations, channels,
//! messages and calls:
//!
//! - `Conversation` - A conversation between users
//! - `Channel` - A named room with role-based membership
//! - `Message` - A message owned by one conversation or one channel
//! - `CallRecord` - A call and its meeting room
//!
//! # Usage
//!
//! ```rust
//! use parttime_comms::shared::messaging::{Conversation, Channel, Message, CallRecord};
//! ```

pub mod call;
pub mod channel;
pub mod conversation;
pub mod message;

// Re-export all types
pub use call::{CallParticipant, CallRecord, CallStatus, CallType, CreateMeetingRequest};
pub use channel::{
    AddMemberRequest, Channel, ChannelMember, ChannelSettings, ChannelType, CreateChannelRequest,
    MemberPermissions, MemberRole, UpdateChannelRequest, UpdateRoleRequest,
};
pub use conversation::{Conversation, ConversationType, CreateConversationRequest};
pub use message::{
    Attachment, EditMessageRequest, Message, MessageParent, MessageType, Reaction, ReactionRequest,
    SendMessageRequest,
};
