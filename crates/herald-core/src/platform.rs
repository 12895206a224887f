//! The chat-platform surface the core depends on.
//!
//! The router never talks to a network client directly. Everything it needs
//! (directory lookups, permission checks, outbound messages) goes through the
//! [`ChatPlatform`] trait so the core can be driven by a real gateway client,
//! the console harness, or a recording mock in tests.

use crate::error::PlatformError;
use std::fmt;

/// Snowflake-style identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Identifier for a text channel (guild channel or private channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

/// Identifier for a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuildId(pub u64);

/// Identifier for a guild role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId(pub u64);

macro_rules! impl_id_display {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })+
    };
}

impl_id_display!(UserId, ChannelId, GuildId, RoleId);

/// A platform user as returned by directory lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Legacy four-digit discriminator, if the platform still uses one.
    pub discriminator: Option<String>,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            discriminator: None,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminator {
            Some(d) => write!(f, "**{}**#{} (ID:{})", self.name, d, self.id),
            None => write!(f, "**{}** (ID:{})", self.name, self.id),
        }
    }
}

/// A text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

impl Channel {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ChannelId(id),
            name: name.into(),
        }
    }

    /// Mention form used in outbound text.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (ID:{})", self.name, self.id)
    }
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: RoleId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}** (ID:{})", self.name, self.id)
    }
}

/// Channel-scoped platform permissions the bot may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadMessages,
    SendMessages,
    ManageMessages,
    EmbedLinks,
    AttachFiles,
    AddReactions,
    KickMembers,
    BanMembers,
    ManageRoles,
    ManageChannels,
    ManageNicknames,
}

impl Permission {
    /// Human-readable name used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadMessages => "Read Messages",
            Self::SendMessages => "Send Messages",
            Self::ManageMessages => "Manage Messages",
            Self::EmbedLinks => "Embed Links",
            Self::AttachFiles => "Attach Files",
            Self::AddReactions => "Add Reactions",
            Self::KickMembers => "Kick Members",
            Self::BanMembers => "Ban Members",
            Self::ManageRoles => "Manage Roles",
            Self::ManageChannels => "Manage Channels",
            Self::ManageNicknames => "Manage Nicknames",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a user lookup should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
    /// Members of one guild.
    Guild(GuildId),
    /// Every user the bot can see.
    Global,
}

/// An inbound chat message as delivered by the platform.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Raw, already-decoded message body.
    pub text: String,
    pub author: User,
    pub channel: Channel,
    /// `None` for direct messages.
    pub guild: Option<GuildId>,
}

impl InboundMessage {
    pub fn in_guild(
        guild: GuildId,
        channel: Channel,
        author: User,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            author,
            channel,
            guild: Some(guild),
        }
    }

    pub fn direct(channel: Channel, author: User, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author,
            channel,
            guild: None,
        }
    }

    #[inline]
    pub fn is_direct(&self) -> bool {
        self.guild.is_none()
    }
}

/// Services the router consumes from the chat platform.
///
/// All methods are synchronous: command dispatch runs to completion on the
/// thread that received the message. Implementations backed by an async
/// client are expected to read from a cache and queue outbound sends.
pub trait ChatPlatform: Send + Sync {
    /// The bot's own identity.
    fn self_id(&self) -> UserId;

    /// Users whose name, mention or id matches `query`.
    fn find_users(&self, query: &str, scope: UserScope) -> Vec<User>;

    /// Text channels in `guild` matching `query`.
    fn find_channels(&self, query: &str, guild: GuildId) -> Vec<Channel>;

    /// Roles in `guild` matching `query`.
    fn find_roles(&self, query: &str, guild: GuildId) -> Vec<Role>;

    /// Whether `user` holds `permission` in `channel`.
    fn has_permission(&self, user: UserId, permission: Permission, channel: ChannelId) -> bool;

    fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError>;

    fn send_private_message(&self, user: UserId, text: &str) -> Result<(), PlatformError>;
}
