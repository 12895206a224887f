//! Recording chat platform.
//!
//! Directory lookups are case-insensitive substring matches on names (or an
//! exact id). Every outbound message is recorded for assertions.

use herald_core::{
    Channel, ChannelId, ChatPlatform, GuildId, Permission, PlatformError, Role, User, UserId,
    UserScope,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

pub const BOT: UserId = UserId(1);

/// A message the core asked the platform to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Channel(ChannelId, String),
    Private(UserId, String),
}

impl Outbound {
    pub fn text(&self) -> &str {
        match self {
            Self::Channel(_, text) | Self::Private(_, text) => text,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Self::Private(..))
    }
}

#[derive(Default)]
pub struct MockPlatform {
    /// (user, guilds the user is a member of)
    users: Vec<(User, Vec<GuildId>)>,
    channels: Vec<(GuildId, Channel)>,
    roles: Vec<(GuildId, Role)>,
    /// Permissions the bot lacks everywhere.
    denied: HashSet<Permission>,
    fail_sends: AtomicBool,
    outbox: Mutex<Vec<Outbound>>,
}

#[allow(dead_code)]
impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, guild: GuildId, user: User) -> Self {
        self.users.push((user, vec![guild]));
        self
    }

    /// A user known to the platform but not in any guild.
    pub fn with_stranger(mut self, user: User) -> Self {
        self.users.push((user, Vec::new()));
        self
    }

    pub fn with_channel(mut self, guild: GuildId, channel: Channel) -> Self {
        self.channels.push((guild, channel));
        self
    }

    pub fn with_role(mut self, guild: GuildId, role: Role) -> Self {
        self.roles.push((guild, role));
        self
    }

    /// Revoke `permission` from the bot.
    pub fn deny(mut self, permission: Permission) -> Self {
        self.denied.insert(permission);
        self
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.outbox.lock().clone()
    }

    /// Drain and return everything sent so far.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbox.lock())
    }

    pub fn last_text(&self) -> Option<String> {
        self.outbox.lock().last().map(|o| o.text().to_string())
    }

    fn record(&self, outbound: Outbound) -> Result<(), PlatformError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Send("mock delivery failure".into()));
        }
        self.outbox.lock().push(outbound);
        Ok(())
    }
}

fn matches(name: &str, id: u64, query: &str) -> bool {
    query.parse::<u64>().is_ok_and(|q| q == id)
        || name.to_lowercase().contains(&query.to_lowercase())
}

impl ChatPlatform for MockPlatform {
    fn self_id(&self) -> UserId {
        BOT
    }

    fn find_users(&self, query: &str, scope: UserScope) -> Vec<User> {
        self.users
            .iter()
            .filter(|(_, guilds)| match scope {
                UserScope::Guild(guild) => guilds.contains(&guild),
                UserScope::Global => true,
            })
            .filter(|(user, _)| matches(&user.name, user.id.0, query))
            .map(|(user, _)| user.clone())
            .collect()
    }

    fn find_channels(&self, query: &str, guild: GuildId) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|(g, c)| *g == guild && matches(&c.name, c.id.0, query.trim_start_matches('#')))
            .map(|(_, c)| c.clone())
            .collect()
    }

    fn find_roles(&self, query: &str, guild: GuildId) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|(g, r)| *g == guild && matches(&r.name, r.id.0, query))
            .map(|(_, r)| r.clone())
            .collect()
    }

    fn has_permission(&self, user: UserId, permission: Permission, _channel: ChannelId) -> bool {
        user != BOT || !self.denied.contains(&permission)
    }

    fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        self.record(Outbound::Channel(channel, text.to_string()))
    }

    fn send_private_message(&self, user: UserId, text: &str) -> Result<(), PlatformError> {
        self.record(Outbound::Private(user, text.to_string()))
    }
}
