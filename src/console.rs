//! Console chat platform.
//!
//! Stands in for a real gateway: a fixed in-memory guild directory, inbound
//! messages read from stdin and outbound messages written to stdout. Lines
//! starting with `dm:` are delivered as direct messages; everything else is
//! posted in `#general`.

use crate::config::ConsoleConfig;
use chrono::Local;
use herald_core::{
    Channel, ChannelId, ChatPlatform, GuildId, InboundMessage, Permission, PlatformError, Role,
    User, UserId, UserScope,
};
use regex::Regex;
use std::io::Write;
use std::sync::LazyLock;

static USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?(\d+)>$").expect("static regex"));
static CHANNEL_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<#(\d+)>$").expect("static regex"));
static ROLE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@&(\d+)>$").expect("static regex"));

pub const GUILD: GuildId = GuildId(1);
const DM_CHANNEL: u64 = 999;

pub struct ConsolePlatform {
    bot: User,
    members: Vec<User>,
    /// Known to the platform but not members of the guild.
    strangers: Vec<User>,
    channels: Vec<Channel>,
    roles: Vec<Role>,
}

impl ConsolePlatform {
    /// A small demo guild with a handful of members, channels and roles.
    pub fn demo(bot_name: &str) -> Self {
        Self {
            bot: User::new(10, bot_name),
            members: vec![
                User::new(100, "operator"),
                User::new(101, "alice"),
                User::new(102, "alicia"),
                User::new(103, "bob"),
                User::new(104, "carol").with_discriminator("0042"),
            ],
            strangers: vec![User::new(200, "dave")],
            channels: vec![
                Channel::new(300, "general"),
                Channel::new(301, "random"),
                Channel::new(302, "mod-log"),
            ],
            roles: vec![
                Role::new(400, "Moderators"),
                Role::new(401, "Members"),
                Role::new(402, "Muted"),
            ],
        }
    }

    /// Build the inbound message for one console line.
    pub fn inbound(&self, line: &str, console: &ConsoleConfig) -> InboundMessage {
        let author = self
            .members
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(&console.author))
            .cloned()
            .unwrap_or_else(|| User::new(100, console.author.clone()));

        match line.strip_prefix("dm:") {
            Some(text) => InboundMessage::direct(Channel::new(DM_CHANNEL, "dm"), author, text.trim()),
            None => InboundMessage::in_guild(GUILD, self.channels[0].clone(), author, line),
        }
    }

    fn all_users(&self) -> impl Iterator<Item = &User> {
        self.members.iter().chain(&self.strangers)
    }

    fn channel_name(&self, id: ChannelId) -> &str {
        if id.0 == DM_CHANNEL {
            return "dm";
        }
        self.channels
            .iter()
            .find(|c| c.id == id)
            .map_or("unknown", |c| c.name.as_str())
    }

    fn user_name(&self, id: UserId) -> &str {
        self.all_users()
            .find(|u| u.id == id)
            .map_or("unknown", |u| u.name.as_str())
    }

    fn write_line(&self, target: &str, text: &str) -> Result<(), PlatformError> {
        let mut out = std::io::stdout().lock();
        let stamp = Local::now().format("%H:%M:%S");
        for (i, line) in text.lines().enumerate() {
            let lead = if i == 0 { target } else { "" };
            writeln!(out, "[{stamp}] {lead:>12} | {line}")
                .map_err(|e| PlatformError::Send(e.to_string()))?;
        }
        out.flush().map_err(|e| PlatformError::Send(e.to_string()))
    }
}

/// Name lookup in tiers: exact, exact ignoring case, prefix, substring. The
/// first non-empty tier wins.
fn find_by_name<'a, T: Clone + 'a>(
    items: impl Iterator<Item = &'a T> + Clone,
    query: &str,
    name_of: impl Fn(&T) -> &str,
) -> Vec<T> {
    let lowered = query.to_lowercase();
    let tiers: [&dyn Fn(&str) -> bool; 4] = [
        &|name: &str| name == query,
        &|name: &str| name.eq_ignore_ascii_case(query),
        &|name: &str| name.to_lowercase().starts_with(&lowered),
        &|name: &str| name.to_lowercase().contains(&lowered),
    ];
    for tier in tiers {
        let found: Vec<T> = items
            .clone()
            .filter(|item| tier(name_of(*item)))
            .cloned()
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Id from a mention (`<@123>`) or a bare numeric id.
fn mentioned_id(pattern: &Regex, query: &str) -> Option<u64> {
    pattern
        .captures(query)
        .and_then(|caps| caps[1].parse().ok())
        .or_else(|| query.parse().ok())
}

impl ChatPlatform for ConsolePlatform {
    fn self_id(&self) -> UserId {
        self.bot.id
    }

    fn find_users(&self, query: &str, scope: UserScope) -> Vec<User> {
        let pool: Vec<&User> = match scope {
            UserScope::Guild(guild) if guild == GUILD => self.members.iter().collect(),
            UserScope::Guild(_) => Vec::new(),
            UserScope::Global => self.all_users().collect(),
        };
        if let Some(id) = mentioned_id(&USER_MENTION, query) {
            return pool.into_iter().filter(|u| u.id.0 == id).cloned().collect();
        }
        find_by_name(pool.into_iter(), query, |u| u.name.as_str())
    }

    fn find_channels(&self, query: &str, guild: GuildId) -> Vec<Channel> {
        if guild != GUILD {
            return Vec::new();
        }
        if let Some(id) = mentioned_id(&CHANNEL_MENTION, query) {
            return self.channels.iter().filter(|c| c.id.0 == id).cloned().collect();
        }
        find_by_name(self.channels.iter(), query.trim_start_matches('#'), |c| c.name.as_str())
    }

    fn find_roles(&self, query: &str, guild: GuildId) -> Vec<Role> {
        if guild != GUILD {
            return Vec::new();
        }
        if let Some(id) = mentioned_id(&ROLE_MENTION, query) {
            return self.roles.iter().filter(|r| r.id.0 == id).cloned().collect();
        }
        find_by_name(self.roles.iter(), query, |r| r.name.as_str())
    }

    fn has_permission(&self, _user: UserId, _permission: Permission, _channel: ChannelId) -> bool {
        true
    }

    fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), PlatformError> {
        let target = format!("#{}", self.channel_name(channel));
        self.write_line(&target, text)
    }

    fn send_private_message(&self, user: UserId, text: &str) -> Result<(), PlatformError> {
        let target = format!("@{}", self.user_name(user));
        self.write_line(&target, text)
    }
}
