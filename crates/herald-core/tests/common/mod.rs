//! Integration test common infrastructure.
//!
//! Provides a recording chat platform and helpers for building inbound
//! messages and running commands against it.

pub mod platform;

#[allow(unused_imports)]
pub use platform::{MockPlatform, Outbound};

use herald_core::{
    Channel, Command, CooldownRegistry, GuildId, InboundMessage, Invocation, PermLevel, User,
};

pub const PREFIX: &str = "%%";
pub const GUILD: GuildId = GuildId(100);
pub const GENERAL: u64 = 200;
pub const DM_CHANNEL: u64 = 201;
pub const AUTHOR: u64 = 300;

/// The default invoking author.
#[allow(dead_code)]
pub fn author() -> User {
    User::new(AUTHOR, "caller")
}

/// A message posted in `#general` of the test guild.
#[allow(dead_code)]
pub fn guild_message(text: &str) -> InboundMessage {
    InboundMessage::in_guild(GUILD, Channel::new(GENERAL, "general"), author(), text)
}

/// A message sent to the bot privately.
#[allow(dead_code)]
pub fn dm_message(text: &str) -> InboundMessage {
    InboundMessage::direct(Channel::new(DM_CHANNEL, "dm"), author(), text)
}

/// Run `command` directly (no router) with the given residual text.
#[allow(dead_code)]
pub fn run(
    command: &Command,
    platform: &MockPlatform,
    cooldowns: &CooldownRegistry,
    message: &InboundMessage,
    args: Option<&str>,
    perm: PermLevel,
) -> bool {
    let invocation = Invocation::new(message, platform, cooldowns, PREFIX);
    command.run(args, &invocation, perm, false, false)
}
