//! Demo command tree served by the console harness.

use crate::console::ConsolePlatform;
use herald_core::cooldown::{per_channel, per_user};
use herald_core::{
    ArgumentSpec, ChatPlatform, Command, CooldownRegistry, PermLevel, Permission,
    format_duration,
};
use rand::Rng;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

const MAX_REMINDER: i64 = 30 * 86_400;
const MAX_MUTE: i64 = 28 * 86_400;

/// Shared handles the executors close over.
pub struct Services {
    pub platform: Arc<ConsolePlatform>,
    pub cooldowns: Arc<CooldownRegistry>,
    /// Messages seen by the fanout counter listener.
    pub messages_seen: Arc<AtomicU64>,
    pub runtime: Handle,
}

/// Build the root of the demo command tree.
pub fn build(services: &Services) -> Result<Command, regex::Error> {
    Ok(Command::root()
        .with_child(ping())
        .with_child(roll())
        .with_child(remind(services)?)
        .with_child(echo())
        .with_child(whois())
        .with_child(channel_info())
        .with_child(stats(services))
        .with_child(moderation(services)?))
}

fn ping() -> Command {
    Command::new("ping")
        .with_alias("pong")
        .with_help("Check that the bot is alive")
        .with_executor(|_, inv| {
            inv.reply("Pong!");
            true
        })
}

fn roll() -> Command {
    Command::new("roll")
        .with_alias("dice")
        .with_help("Roll a die")
        .with_long_help("Rolls a die with the given number of sides (6 by default).")
        .with_argument(ArgumentSpec::integer("sides", 2, 1_000).optional())
        .with_cooldown(3, per_channel("roll"))
        .with_executor(|args, inv| {
            let sides = args.integer(0).unwrap_or(6);
            let rolled = rand::thread_rng().gen_range(1..=sides);
            inv.reply(&format!(
                "{} rolled a **{rolled}** (d{sides}).",
                inv.message.author.name
            ));
            true
        })
}

fn remind(services: &Services) -> Result<Command, regex::Error> {
    let platform = Arc::clone(&services.platform);
    let runtime = services.runtime.clone();
    Ok(Command::new("remind")
        .with_alias("remindme")
        .with_help("Set a reminder")
        .with_long_help("Sends you a private reminder after the given time. Separate the time from the text with `|`.")
        .with_separator(Regex::new(r"\s*\|\s*")?)
        .with_argument(ArgumentSpec::duration("time", 60, MAX_REMINDER))
        .with_argument(ArgumentSpec::long_string("message", 1, 200))
        .with_cooldown(10, per_user("remind"))
        .with_executor(move |args, inv| {
            let (Some(seconds), Some(text)) = (args.duration(0), args.text(1)) else {
                return false;
            };
            let platform = Arc::clone(&platform);
            let user = inv.message.author.id;
            let text = text.to_string();
            runtime.spawn(async move {
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                if let Err(e) = platform.send_private_message(user, &format!("Reminder: {text}")) {
                    warn!(user = %user, error = %e, "failed to deliver reminder");
                }
            });
            inv.reply(&format!("I'll remind you in {}.", format_duration(seconds)));
            true
        }))
}

fn echo() -> Command {
    Command::new("echo")
        .with_alias("say")
        .with_help("Repeat some text")
        .with_argument(ArgumentSpec::long_string("text", 1, 2_000))
        .with_executor(|args, inv| match args.text(0) {
            Some(text) => {
                inv.reply(text);
                true
            }
            None => false,
        })
}

fn whois() -> Command {
    Command::new("whois")
        .with_help("Look up a user")
        .with_long_help("Finds a user in this server, or anywhere the bot can see.")
        .with_argument(ArgumentSpec::user("user"))
        .with_executor(|args, inv| {
            let Some(user) = args.user(0) else {
                return false;
            };
            inv.reply(&format!("{user}\nMention: <@{}>", user.id));
            true
        })
}

fn channel_info() -> Command {
    Command::new("channel")
        .with_help("Show a text channel")
        .with_dm(false)
        .with_argument(ArgumentSpec::channel("channel"))
        .with_executor(|args, inv| {
            let Some(channel) = args.channel(0) else {
                return false;
            };
            inv.reply(&format!("{channel}\nMention: {}", channel.mention()));
            true
        })
}

fn stats(services: &Services) -> Command {
    let seen = Arc::clone(&services.messages_seen);
    let cooldowns = Arc::clone(&services.cooldowns);
    Command::new("stats")
        .with_help("Show bot statistics")
        .with_executor(move |_, inv| {
            inv.reply(&format!(
                "Messages seen: **{}**\nCooldown keys tracked: **{}**",
                seen.load(Ordering::Relaxed),
                cooldowns.len()
            ));
            true
        })
}

fn moderation(services: &Services) -> Result<Command, regex::Error> {
    Ok(Command::new("mod")
        .with_alias("m")
        .with_help("Moderation tools")
        .with_long_help("Commands for server moderators.")
        .with_level(PermLevel::Moderator)
        .with_dm(false)
        .with_child(mute()?)
        .with_child(purge())
        .with_child(sweep(services)))
}

fn mute() -> Result<Command, regex::Error> {
    Ok(Command::new("mute")
        .with_help("Mute a member for a while")
        .with_long_help("Mutes a member of this server. Example: `mute bob for 10m spamming`.")
        .with_level(PermLevel::Moderator)
        .with_dm(false)
        .with_required_permission(Permission::ManageRoles)
        .with_separator(Regex::new(r"\s+for\s+")?)
        .with_argument(ArgumentSpec::local_user("member"))
        .with_argument(ArgumentSpec::duration("time", 60, MAX_MUTE))
        .with_argument(ArgumentSpec::long_string("reason", 1, 500).optional())
        .with_executor(|args, inv| {
            let (Some(member), Some(seconds)) = (args.user(0), args.duration(1)) else {
                return false;
            };
            let reason = args.text(2).unwrap_or("no reason given");
            info!(member = %member.id, seconds, moderator = %inv.message.author.id, "member muted");
            inv.reply(&format!(
                "Muted {member} for {} ({reason}).",
                format_duration(seconds)
            ));
            true
        }))
}

fn purge() -> Command {
    Command::new("purge")
        .with_alias("clean")
        .with_help("Delete recent messages")
        .with_level(PermLevel::Moderator)
        .with_dm(false)
        .with_required_permission(Permission::ManageMessages)
        .with_argument(ArgumentSpec::integer("count", 2, 100))
        .with_cooldown(5, per_channel("purge"))
        .with_executor(|args, inv| {
            let Some(count) = args.integer(0) else {
                return false;
            };
            inv.reply(&format!("Deleted {count} messages."));
            true
        })
}

fn sweep(services: &Services) -> Command {
    let cooldowns = Arc::clone(&services.cooldowns);
    Command::new("cooldowns")
        .with_help("Drop expired cooldown entries")
        .with_level(PermLevel::Admin)
        .with_executor(move |_, inv| {
            let removed = cooldowns.purge_expired();
            inv.reply(&format!(
                "Removed {removed} expired entries; {} remain.",
                cooldowns.len()
            ));
            true
        })
}
