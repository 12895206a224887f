//! Caller-facing replies for gate failures.
//!
//! Every way a dispatch can be refused is a [`Rejection`]: it either names
//! where its notice goes or is explicitly silent. No gate drops a notice by
//! accident.

use crate::command::Invocation;
use crate::error::ArgumentError;
use crate::format::{format_duration, join_path};
use crate::platform::{Channel, Permission};
use tracing::warn;

pub const NOT_VIA_DM: &str = "This command is not available via Direct Message.";

pub fn cant_send(channel: &Channel) -> String {
    format!(
        "I cannot send messages in {}. Ask a server admin to grant me the `{}` permission there.",
        channel.mention(),
        Permission::SendMessages
    )
}

pub fn banned_command(prefix: &str, command: &str, caller_is_admin: bool) -> String {
    let mut text = String::from("This command has been disabled in this channel.");
    if caller_is_admin {
        text.push_str(&format!(
            "\nAdmins can re-enable it with `{prefix}enable {command}`."
        ));
    }
    text
}

pub fn need_permission(permission: Permission) -> String {
    format!("I need the `{permission}` permission to do that.")
}

pub fn on_cooldown(seconds: u64) -> String {
    format!(
        "This command is on cooldown for another {}.",
        format_duration(seconds)
    )
}

pub fn missing_subcommand(prefix: &str, command: &str) -> String {
    format!(
        "Please choose a subcommand. Try `{prefix}{}` for a list.",
        join_path(command, "help")
    )
}

/// Why a dispatch was refused, and how the caller hears about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Drop without feedback. Used where replying would leak that the
    /// command exists.
    Silent,
    /// Reply in the invoking channel (the DM itself for direct messages).
    Reply(String),
    /// Reply to the author privately.
    Private(String),
}

impl Rejection {
    /// Static label for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Reply(_) => "reply",
            Self::Private(_) => "private",
        }
    }

    pub(crate) fn deliver(self, invocation: &Invocation<'_>) {
        match self {
            Self::Silent => {}
            Self::Reply(text) => invocation.reply(&text),
            Self::Private(text) => invocation.reply_private(&text),
        }
    }
}

impl From<ArgumentError> for Rejection {
    fn from(err: ArgumentError) -> Self {
        Self::Reply(err.to_string())
    }
}

/// Log and swallow a delivery failure; the dispatch result does not depend
/// on whether the notice arrived.
pub(crate) fn log_send_failure(err: &crate::error::PlatformError, destination: &str) {
    warn!(error = %err, destination, "failed to deliver reply");
}
