//! Prefix handling and top-level dispatch.
//!
//! The [`Router`] owns the command tree and the shared cooldown registry. It
//! recognises the command prefix, resolves the top-level command for ban
//! lookups and usage counters, then hands the residual text to the root
//! [`Command`].

use crate::command::{Command, Invocation};
use crate::cooldown::CooldownRegistry;
use crate::format::{non_empty, split_token};
use crate::perm::PermLevel;
use crate::platform::{ChatPlatform, InboundMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, span, trace};

pub struct Router {
    root: Command,
    prefix: String,
    cooldowns: Arc<CooldownRegistry>,
    /// Invocation count per top-level command (canonical name).
    /// Populated for every child in `new()` and never resized.
    command_counts: HashMap<String, AtomicU64>,
}

impl Router {
    pub fn new(root: Command, prefix: impl Into<String>, cooldowns: Arc<CooldownRegistry>) -> Self {
        let command_counts = root
            .children()
            .iter()
            .map(|c| (c.name().to_ascii_lowercase(), AtomicU64::new(0)))
            .collect();
        Self {
            root,
            prefix: prefix.into(),
            cooldowns,
            command_counts,
        }
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn cooldowns(&self) -> &Arc<CooldownRegistry> {
        &self.cooldowns
    }

    /// Handle one inbound message.
    ///
    /// Messages without the prefix are ignored and return `false` without
    /// any reply. `banned` is asked about the canonical name of the
    /// top-level command being invoked.
    pub fn handle_message<B>(
        &self,
        message: &InboundMessage,
        platform: &dyn ChatPlatform,
        perm: PermLevel,
        ignored: bool,
        banned: B,
    ) -> bool
    where
        B: Fn(&str) -> bool,
    {
        let Some(rest) = message.text.trim_start().strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        let args = non_empty(rest.trim());

        let top = args.and_then(|text| self.root.find_child(split_token(text).0));
        let is_banned = top.is_some_and(|cmd| banned(cmd.name()));
        if let Some(cmd) = top
            && let Some(counter) = self.command_counts.get(&cmd.name().to_ascii_lowercase())
        {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let command_span = span!(
            Level::DEBUG,
            "herald.command",
            command = top.map(Command::name),
            author = %message.author.id,
            channel = %message.channel.id,
            direct = message.is_direct(),
        );
        let _enter = command_span.enter();
        trace!(perm = %perm, ignored, banned = is_banned, "routing message");

        let invocation = Invocation::new(message, platform, &self.cooldowns, &self.prefix);
        self.run_root(args, &invocation, perm, ignored, is_banned)
    }

    fn run_root(
        &self,
        args: Option<&str>,
        invocation: &Invocation<'_>,
        perm: PermLevel,
        ignored: bool,
        banned: bool,
    ) -> bool {
        self.root.run(args, invocation, perm, ignored, banned)
    }

    /// Usage counts for top-level commands that have been invoked, most used
    /// first.
    pub fn command_stats(&self) -> Vec<(&str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(name, count)| (name.as_str(), count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();
        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("commands", &self.command_counts.len())
            .finish_non_exhaustive()
    }
}
