//! Command tree and the recursive dispatch algorithm.
//!
//! A [`Command`] is plain data plus one callback. The tree is built once at
//! startup and is read-only afterwards, so dispatch needs no locking beyond
//! what the [`CooldownRegistry`] does internally.
//!
//! ## Dispatch order
//!
//! 1. `help` interception (before any gate)
//! 2. child delegation on the first token
//! 3. gates: DM, caller level, global ignore, bot write access, ban, bot
//!    permissions
//! 4. cooldown pre-check
//! 5. argument parsing
//! 6. cooldown commit
//! 7. execute, refunding the cooldown if the callback reports failure

use crate::args::{ArgumentSpec, ParseScope, ParsedArgs, parse_arguments};
use crate::cooldown::CooldownRegistry;
use crate::format::{join_path, split_token};
use crate::perm::PermLevel;
use crate::platform::{ChatPlatform, InboundMessage, Permission};
use crate::replies::{self, Rejection};
use regex::Regex;
use std::fmt;
use tracing::{debug, trace};

/// Execution callback. Returns `false` to signal failure, which refunds the
/// cooldown charge. The callback is responsible for telling the caller why.
pub type Executor = Box<dyn Fn(&ParsedArgs, &Invocation<'_>) -> bool + Send + Sync>;

/// Derives the cooldown key from the inbound message.
pub type CooldownKeyFn = Box<dyn Fn(&InboundMessage) -> String + Send + Sync>;

/// Everything a dispatch needs besides the command tree itself.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    pub message: &'a InboundMessage,
    pub platform: &'a dyn ChatPlatform,
    pub cooldowns: &'a CooldownRegistry,
    /// Command prefix, used when rendering usage lines.
    pub prefix: &'a str,
}

impl<'a> Invocation<'a> {
    pub fn new(
        message: &'a InboundMessage,
        platform: &'a dyn ChatPlatform,
        cooldowns: &'a CooldownRegistry,
        prefix: &'a str,
    ) -> Self {
        Self {
            message,
            platform,
            cooldowns,
            prefix,
        }
    }

    /// Send `text` to the invoking channel.
    pub fn reply(&self, text: &str) {
        if let Err(e) = self.platform.send_message(self.message.channel.id, text) {
            replies::log_send_failure(&e, "channel");
        }
    }

    /// Send `text` to the author privately.
    pub fn reply_private(&self, text: &str) {
        if let Err(e) = self.platform.send_private_message(self.message.author.id, text) {
            replies::log_send_failure(&e, "private");
        }
    }
}

/// One node of the command tree.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    help: String,
    long_help: String,
    arguments: Vec<ArgumentSpec>,
    children: Vec<Command>,
    required_permissions: Vec<Permission>,
    level: PermLevel,
    available_in_dm: bool,
    cooldown: u64,
    cooldown_key: Option<CooldownKeyFn>,
    separator: Option<Regex>,
    executor: Option<Executor>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: "No help information given.".to_string(),
            long_help: "There is no help information available for this command.".to_string(),
            arguments: Vec::new(),
            children: Vec::new(),
            required_permissions: Vec::new(),
            level: PermLevel::Everyone,
            available_in_dm: true,
            cooldown: 0,
            cooldown_key: None,
            separator: None,
            executor: None,
        }
    }

    /// Nameless node whose children are the top-level commands.
    pub fn root() -> Self {
        Self::new("")
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// One-line summary shown in the parent's subcommand list.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Description shown in this command's own help block.
    pub fn with_long_help(mut self, long_help: impl Into<String>) -> Self {
        self.long_help = long_help.into();
        self
    }

    pub fn with_argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    pub fn with_child(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_level(mut self, level: PermLevel) -> Self {
        self.level = level;
        self
    }

    /// Require the bot to hold `permission` in the invoking guild channel.
    pub fn with_required_permission(mut self, permission: Permission) -> Self {
        self.required_permissions.push(permission);
        self
    }

    pub fn with_dm(mut self, available: bool) -> Self {
        self.available_in_dm = available;
        self
    }

    /// Rate-limit this command for `seconds` per key produced by `key`.
    pub fn with_cooldown<F>(mut self, seconds: u64, key: F) -> Self
    where
        F: Fn(&InboundMessage) -> String + Send + Sync + 'static,
    {
        self.cooldown = seconds;
        self.cooldown_key = Some(Box::new(key));
        self
    }

    /// Pattern separating free-text style arguments from what follows them.
    pub fn with_separator(mut self, separator: Regex) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn with_executor<F>(mut self, executor: F) -> Self
    where
        F: Fn(&ParsedArgs, &Invocation<'_>) -> bool + Send + Sync + 'static,
    {
        self.executor = Some(Box::new(executor));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn long_help(&self) -> &str {
        &self.long_help
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn children(&self) -> &[Command] {
        &self.children
    }

    pub fn level(&self) -> PermLevel {
        self.level
    }

    pub fn required_permissions(&self) -> &[Permission] {
        &self.required_permissions
    }

    pub fn available_in_dm(&self) -> bool {
        self.available_in_dm
    }

    pub fn cooldown_seconds(&self) -> u64 {
        self.cooldown
    }

    /// Case-insensitive match against the name or any alias.
    pub fn is_command_for(&self, token: &str) -> bool {
        self.name.eq_ignore_ascii_case(token)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(token))
    }

    /// First child, in declaration order, that answers to `token`.
    pub fn find_child(&self, token: &str) -> Option<&Command> {
        self.children.iter().find(|c| c.is_command_for(token))
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Run this command (or one of its descendants) against `args`.
    ///
    /// `ignored` suppresses commands for non-admins; `banned` disables this
    /// command for everyone with a notice. Returns whether the command
    /// executed successfully. Every failure is resolved here, either as a
    /// reply to the caller or silently.
    pub fn run(
        &self,
        args: Option<&str>,
        invocation: &Invocation<'_>,
        perm: PermLevel,
        ignored: bool,
        banned: bool,
    ) -> bool {
        self.run_with_parent(args, invocation, perm, ignored, banned, "")
    }

    /// As [`run`](Self::run), with `parent` being the path of the command
    /// this one was reached through (used for usage lines).
    pub fn run_with_parent(
        &self,
        args: Option<&str>,
        invocation: &Invocation<'_>,
        perm: PermLevel,
        ignored: bool,
        banned: bool,
        parent: &str,
    ) -> bool {
        let path = join_path(parent, &self.name);
        let args = args.map(str::trim).filter(|a| !a.is_empty());

        if args.is_some_and(|a| a.eq_ignore_ascii_case("help")) {
            invocation.reply_private(&self.help_text(&path, invocation));
            return true;
        }

        if let Some(text) = args {
            let (token, rest) = split_token(text);
            if let Some(child) = self.find_child(token) {
                trace!(command = %path, child = %child.name, "delegating to subcommand");
                return child.run_with_parent(rest, invocation, perm, ignored, banned, &path);
            }
        }

        match self.dispatch(args, invocation, perm, ignored, banned, &path) {
            Ok(success) => success,
            Err(rejection) => {
                debug!(command = %path, outcome = rejection.label(), "command rejected");
                rejection.deliver(invocation);
                false
            }
        }
    }

    fn dispatch(
        &self,
        args: Option<&str>,
        invocation: &Invocation<'_>,
        perm: PermLevel,
        ignored: bool,
        banned: bool,
        path: &str,
    ) -> Result<bool, Rejection> {
        self.check_gates(invocation, perm, ignored, banned, path)?;

        let key = self
            .cooldown_key
            .as_ref()
            .map(|key_fn| key_fn(invocation.message));
        let key = key.as_deref();

        let remaining = invocation.cooldowns.check(key);
        if remaining > 0 {
            return Err(Rejection::Reply(replies::on_cooldown(remaining)));
        }

        let scope = ParseScope {
            platform: invocation.platform,
            guild: invocation.message.guild,
            separator: self.separator.as_ref(),
        };
        let usage = format!("{}{}", invocation.prefix, path);
        let parsed = parse_arguments(&self.arguments, args, &scope, &usage).inspect_err(|e| {
            debug!(command = %path, error = e.error_code(), "argument parsing failed");
        })?;

        let Some(executor) = &self.executor else {
            return Err(Rejection::Reply(replies::missing_subcommand(
                invocation.prefix,
                path,
            )));
        };

        let remaining = invocation.cooldowns.check_and_apply(key, self.cooldown);
        if remaining > 0 {
            return Err(Rejection::Reply(replies::on_cooldown(remaining)));
        }

        let success = executor(&parsed, invocation);
        if success {
            debug!(command = %path, "command executed");
        } else {
            invocation.cooldowns.reset(key);
            debug!(command = %path, "command failed, cooldown refunded");
        }
        Ok(success)
    }

    fn check_gates(
        &self,
        invocation: &Invocation<'_>,
        perm: PermLevel,
        ignored: bool,
        banned: bool,
        path: &str,
    ) -> Result<(), Rejection> {
        let message = invocation.message;
        let platform = invocation.platform;

        if !self.available_in_dm && message.is_direct() {
            return Err(Rejection::Reply(replies::NOT_VIA_DM.to_string()));
        }
        if !perm.is_at_least(self.level) {
            return Err(Rejection::Silent);
        }
        if ignored && !perm.is_at_least(PermLevel::Admin) {
            return Err(Rejection::Silent);
        }

        let in_guild = !message.is_direct();
        let me = platform.self_id();
        if in_guild && !platform.has_permission(me, Permission::SendMessages, message.channel.id) {
            return Err(Rejection::Private(replies::cant_send(&message.channel)));
        }

        if banned {
            return Err(Rejection::Reply(replies::banned_command(
                invocation.prefix,
                path,
                perm.is_at_least(PermLevel::Admin),
            )));
        }

        if in_guild
            && let Some(missing) = self
                .required_permissions
                .iter()
                .copied()
                .find(|p| !platform.has_permission(me, *p, message.channel.id))
        {
            return Err(Rejection::Reply(replies::need_permission(missing)));
        }

        Ok(())
    }

    /// Render the help block for this command reached via `path`.
    pub fn help_text(&self, path: &str, invocation: &Invocation<'_>) -> String {
        let prefix = invocation.prefix;
        let message = invocation.message;
        let location = if message.is_direct() {
            "via Direct Message".to_string()
        } else {
            format!("in {}", message.channel.mention())
        };

        let mut out = format!("**Available help for `{prefix}{path}` {location}**:\n");
        out.push_str(&format!(
            "Usage: `{prefix}{path}`{}",
            usage_args(&self.arguments)
        ));

        if !self.aliases.is_empty() {
            out.push_str("\nAliases:");
            for alias in &self.aliases {
                out.push_str(&format!(" `{alias}`"));
            }
        }
        out.push_str(&format!("\n*{}*\n", self.long_help));

        if !self.children.is_empty() {
            out.push_str("\n**Subcommands**:");
            let mut current = self.level;
            for child in &self.children {
                if child.level != current {
                    current = child.level;
                    out.push_str(&format!("\n**{}**:", current.group_header()));
                }
                out.push_str(&format!(
                    "\n`{prefix}{}`{} - {}",
                    join_path(path, &child.name),
                    usage_args(&child.arguments),
                    child.help
                ));
            }
        }
        out
    }
}

fn usage_args(specs: &[ArgumentSpec]) -> String {
    specs.iter().map(|s| format!(" {}", s.placeholder())).collect()
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("children", &self.children)
            .field("level", &self.level)
            .field("available_in_dm", &self.available_in_dm)
            .field("cooldown", &self.cooldown)
            .field("has_executor", &self.executor.is_some())
            .finish_non_exhaustive()
    }
}
