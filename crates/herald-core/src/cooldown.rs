//! Per-key command cooldowns.
//!
//! Keys are opaque strings derived from an invocation (per user, per channel,
//! per guild...). Each key maps to the epoch second at which it expires.
//!
//! # Concurrency
//!
//! `check_and_apply` runs under the DashMap shard lock for the key, so two
//! concurrent invocations can never both observe "not on cooldown" and both
//! charge the same key.
//!
//! Entries are never evicted implicitly. Call [`CooldownRegistry::purge_expired`]
//! from a maintenance task if the key space is unbounded.

use crate::platform::InboundMessage;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::debug;

/// Source of "now" in epoch seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Thread-safe cooldown registry.
pub struct CooldownRegistry {
    /// key -> expiry (epoch seconds).
    entries: DashMap<String, i64>,
    clock: Clock,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(|| Utc::now().timestamp()))
    }

    /// Registry driven by a custom clock. Used by tests to move time.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    #[inline]
    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Seconds remaining on `key`, or 0 if unset, expired or `None`.
    pub fn check(&self, key: Option<&str>) -> u64 {
        let Some(key) = key else {
            return 0;
        };
        let now = self.now();
        self.entries
            .get(key)
            .map_or(0, |expires_at| remaining(*expires_at, now))
    }

    /// Atomically check `key` and, if it is free, charge it for `duration`
    /// seconds.
    ///
    /// Returns 0 when the caller won the charge (or nothing was charged
    /// because `key` is `None` or `duration` is 0), otherwise the seconds
    /// remaining on the existing entry, which is left untouched.
    pub fn check_and_apply(&self, key: Option<&str>, duration: u64) -> u64 {
        let Some(key) = key else {
            return 0;
        };
        if duration == 0 {
            return self.check(Some(key));
        }

        let now = self.now();
        let expires_at = now.saturating_add(i64::try_from(duration).unwrap_or(i64::MAX));
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                let left = remaining(*entry.get(), now);
                if left > 0 {
                    return left;
                }
                entry.insert(expires_at);
            }
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
            }
        }
        debug!(key = %key, duration, "cooldown applied");
        0
    }

    /// Remove `key`, refunding any active charge.
    pub fn reset(&self, key: Option<&str>) {
        if let Some(key) = key
            && self.entries.remove(key).is_some()
        {
            debug!(key = %key, "cooldown reset");
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "purged expired cooldowns");
        }
        removed
    }

    /// Number of tracked keys, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CooldownRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownRegistry")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Key builders
// ============================================================================

/// One cooldown per author, per command.
pub fn per_user(command: &str) -> impl Fn(&InboundMessage) -> String + Send + Sync + 'static {
    let command = command.to_ascii_lowercase();
    move |message| format!("{command}|U:{}", message.author.id)
}

/// One cooldown per channel, per command.
pub fn per_channel(command: &str) -> impl Fn(&InboundMessage) -> String + Send + Sync + 'static {
    let command = command.to_ascii_lowercase();
    move |message| format!("{command}|C:{}", message.channel.id)
}

/// One cooldown per guild, per command. Direct messages fall back to the
/// channel.
pub fn per_guild(command: &str) -> impl Fn(&InboundMessage) -> String + Send + Sync + 'static {
    let command = command.to_ascii_lowercase();
    move |message| match message.guild {
        Some(guild) => format!("{command}|G:{guild}"),
        None => format!("{command}|C:{}", message.channel.id),
    }
}

#[inline]
fn remaining(expires_at: i64, now: i64) -> u64 {
    u64::try_from(expires_at.saturating_sub(now)).unwrap_or(0)
}
