//! # herald-core
//!
//! Command routing and event fanout for chat bots.
//!
//! ## Features
//!
//! - Hierarchical command trees with aliases, permission levels and DM gating
//! - Typed argument parsing (integers, strings, durations, users, channels,
//!   roles) with caller-facing error messages
//! - Per-key cooldowns with atomic check-and-charge and refund on failure
//! - Concurrent event fanout with failure isolation and a bounded worker pool
//!
//! The chat platform itself is abstracted behind [`ChatPlatform`], so the
//! same tree runs against a live gateway, a console or a test double.

#![deny(clippy::all)]

//! ## Quick Start
//!
//! ```rust
//! use herald_core::{CooldownRegistry, parse_duration};
//!
//! assert_eq!(parse_duration("1h30m then"), Some((5_400, "then")));
//!
//! let cooldowns = CooldownRegistry::new();
//! assert_eq!(cooldowns.check_and_apply(Some("roll|U:1"), 30), 0);
//! assert!(cooldowns.check(Some("roll|U:1")) > 0);
//! ```

pub mod args;
pub mod command;
pub mod cooldown;
pub mod error;
pub mod fanout;
pub mod format;
pub mod perm;
pub mod platform;
pub mod replies;
pub mod router;

pub use self::args::{ArgumentKind, ArgumentSpec, ArgumentValue, ParsedArgs, parse_duration};
pub use self::command::{Command, CooldownKeyFn, Executor, Invocation};
pub use self::cooldown::{Clock, CooldownRegistry};
pub use self::error::{ArgumentError, FanoutError, PlatformError};
pub use self::fanout::{EventFanoutManager, EventListener, FanoutConfig, FnListener};
pub use self::format::format_duration;
pub use self::perm::PermLevel;
pub use self::platform::{
    Channel, ChannelId, ChatPlatform, GuildId, InboundMessage, Permission, Role, RoleId, User,
    UserId, UserScope,
};
pub use self::replies::Rejection;
pub use self::router::Router;
