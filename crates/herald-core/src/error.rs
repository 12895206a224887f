//! Error types for the herald core.
//!
//! Argument errors double as the user-facing usage messages: their `Display`
//! output is sent verbatim to the caller, so wording matters here.

use crate::format::{format_duration, list_matches};
use thiserror::Error;

// ============================================================================
// Argument Errors (usage and resolution)
// ============================================================================

/// Failure to parse one positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Too few arguments provided. Try `{command} help` for more information.")]
    TooFew { command: String },

    #[error("`<{name}>` must be an integer between {min} and {max}.")]
    InvalidInteger { name: String, min: i64, max: i64 },

    #[error("`<{name}>` must be between {min} and {max} characters long.")]
    InvalidLength { name: String, min: i64, max: i64 },

    #[error("`{input}` is not a valid time. Try something like `1h30m` or `2 days`.")]
    InvalidTime { input: String },

    #[error(
        "`<{name}>` must be a time between {} and {}.",
        duration_bound(.min),
        duration_bound(.max)
    )]
    TimeOutOfRange { name: String, min: i64, max: i64 },

    #[error("`<{name}>` cannot be used in a Direct Message.")]
    NotInDirectMessage { name: String },

    #[error("No {kind} found matching \"{query}\".")]
    NoneFound { kind: &'static str, query: String },

    #[error("{}", list_matches(.kind, .query, .candidates))]
    Ambiguous {
        kind: &'static str,
        query: String,
        candidates: Vec<String>,
    },
}

fn duration_bound(seconds: &i64) -> String {
    format_duration(u64::try_from(*seconds).unwrap_or(0))
}

impl ArgumentError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TooFew { .. } => "too_few_args",
            Self::InvalidInteger { .. } => "invalid_integer",
            Self::InvalidLength { .. } => "invalid_length",
            Self::InvalidTime { .. } => "invalid_time",
            Self::TimeOutOfRange { .. } => "time_out_of_range",
            Self::NotInDirectMessage { .. } => "not_in_dm",
            Self::NoneFound { .. } => "none_found",
            Self::Ambiguous { .. } => "ambiguous",
        }
    }
}

// ============================================================================
// Platform Errors
// ============================================================================

/// Errors reported by a [`ChatPlatform`](crate::platform::ChatPlatform)
/// implementation when delivering outbound messages.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("rate limited by platform")]
    RateLimited,
}

// ============================================================================
// Fanout Errors
// ============================================================================

/// Errors from the event fanout manager.
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("event fanout has been shut down")]
    ShutDown,

    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
