//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use herald_core::PermLevel;

// =============================================================================
// Bot Defaults
// =============================================================================

pub fn default_prefix() -> String {
    "%%".to_string()
}

pub fn default_bot_name() -> String {
    "herald".to_string()
}

// =============================================================================
// Fanout Defaults
// =============================================================================

pub fn default_max_concurrency() -> usize {
    64
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Console Defaults
// =============================================================================

pub fn default_console_author() -> String {
    "operator".to_string()
}

pub fn default_console_level() -> PermLevel {
    PermLevel::Owner
}
