//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.prefix must not be empty")]
    EmptyPrefix,
    #[error("bot.prefix must not contain whitespace, got {0:?}")]
    PrefixWhitespace(String),
    #[error("bot.name is required")]
    MissingBotName,
    #[error("fanout.max_concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("fanout.listener_timeout_secs must be at least 1 when set")]
    ZeroListenerTimeout,
    #[error("cooldowns.purge_interval_secs must be at least 1 when set")]
    ZeroPurgeInterval,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.bot.prefix;
    if prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::PrefixWhitespace(prefix.clone()));
    }
    if config.bot.name.trim().is_empty() {
        errors.push(ValidationError::MissingBotName);
    }

    if config.fanout.max_concurrency == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if config.fanout.listener_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroListenerTimeout);
    }
    if config.cooldowns.purge_interval_secs == Some(0) {
        errors.push(ValidationError::ZeroPurgeInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
