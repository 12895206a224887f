//! Caller permission tiers.

use serde::Deserialize;
use std::fmt;

/// Ordered capability tier of a caller. A command requires callers to be
/// at least its level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermLevel {
    #[default]
    Everyone,
    Moderator,
    Admin,
    Owner,
}

impl PermLevel {
    #[inline]
    pub fn is_at_least(self, required: PermLevel) -> bool {
        self >= required
    }

    /// Header shown above a run of subcommands at this level in help output.
    pub fn group_header(self) -> &'static str {
        match self {
            Self::Everyone => "Commands",
            Self::Moderator => "Moderator Commands",
            Self::Admin => "Admin Commands",
            Self::Owner => "Owner Commands",
        }
    }
}

impl fmt::Display for PermLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Everyone => "everyone",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
            Self::Owner => "owner",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(PermLevel::Everyone < PermLevel::Moderator);
        assert!(PermLevel::Moderator < PermLevel::Admin);
        assert!(PermLevel::Admin < PermLevel::Owner);
        assert!(PermLevel::Owner.is_at_least(PermLevel::Admin));
        assert!(!PermLevel::Moderator.is_at_least(PermLevel::Admin));
    }

    #[test]
    fn levels_deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: PermLevel,
        }
        let w: Wrapper = toml::from_str("level = \"moderator\"").unwrap();
        assert_eq!(w.level, PermLevel::Moderator);
    }
}
