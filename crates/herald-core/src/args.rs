//! Positional argument specifications and their parsers.
//!
//! Each [`ArgumentSpec`] greedily consumes a prefix of the residual text and
//! hands the remainder to the next spec. There is no backtracking: once a spec
//! has taken its prefix, later specs only ever see what is left.
//!
//! # Splitting rules
//!
//! | Kind | Consumes |
//! |------|----------|
//! | `Integer`, `ShortString`, `Channel` | next whitespace token |
//! | `LongString`, `Duration`, `User`, `LocalUser`, `Role` | up to the command's separator, or everything |
//!
//! `Duration` additionally hands back any trailing text its grammar did not
//! recognise.

use crate::error::ArgumentError;
use crate::format::{non_empty, split_on, split_token};
use crate::platform::{Channel, ChatPlatform, GuildId, Role, User, UserScope};
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

/// Leading run of `<int><unit>` groups, optionally comma separated.
static DURATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\s*\d+\s*(?:d(?:ays?)?|h(?:(?:ou)?rs?)?|m(?:in(?:ute)?s?)?|s(?:ec(?:ond)?s?)?)\s?,?)*",
    )
    .expect("duration prefix pattern is valid")
});

/// One `<int><unit>` group inside an already-matched duration prefix.
static DURATION_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*([dhms])").expect("duration group pattern is valid")
});

/// The closed set of argument grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    Integer,
    ShortString,
    LongString,
    Duration,
    User,
    /// A member of the current guild only; never searches globally.
    LocalUser,
    Channel,
    Role,
}

impl ArgumentKind {
    fn default_bounds(self) -> (i64, i64) {
        match self {
            Self::Integer => (i64::MIN, i64::MAX),
            Self::ShortString => (1, 100),
            Self::LongString => (1, 2000),
            Self::Duration => (0, i64::MAX),
            Self::User | Self::LocalUser | Self::Channel | Self::Role => (0, 0),
        }
    }
}

/// Declarative description of one positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub kind: ArgumentKind,
    pub name: String,
    /// Value bound for `Integer`/`Duration`, character-length bound for strings.
    pub min: i64,
    pub max: i64,
    pub required: bool,
}

impl ArgumentSpec {
    pub fn new(kind: ArgumentKind, name: impl Into<String>) -> Self {
        let (min, max) = kind.default_bounds();
        Self {
            kind,
            name: name.into(),
            min,
            max,
            required: true,
        }
    }

    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(ArgumentKind::Integer, name).bounded(min, max)
    }

    pub fn short_string(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(ArgumentKind::ShortString, name).bounded(min, max)
    }

    pub fn long_string(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(ArgumentKind::LongString, name).bounded(min, max)
    }

    /// Bounds are in seconds.
    pub fn duration(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(ArgumentKind::Duration, name).bounded(min, max)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(ArgumentKind::User, name)
    }

    pub fn local_user(name: impl Into<String>) -> Self {
        Self::new(ArgumentKind::LocalUser, name)
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Channel, name)
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Role, name)
    }

    pub fn bounded(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// `<name>` for required arguments, `[name]` for optional ones.
    pub fn placeholder(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }

    /// Parse this argument from the front of `text`.
    ///
    /// On success returns the value and whatever text is left for the next
    /// argument.
    pub(crate) fn parse<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        match self.kind {
            ArgumentKind::Integer => self.parse_integer(text),
            ArgumentKind::ShortString => self.parse_short_string(text),
            ArgumentKind::LongString => self.parse_long_string(text, scope),
            ArgumentKind::Duration => self.parse_duration(text, scope),
            ArgumentKind::User => self.parse_user(text, scope),
            ArgumentKind::LocalUser => self.parse_local_user(text, scope),
            ArgumentKind::Channel => self.parse_channel(text, scope),
            ArgumentKind::Role => self.parse_role(text, scope),
        }
    }

    fn parse_integer<'t>(&self, text: &'t str) -> Parsed<'t> {
        let (token, rest) = split_token(text);
        match token.parse::<i64>() {
            Ok(n) if (self.min..=self.max).contains(&n) => Ok((ArgumentValue::Integer(n), rest)),
            _ => Err(ArgumentError::InvalidInteger {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            }),
        }
    }

    fn parse_short_string<'t>(&self, text: &'t str) -> Parsed<'t> {
        let (token, rest) = split_token(text);
        self.check_length(token)?;
        Ok((ArgumentValue::Text(token.to_string()), rest))
    }

    fn parse_long_string<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let (head, rest) = scope.split(text);
        self.check_length(head)?;
        Ok((ArgumentValue::Text(head.to_string()), rest))
    }

    fn parse_duration<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let text = text.trim();
        let (head, rest) = scope.split(text);
        let Some((seconds, consumed)) = duration_prefix(head) else {
            return Err(ArgumentError::InvalidTime {
                input: head.to_string(),
            });
        };

        // `head` is a prefix of `text`, so unrecognised trailing text and
        // anything past the separator are handed on together.
        let rest = if consumed < head.len() {
            non_empty(text[consumed..].trim())
        } else {
            rest
        };

        match i64::try_from(seconds) {
            Ok(s) if (self.min..=self.max).contains(&s) => Ok((ArgumentValue::Duration(seconds), rest)),
            _ => Err(ArgumentError::TimeOutOfRange {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            }),
        }
    }

    fn parse_user<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let (query, rest) = scope.split(text);
        let mut users = match scope.guild {
            Some(guild) => scope.platform.find_users(query, UserScope::Guild(guild)),
            None => Vec::new(),
        };
        if users.is_empty() {
            users = scope.platform.find_users(query, UserScope::Global);
        }
        let user = exactly_one(users, "users", query)?;
        Ok((ArgumentValue::User(user), rest))
    }

    fn parse_local_user<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let guild = self.guild_only(scope)?;
        let (query, rest) = scope.split(text);
        let users = scope.platform.find_users(query, UserScope::Guild(guild));
        let user = exactly_one(users, "users", query)?;
        Ok((ArgumentValue::User(user), rest))
    }

    fn parse_channel<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let guild = self.guild_only(scope)?;
        let (query, rest) = split_token(text);
        let channels = scope.platform.find_channels(query, guild);
        let channel = exactly_one(channels, "text channels", query)?;
        Ok((ArgumentValue::Channel(channel), rest))
    }

    fn parse_role<'t>(&self, text: &'t str, scope: &ParseScope<'_>) -> Parsed<'t> {
        let guild = self.guild_only(scope)?;
        let (query, rest) = scope.split(text);
        let roles = scope.platform.find_roles(query, guild);
        let role = exactly_one(roles, "roles", query)?;
        Ok((ArgumentValue::Role(role), rest))
    }

    fn guild_only(&self, scope: &ParseScope<'_>) -> Result<GuildId, ArgumentError> {
        scope.guild.ok_or_else(|| ArgumentError::NotInDirectMessage {
            name: self.name.clone(),
        })
    }

    fn check_length(&self, text: &str) -> Result<(), ArgumentError> {
        let len = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);
        if (self.min..=self.max).contains(&len) {
            Ok(())
        } else {
            Err(ArgumentError::InvalidLength {
                name: self.name.clone(),
                min: self.min,
                max: self.max,
            })
        }
    }
}

fn exactly_one<T: Display>(
    mut found: Vec<T>,
    kind: &'static str,
    query: &str,
) -> Result<T, ArgumentError> {
    match found.len() {
        0 => Err(ArgumentError::NoneFound {
            kind,
            query: query.to_string(),
        }),
        1 => Ok(found.remove(0)),
        _ => Err(ArgumentError::Ambiguous {
            kind,
            query: query.to_string(),
            candidates: found.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// Seconds in the leading duration expression of `text` and the byte length
/// it spans. `None` if no `<int><unit>` group is recognised or the total
/// overflows.
fn duration_prefix(text: &str) -> Option<(u64, usize)> {
    let consumed = DURATION_PREFIX.find(text).map_or(0, |m| m.end());
    let matched = &text[..consumed];

    let mut total: u64 = 0;
    let mut groups = 0usize;
    for caps in DURATION_GROUP.captures_iter(matched) {
        let amount: u64 = caps[1].parse().ok()?;
        let unit = match caps[2].as_bytes()[0].to_ascii_lowercase() {
            b'd' => 86_400,
            b'h' => 3_600,
            b'm' => 60,
            _ => 1,
        };
        total = total.checked_add(amount.checked_mul(unit)?)?;
        groups += 1;
    }

    (groups > 0).then_some((total, consumed))
}

/// Parse a composite duration such as `1d2h3m4s` or `5 min, 30 sec`.
///
/// Returns the total seconds and the unrecognised trailing text.
pub fn parse_duration(text: &str) -> Option<(u64, &str)> {
    let (seconds, consumed) = duration_prefix(text)?;
    Some((seconds, text[consumed..].trim()))
}

/// A successfully parsed argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Integer(i64),
    Text(String),
    /// Total seconds.
    Duration(u64),
    User(User),
    Channel(Channel),
    Role(Role),
}

impl ArgumentValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<u64> {
        match self {
            Self::Duration(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Self::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            Self::Role(r) => Some(r),
            _ => None,
        }
    }
}

/// Parsed arguments, one slot per declared spec.
///
/// Slots after an exhausted optional argument stay unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: Vec<Option<ArgumentValue>>,
    trailing: Option<String>,
}

impl ParsedArgs {
    pub fn get(&self, index: usize) -> Option<&ArgumentValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of declared slots (set or not).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text left over after the last spec consumed its prefix.
    pub fn trailing(&self) -> Option<&str> {
        self.trailing.as_deref()
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(ArgumentValue::as_integer)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(ArgumentValue::as_text)
    }

    pub fn duration(&self, index: usize) -> Option<u64> {
        self.get(index).and_then(ArgumentValue::as_duration)
    }

    pub fn user(&self, index: usize) -> Option<&User> {
        self.get(index).and_then(ArgumentValue::as_user)
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.get(index).and_then(ArgumentValue::as_channel)
    }

    pub fn role(&self, index: usize) -> Option<&Role> {
        self.get(index).and_then(ArgumentValue::as_role)
    }
}

/// What an argument parser may consult besides its input text.
pub(crate) struct ParseScope<'a> {
    pub platform: &'a dyn ChatPlatform,
    pub guild: Option<GuildId>,
    pub separator: Option<&'a Regex>,
}

impl ParseScope<'_> {
    fn split<'t>(&self, text: &'t str) -> (&'t str, Option<&'t str>) {
        match self.separator {
            Some(separator) => split_on(text, separator),
            None => (text.trim(), None),
        }
    }
}

pub(crate) type Parsed<'t> = Result<(ArgumentValue, Option<&'t str>), ArgumentError>;

/// Run every spec in order against `input`.
///
/// `command` is the fully qualified invocation used in the "too few
/// arguments" message.
pub(crate) fn parse_arguments(
    specs: &[ArgumentSpec],
    input: Option<&str>,
    scope: &ParseScope<'_>,
    command: &str,
) -> Result<ParsedArgs, ArgumentError> {
    let mut values = vec![None; specs.len()];
    let mut working = input;

    for (slot, spec) in values.iter_mut().zip(specs) {
        let Some(text) = working else {
            if spec.required {
                return Err(ArgumentError::TooFew {
                    command: command.to_string(),
                });
            }
            break;
        };
        let (value, rest) = spec.parse(text, scope)?;
        *slot = Some(value);
        working = rest;
    }

    Ok(ParsedArgs {
        values,
        trailing: working.map(str::to_string),
    })
}
