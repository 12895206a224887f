//! Text helpers shared by the argument parser and reply builders.

use regex::Regex;

/// Maximum number of candidates listed in a disambiguation reply.
const MAX_LISTED: usize = 4;

#[inline]
pub(crate) fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() { None } else { Some(text) }
}

/// Split off the first whitespace-delimited token.
///
/// Returns the token and the trimmed remainder, or `None` when nothing
/// follows the token.
pub fn split_token(text: &str) -> (&str, Option<&str>) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, non_empty(rest.trim_start())),
        None => (text, None),
    }
}

/// Split on the first match of `separator`.
///
/// Without a match the whole (trimmed) text is the head.
pub fn split_on<'t>(text: &'t str, separator: &Regex) -> (&'t str, Option<&'t str>) {
    let text = text.trim();
    match separator.find(text) {
        Some(m) => (text[..m.start()].trim_end(), non_empty(text[m.end()..].trim())),
        None => (text, None),
    }
}

/// Join a parent command path and a child name with a single space.
pub fn join_path(parent: &str, name: &str) -> String {
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent} {name}"),
    }
}

/// Render seconds as "1 day, 2 hours, 3 minutes and 4 seconds".
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0 seconds".to_string();
    }

    let units = [
        (seconds / 86_400, "day"),
        ((seconds % 86_400) / 3_600, "hour"),
        ((seconds % 3_600) / 60, "minute"),
        (seconds % 60, "second"),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

    match parts.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        None => "0 seconds".to_string(),
    }
}

/// Disambiguation reply listing candidates for an ambiguous lookup.
pub fn list_matches(kind: &str, query: &str, candidates: &[String]) -> String {
    let mut out = format!("**Multiple {kind} found matching \"{query}\":**");
    for candidate in candidates.iter().take(MAX_LISTED) {
        out.push_str("\n - ");
        out.push_str(candidate);
    }
    if candidates.len() > MAX_LISTED {
        out.push_str(&format!("\n**And {} more...**", candidates.len() - MAX_LISTED));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_token_separates_first_word() {
        assert_eq!(split_token("  5 hello extra "), ("5", Some("hello extra")));
        assert_eq!(split_token("single"), ("single", None));
        assert_eq!(split_token("tab\tseparated"), ("tab", Some("separated")));
        assert_eq!(split_token("trailing   "), ("trailing", None));
    }

    #[test]
    fn split_on_uses_first_separator_match() {
        let sep = Regex::new(r"\s*\|\s*").unwrap();
        assert_eq!(split_on("a b | c | d", &sep), ("a b", Some("c | d")));
        assert_eq!(split_on("no separator", &sep), ("no separator", None));
        assert_eq!(split_on("dangling |  ", &sep), ("dangling", None));
    }

    #[test]
    fn join_path_skips_empty_segments() {
        assert_eq!(join_path("", "mod"), "mod");
        assert_eq!(join_path("mod", "mute"), "mod mute");
        assert_eq!(join_path("mod", ""), "mod");
    }

    #[test]
    fn format_duration_variants() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(3_661), "1 hour, 1 minute and 1 second");
        assert_eq!(
            format_duration(93_784),
            "1 day, 2 hours, 3 minutes and 4 seconds"
        );
        assert_eq!(format_duration(172_800), "2 days");
    }

    #[test]
    fn list_matches_truncates_long_lists() {
        let candidates: Vec<String> = (1..=6).map(|i| format!("user{i}")).collect();
        let text = list_matches("users", "user", &candidates);
        assert!(text.starts_with("**Multiple users found matching \"user\":**"));
        assert!(text.contains("user4"));
        assert!(!text.contains("user5"));
        assert!(text.ends_with("**And 2 more...**"));
    }
}
