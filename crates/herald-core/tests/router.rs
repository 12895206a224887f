//! Integration tests for prefix handling and top-level routing.

mod common;

use common::{MockPlatform, PREFIX, dm_message, guild_message};
use herald_core::{Command, CooldownRegistry, PermLevel, Router};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn router(hits: Arc<AtomicUsize>) -> Router {
    let root = Command::root()
        .with_child(Command::new("ping").with_alias("p").with_executor(move |_, inv| {
            hits.fetch_add(1, Ordering::SeqCst);
            inv.reply("Pong!");
            true
        }))
        .with_child(Command::new("echo").with_executor(|args, inv| {
            inv.reply(args.trailing().unwrap_or(""));
            true
        }));
    Router::new(root, PREFIX, Arc::new(CooldownRegistry::new()))
}

#[test]
fn messages_without_prefix_are_ignored() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(Arc::clone(&hits));
    let platform = MockPlatform::new();

    assert!(!router.handle_message(&guild_message("ping"), &platform, PermLevel::Owner, false, |_| false));
    assert!(!router.handle_message(&guild_message("!ping"), &platform, PermLevel::Owner, false, |_| false));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(platform.sent().is_empty());
}

#[test]
fn prefix_is_stripped_and_root_dispatched() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(Arc::clone(&hits));
    let platform = MockPlatform::new();

    assert!(router.handle_message(&guild_message("  %%ping  "), &platform, PermLevel::Everyone, false, |_| false));
    assert!(router.handle_message(&dm_message("%% P"), &platform, PermLevel::Everyone, false, |_| false));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(platform.last_text().as_deref(), Some("Pong!"));
}

#[test]
fn unknown_command_gets_subcommand_hint() {
    let router = router(Arc::new(AtomicUsize::new(0)));
    let platform = MockPlatform::new();

    assert!(!router.handle_message(&guild_message("%%nope"), &platform, PermLevel::Everyone, false, |_| false));
    assert_eq!(
        platform.last_text().as_deref(),
        Some("Please choose a subcommand. Try `%%help` for a list.")
    );
}

#[test]
fn ban_predicate_sees_canonical_name() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(Arc::clone(&hits));
    let platform = MockPlatform::new();
    let asked = parking_lot::Mutex::new(Vec::new());

    let ok = router.handle_message(&guild_message("%%P"), &platform, PermLevel::Everyone, false, |name| {
        asked.lock().push(name.to_string());
        name == "ping"
    });

    assert!(!ok);
    assert_eq!(*asked.lock(), vec!["ping".to_string()]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(
        platform.last_text().as_deref(),
        Some("This command has been disabled in this channel.")
    );

    // Other commands are unaffected.
    assert!(router.handle_message(&guild_message("%%echo hi"), &platform, PermLevel::Everyone, false, |name| name == "ping"));
    assert_eq!(platform.last_text().as_deref(), Some("hi"));
}

#[test]
fn root_help_lists_top_level_commands() {
    let router = router(Arc::new(AtomicUsize::new(0)));
    let platform = MockPlatform::new();

    assert!(router.handle_message(&guild_message("%%HELP"), &platform, PermLevel::Everyone, false, |_| false));

    let text = platform.last_text().unwrap_or_default();
    assert!(text.starts_with("**Available help for `%%` in <#200>**:"));
    assert!(text.contains("\n`%%ping` - "));
    assert!(text.contains("\n`%%echo` - "));
}

#[test]
fn usage_counters_track_top_level_commands() {
    let router = router(Arc::new(AtomicUsize::new(0)));
    let platform = MockPlatform::new();

    for text in ["%%ping", "%%p", "%%echo x", "%%PING", "%%unknown"] {
        router.handle_message(&guild_message(text), &platform, PermLevel::Everyone, false, |_| false);
    }

    assert_eq!(router.command_stats(), vec![("ping", 3), ("echo", 1)]);
}
