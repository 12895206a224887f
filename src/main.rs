//! herald - console harness for the herald command router
//!
//! Reads chat lines from stdin, fans each one out to event listeners and
//! routes it through the demo command tree. Replies are written to stdout;
//! logs go to stderr.

mod commands;
mod config;
mod console;

use crate::commands::Services;
use crate::config::{Config, LoggingConfig};
use crate::console::ConsolePlatform;
use async_trait::async_trait;
use herald_core::{
    CooldownRegistry, EventFanoutManager, EventListener, FnListener, InboundMessage, Router,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Logs every inbound message at debug level.
struct AuditListener;

#[async_trait]
impl EventListener<InboundMessage> for AuditListener {
    async fn on_event(&self, message: Arc<InboundMessage>) -> anyhow::Result<()> {
        debug!(
            author = %message.author.id,
            channel = %message.channel.id,
            direct = message.is_direct(),
            len = message.text.len(),
            "message received"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "audit"
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (optional path, defaults otherwise)
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    init_tracing(&config.logging);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(
        path = config_path.as_deref().unwrap_or("<defaults>"),
        prefix = %config.bot.prefix,
        name = %config.bot.name,
        "Starting herald"
    );

    let platform = Arc::new(ConsolePlatform::demo(&config.bot.name));
    let cooldowns = Arc::new(CooldownRegistry::new());
    let messages_seen = Arc::new(AtomicU64::new(0));

    // Event fanout: audit log plus the message counter behind `stats`
    let fanout = EventFanoutManager::<InboundMessage>::new(config.fanout.pool())?;
    fanout.register(Arc::new(AuditListener))?;
    {
        let seen = Arc::clone(&messages_seen);
        fanout.register(Arc::new(FnListener::new(
            "message-counter",
            move |_message: Arc<InboundMessage>| {
                seen.fetch_add(1, Ordering::Relaxed);
                async { Ok::<(), anyhow::Error>(()) }
            },
        )))?;
    }
    info!(
        listeners = fanout.listeners().len(),
        max_concurrency = config.fanout.max_concurrency,
        "Event fanout ready"
    );

    // Start cooldown sweep (optional)
    if let Some(secs) = config.cooldowns.purge_interval_secs {
        let cooldowns = Arc::clone(&cooldowns);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs));
            loop {
                interval.tick().await;
                let removed = cooldowns.purge_expired();
                if removed > 0 {
                    info!(removed = removed, "Expired cooldowns purged");
                }
            }
        });
        info!(interval_secs = secs, "Cooldown sweep task started");
    }

    let services = Services {
        platform: Arc::clone(&platform),
        cooldowns: Arc::clone(&cooldowns),
        messages_seen,
        runtime: tokio::runtime::Handle::current(),
    };
    let router = Router::new(
        commands::build(&services)?,
        config.bot.prefix.clone(),
        cooldowns,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let message = platform.inbound(&line, &config.console);
        fanout.handle(message.clone());
        router.handle_message(
            &message,
            platform.as_ref(),
            config.console.level,
            false,
            |name| config.bot.is_disabled(name),
        );
    }

    fanout.shutdown().await;
    for (command, count) in router.command_stats() {
        info!(command, count, "Command usage");
    }
    info!("herald stopped");
    Ok(())
}
