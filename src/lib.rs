pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod probe;
pub mod runner;
pub mod state;
pub mod worker;

use log::{info, warn};
use std::sync::Arc;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::config::{Mode, Settings};
use crate::error::Error;
use crate::notify::{DesktopNotifier, DiscordNotifier, FanOut, Notifier};
use crate::worker::Monitor;

/// Desktop notifications, plus the Discord webhook when one is configured.
pub fn notifier_for(settings: &Settings) -> Result<Arc<dyn Notifier>, Error> {
    let desktop: Box<dyn Notifier> = Box::new(DesktopNotifier::default());
    Ok(match &settings.webhook_url {
        Some(webhook) => {
            let discord: Box<dyn Notifier> =
                Box::new(DiscordNotifier::new(webhook.clone(), settings.discord_id)?);
            Arc::new(FanOut::new(vec![desktop, discord]))
        }
        None => Arc::from(desktop),
    })
}

/// Runs the monitor described by `settings` to completion.
///
/// In watch mode `token` ends the loop after the current check; a one-time
/// check is abandoned as soon as `token` fires.
pub async fn run(settings: Settings, token: CancellationToken) -> Result<(), Error> {
    let notifier = notifier_for(&settings)?;

    // Initial Configuration Logging
    info!("Monitoring {} websites", settings.urls.len());
    info!("Timeout: {} seconds", settings.timeout.as_secs());
    if settings.silent {
        info!("Silent mode, no notifications will be sent");
    } else {
        info!("Notifications via {}", notifier.name());
        match (settings.webhook_url.is_some(), settings.discord_id.is_some()) {
            (true, false) => warn!("Discord ID is not set, notifications will not tag any user"),
            (false, true) => warn!("Discord ID is set without a webhook, it will be ignored"),
            _ => {}
        }
    }

    let monitor = Monitor::from_settings(&settings, notifier)?;

    match settings.mode {
        Mode::Once { execution } => {
            select! {
                _ = monitor.check_once(execution) => {}
                () = token.cancelled() => info!("Interrupted, abandoning the check"),
            }
        }
        Mode::Watch { interval, count } => {
            info!("Starting website monitoring...");
            info!("Check interval: {} seconds", interval.as_secs());
            if count > 0 {
                info!("Stopping after {count} checks");
            }
            let outcome = monitor.watch(interval, count, token).await;
            println!("{outcome}");
            info!("Website monitoring stopped gracefully");
        }
    }

    Ok(())
}
