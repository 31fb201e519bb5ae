//! Notification dispatch.
//!
//! [`Notifier`] is the single capability the monitor talks to. Backends are
//! picked once at startup; [`Alerts`] decides which transitions deserve a
//! notification and makes sure a failing backend never interrupts monitoring.

mod desktop;
mod discord;

pub use desktop::{DesktopNotifier, Platform};
pub use discord::DiscordNotifier;

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::Error;
use crate::probe::ProbeResult;
use crate::state::Transition;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn notify(&self, title: &str, body: &str) -> Result<(), Error>;
}

/// Upper bound on a single dispatch, so a hung backend cannot hold up a tick.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends every notification to all wrapped backends.
pub struct FanOut {
    name: String,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl FanOut {
    #[must_use]
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        let name = notifiers
            .iter()
            .map(|n| n.name())
            .collect::<Vec<_>>()
            .join("+");
        Self { name, notifiers }
    }
}

#[async_trait]
impl Notifier for FanOut {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), Error> {
        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(title, body).await {
                failures.push(format!("{}: {e}", notifier.name()));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Notification(failures.join("; ")))
        }
    }
}

/// Kind of notification a transition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    Down,
    Up,
}

impl Alert {
    /// A first observation only alerts when the site is down; recoveries
    /// alert only when asked to.
    #[must_use]
    pub fn for_transition(transition: Transition, notify_on_up: bool) -> Option<Self> {
        match transition {
            Transition::WentDown | Transition::FirstCheckDown => Some(Alert::Down),
            Transition::CameUp if notify_on_up => Some(Alert::Up),
            Transition::CameUp | Transition::NoChange | Transition::FirstCheckUp => None,
        }
    }
}

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The backend accepted it.
    Sent,
    /// Nothing to send, or silent mode.
    Skipped,
    /// The backend failed or timed out; the console line was printed instead.
    FellBack,
}

/// Notification policy on top of a [`Notifier`] backend.
#[derive(Clone)]
pub struct Alerts {
    notifier: Arc<dyn Notifier>,
    silent: bool,
    notify_on_up: bool,
    dispatch_timeout: Duration,
}

impl Alerts {
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, silent: bool, notify_on_up: bool) -> Self {
        Self {
            notifier,
            silent,
            notify_on_up,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }

    /// Notifies for `transition` if the policy asks for it.
    pub async fn on_transition(&self, result: &ProbeResult, transition: Transition) -> Delivery {
        match Alert::for_transition(transition, self.notify_on_up) {
            Some(Alert::Down) => self.site_down(result).await,
            Some(Alert::Up) => self.site_up(&result.url).await,
            None => Delivery::Skipped,
        }
    }

    pub async fn site_down(&self, result: &ProbeResult) -> Delivery {
        let body = format!("{} is down: {}", result.url, result.reason());
        self.send("Website Down", &body).await
    }

    pub async fn site_up(&self, url: &str) -> Delivery {
        let body = format!("{url} is back online");
        self.send("Website Up", &body).await
    }

    async fn send(&self, title: &str, body: &str) -> Delivery {
        if self.silent {
            debug!("Silent mode, skipping notification: {title} - {body}");
            return Delivery::Skipped;
        }

        let dispatch = self.notifier.notify(title, body);
        let failure = match timeout(self.dispatch_timeout, dispatch).await {
            Ok(Ok(())) => return Delivery::Sent,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no answer within {} ms", self.dispatch_timeout.as_millis()),
        };
        warn!("{} notification failed: {failure}", self.notifier.name());
        println!("NOTIFICATION: {title} - {body}");
        Delivery::FellBack
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification it is asked to send.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn titles(&self) -> Vec<String> {
            self.sent().into_iter().map(|(title, _)| title).collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, title: &str, body: &str) -> Result<(), Error> {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    pub struct FailingNotifier;

    /// Never answers within any reasonable time.
    pub struct StalledNotifier;

    #[async_trait]
    impl Notifier for StalledNotifier {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn notify(&self, _title: &str, _body: &str) -> Result<(), Error> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn notify(&self, _title: &str, _body: &str) -> Result<(), Error> {
            Err(Error::Notification("no display".to_string()))
        }
    }
}
