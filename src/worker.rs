use chrono::Local;
use futures::future::join_all;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::select;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::Error;
use crate::notify::{Alerts, Notifier};
use crate::probe::Prober;
use crate::runner::{BatchRunner, Execution};
use crate::state::{StateTracker, Transition};

/// Totals of a one-time check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub up: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} up in {} ms",
            self.up,
            self.total,
            self.elapsed.as_millis()
        )
    }
}

/// Why the watch loop ended, with the number of finished ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The configured check count was reached.
    Completed(u64),
    /// Shutdown was requested.
    Stopped(u64),
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchOutcome::Completed(n) => write!(f, "Completed {n} checks"),
            WatchOutcome::Stopped(n) => write!(f, "Stopped after {n} checks"),
        }
    }
}

/// Checks a fixed list of URLs, once or on an interval.
pub struct Monitor {
    urls: Vec<String>,
    runner: BatchRunner,
    alerts: Alerts,
}

impl Monitor {
    #[must_use]
    pub fn new(urls: Vec<String>, runner: BatchRunner, alerts: Alerts) -> Self {
        Self {
            urls,
            runner,
            alerts,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, Error> {
        let prober = Prober::new(settings.timeout, settings.method)?;
        Ok(Self::new(
            settings.urls.clone(),
            BatchRunner::new(prober, settings.max_concurrency),
            Alerts::new(notifier, settings.silent, settings.notify_on_up),
        ))
    }

    /// Runs a single batch, prints every result and notifies for each site
    /// that is down. No state is kept.
    pub async fn check_once(&self, execution: Execution) -> Summary {
        let start = Instant::now();
        let results = self.runner.run(&self.urls, execution).await;

        for result in &results {
            println!("{result}");
        }

        join_all(
            results
                .iter()
                .filter(|result| !result.is_up)
                .map(|result| self.alerts.site_down(result)),
        )
        .await;

        let summary = Summary {
            up: results.iter().filter(|result| result.is_up).count(),
            total: results.len(),
            elapsed: start.elapsed(),
        };
        println!("{summary}");
        summary
    }

    /// Checks every `period` until `count` ticks are done (0 = no limit) or
    /// `token` is cancelled.
    ///
    /// The first tick runs immediately. Cancellation is only observed between
    /// ticks, so an in-flight tick always finishes.
    pub async fn watch(
        &self,
        period: Duration,
        count: u64,
        token: CancellationToken,
    ) -> WatchOutcome {
        let tracker = StateTracker::new();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0;

        loop {
            // Interruptible wait for the next tick
            select! {
                biased;
                () = token.cancelled() => {
                    info!("Shutdown requested, stopping monitor");
                    return WatchOutcome::Stopped(completed);
                }
                _ = ticker.tick() => {}
            }

            self.tick(&tracker).await;
            completed += 1;

            if count > 0 && completed >= count {
                return WatchOutcome::Completed(completed);
            }
        }
    }

    /// One watch iteration: probe all URLs, print them in input order, then
    /// classify and notify per URL.
    pub async fn tick(&self, tracker: &StateTracker) -> Vec<Transition> {
        info!("Checking website status...");
        let results = self.runner.run_concurrent(&self.urls).await;

        let stamp = Local::now().format("%H:%M:%S");
        for result in &results {
            println!("[{stamp}] {result}");
        }

        join_all(results.iter().map(|result| async move {
            let transition = tracker.classify(&result.url, result.is_up).await;
            match transition {
                Transition::WentDown => warn!("{} went DOWN ({})", result.url, result.reason()),
                Transition::CameUp => info!("{} is back UP", result.url),
                _ => {}
            }
            self.alerts.on_transition(result, transition).await;
            transition
        }))
        .await
    }
}
