use std::collections::HashMap;
use tokio::sync::Mutex;

/// Change in a URL's up/down state between consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentDown,
    CameUp,
    NoChange,
    FirstCheckDown,
    FirstCheckUp,
}

/// Last observed up/down state per URL for one monitoring run.
///
/// All reads and writes go through a single lock so concurrent
/// classifications within a tick never lose an update.
#[derive(Debug, Default)]
pub struct StateTracker {
    previous: Mutex<HashMap<String, bool>>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the new observation against the last one and records it.
    pub async fn classify(&self, url: &str, is_up: bool) -> Transition {
        let mut previous = self.previous.lock().await;
        match previous.insert(url.to_string(), is_up) {
            None if is_up => Transition::FirstCheckUp,
            None => Transition::FirstCheckDown,
            Some(true) if !is_up => Transition::WentDown,
            Some(false) if is_up => Transition::CameUp,
            Some(_) => Transition::NoChange,
        }
    }

    /// Last recorded state for `url`, if it has been checked.
    pub async fn last_state(&self, url: &str) -> Option<bool> {
        self.previous.lock().await.get(url).copied()
    }
}
