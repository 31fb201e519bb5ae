use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::error::Error;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct DiscordMessage {
    content: String,
}

/// Posts notifications to a Discord webhook, optionally mentioning a user.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    discord_id: Option<u64>,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, discord_id: Option<u64>) -> Result<Self, Error> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url,
            discord_id,
        })
    }

    fn message(&self, title: &str, body: &str) -> DiscordMessage {
        // If discord_id is None, we don't want to mention anyone
        let tag = self.discord_id.map_or(String::new(), |id| format!("<@{id}> "));
        DiscordMessage {
            content: format!("{tag}{title}: {body}"),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), Error> {
        self.client
            .post(&self.webhook_url)
            .json(&self.message(title, body))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
