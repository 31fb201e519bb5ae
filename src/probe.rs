use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::debug;
use reqwest::{Client, Method};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::Error;

/// HTTP method used for a probe. `Head` skips the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProbeMethod {
    #[default]
    Get,
    Head,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Get => f.write_str("GET"),
            ProbeMethod::Head => f.write_str("HEAD"),
        }
    }
}

/// Outcome of a single probe against one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    /// Absent when no response was received.
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub is_up: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeResult {
    /// Short explanation of why the URL is in its current state.
    #[must_use]
    pub fn reason(&self) -> String {
        match (&self.error, self.status_code) {
            (Some(err), _) => err.clone(),
            (None, Some(code)) => format!("HTTP {code}"),
            (None, None) => "no response".to_string(),
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (icon, status) = if self.is_up {
            ("✅", "UP")
        } else {
            ("❌", "DOWN")
        };
        write!(f, "{icon} {} - {status} - ", self.url)?;
        if self.error.is_some() {
            write!(f, "ERROR: {}", self.reason())?;
        } else {
            f.write_str(&self.reason())?;
        }
        write!(
            f,
            " - Response time: {} ms",
            self.response_time.as_millis()
        )
    }
}

/// A URL counts as up for any 2xx or 3xx status.
#[must_use]
pub fn is_up_status(code: u16) -> bool {
    (200..400).contains(&code)
}

/// Issues single-attempt HTTP probes with a fixed timeout.
///
/// The underlying client is cheap to clone and carries no per-request state,
/// so one `Prober` is shared by every concurrent probe.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    method: ProbeMethod,
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout: Duration, method: ProbeMethod) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            method,
            timeout,
        })
    }

    /// Probes `url` once. Transport failures are folded into the result.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let timestamp = Utc::now();
        let start = Instant::now();
        let outcome = self.send(url).await;
        let response_time = start.elapsed();

        match outcome {
            Ok(code) => ProbeResult {
                url: url.to_string(),
                status_code: Some(code),
                response_time,
                is_up: is_up_status(code),
                error: None,
                timestamp,
            },
            Err(e) => {
                debug!("{} {url} failed: {e}", self.method);
                ProbeResult {
                    url: url.to_string(),
                    status_code: None,
                    response_time,
                    is_up: false,
                    error: Some(self.describe(&e)),
                    timestamp,
                }
            }
        }
    }

    async fn send(&self, url: &str) -> Result<u16, Error> {
        let url = Url::parse(url)?;
        let method = match self.method {
            ProbeMethod::Get => Method::GET,
            ProbeMethod::Head => Method::HEAD,
        };
        let response = self.client.request(method, url).send().await?;
        Ok(response.status().as_u16())
    }

    fn describe(&self, err: &Error) -> String {
        match err {
            Error::HttpRequest(e) if e.is_timeout() => {
                format!("timed out after {} ms", self.timeout.as_millis())
            }
            Error::HttpRequest(e) if e.is_connect() => format!("connection failed: {e}"),
            Error::UrlParse(e) => format!("invalid URL: {e}"),
            other => other.to_string(),
        }
    }
}
