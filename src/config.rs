use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};

use crate::batch;
use crate::cli::Cli;
use crate::error::Error;
use crate::probe::ProbeMethod;
use crate::runner::Execution;

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Optional TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config: ConfigOptions,
    pub sites: SiteList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    pub timeout_secs: Option<u64>,
    pub check_interval_secs: Option<u64>,
    pub discord_id: Option<u64>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteList {
    pub urls: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// `<config dir>/upgak/config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("upgak").join("config.toml"))
    }

    /// Loads `explicit` if given, else the default file when it exists.
    /// Without any file only the environment is consulted.
    pub fn discover(explicit: Option<&Path>) -> Result<Config, Error> {
        if let Some(path) = explicit {
            return Config::load(path).map_err(|e| {
                Error::Config(format!("failed to load {}: {e}", path.display()))
            });
        }

        match Config::default_path() {
            Some(path) if path.is_file() => {
                debug!("Using config file {}", path.display());
                Config::load(path)
            }
            _ => {
                let mut config = Config::default();
                config.apply_env()?;
                Ok(config)
            }
        }
    }

    // Webhook settings fall back to the environment (and .env) when absent
    fn apply_env(&mut self) -> Result<(), Error> {
        if self.config.webhook_url.is_none() {
            self.config.webhook_url = dotenvy::var("WEBHOOK_URL").ok();
        }

        if self.config.discord_id.is_none() {
            if let Ok(id) = dotenvy::var("DISCORD_ID") {
                let id = id
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("DISCORD_ID is not a number: {id}")))?;
                self.config.discord_id = Some(id);
            }
        }

        Ok(())
    }
}

/// How the monitor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A single batch over every URL.
    Once { execution: Execution },
    /// Periodic checks; `count` of 0 runs until interrupted.
    Watch { interval: Duration, count: u64 },
}

/// Effective settings after merging the command line, config file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub urls: Vec<String>,
    pub mode: Mode,
    pub timeout: Duration,
    pub method: ProbeMethod,
    pub max_concurrency: Option<usize>,
    pub silent: bool,
    pub notify_on_up: bool,
    pub webhook_url: Option<String>,
    pub discord_id: Option<u64>,
}

impl Settings {
    /// Command-line values win over the config file.
    pub fn resolve(cli: Cli, file: Config) -> Result<Settings, Error> {
        let mut urls = cli.urls;
        urls.extend(cli.extra_urls);
        if let Some(path) = &cli.batch {
            urls.extend(batch::load(path)?);
        }
        if urls.is_empty() {
            urls = file.sites.urls;
        }
        if urls.is_empty() {
            return Err(Error::Config(
                "no URLs to check, pass them as arguments or with --batch".to_string(),
            ));
        }

        let interval_secs = cli
            .interval
            .or(file.config.check_interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        let timeout_secs = cli
            .timeout
            .or(file.config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        if interval_secs == 0 {
            return Err(Error::Config("interval must be at least 1 second".to_string()));
        }
        if timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        if cli.max_concurrency == Some(0) {
            return Err(Error::Config("max-concurrency must be at least 1".to_string()));
        }
        if !cli.watch && (cli.interval.is_some() || cli.count > 0) {
            return Err(Error::Config("--interval and --count need --watch".to_string()));
        }

        let mode = if cli.watch {
            Mode::Watch {
                interval: Duration::from_secs(interval_secs),
                count: cli.count,
            }
        } else {
            Mode::Once {
                execution: if cli.concurrent {
                    Execution::Concurrent
                } else {
                    Execution::Sequential
                },
            }
        };

        Ok(Settings {
            urls,
            mode,
            timeout: Duration::from_secs(timeout_secs),
            method: cli.method,
            max_concurrency: cli.max_concurrency,
            silent: cli.silent,
            notify_on_up: cli.notify_on_up,
            webhook_url: file.config.webhook_url,
            discord_id: file.config.discord_id,
        })
    }
}
