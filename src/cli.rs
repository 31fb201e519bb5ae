use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::probe::ProbeMethod;

/// Check whether websites are up, once or on an interval.
#[derive(Parser, Debug)]
#[command(name = "upgak")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    upgak https://example.com                      One-time check
    upgak https://example.com --watch -i 60        Check every 60 seconds
    upgak --batch urls.txt --watch -i 120 -n 10    Ten checks, two minutes apart

ENVIRONMENT VARIABLES:
    WEBHOOK_URL    Discord webhook to notify in addition to the desktop
    DISCORD_ID     Discord user to mention in webhook notifications
    RUST_LOG       Log filter (default: info)
"#)]
pub struct Cli {
    /// URLs to check
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Additional URL to check (repeatable)
    #[arg(long = "url", visible_alias = "urls", value_name = "URL")]
    pub extra_urls: Vec<String>,

    /// Load URLs from a .txt, .json or .csv file
    #[arg(short, long, value_name = "PATH")]
    pub batch: Option<PathBuf>,

    /// Keep checking on an interval instead of checking once
    #[arg(short, long)]
    pub watch: bool,

    /// Seconds between checks in watch mode [default: 60]
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Stop after this many checks in watch mode (0 = run forever)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub count: u64,

    /// Per-request timeout in seconds [default: 10]
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// HTTP method used for each check
    #[arg(long, value_enum, default_value = "get")]
    pub method: ProbeMethod,

    /// Check URLs in parallel (false checks them one after another)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub concurrent: bool,

    /// Upper bound on simultaneous requests (unbounded by default)
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Disable notifications
    #[arg(short, long, visible_alias = "no-notify")]
    pub silent: bool,

    /// Also notify when a site comes back up
    #[arg(long)]
    pub notify_on_up: bool,

    /// Config file [default: <config dir>/upgak/config.toml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["upgak", "https://a.test"]).unwrap();
        assert_eq!(cli.urls, vec!["https://a.test"]);
        assert!(!cli.watch);
        assert_eq!(cli.count, 0);
        assert_eq!(cli.interval, None);
        assert_eq!(cli.method, ProbeMethod::Get);
        assert!(cli.concurrent);
        assert!(!cli.silent);
    }

    #[test]
    fn test_watch_flags() {
        let cli = Cli::try_parse_from([
            "upgak",
            "--watch",
            "--interval",
            "5",
            "--count",
            "3",
            "--no-notify",
            "--notify-on-up",
            "--method",
            "head",
            "--url",
            "https://b.test",
        ])
        .unwrap();
        assert!(cli.watch);
        assert_eq!(cli.interval, Some(5));
        assert_eq!(cli.count, 3);
        assert!(cli.silent);
        assert!(cli.notify_on_up);
        assert_eq!(cli.method, ProbeMethod::Head);
        assert_eq!(cli.extra_urls, vec!["https://b.test"]);
    }

    #[test]
    fn test_sequential_one_time_check() {
        let cli = Cli::try_parse_from(["upgak", "--concurrent", "false", "https://a.test"]).unwrap();
        assert!(!cli.concurrent);
    }
}
