use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use upgak::cli::Cli;
use upgak::config::{Config, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let settings = match Config::discover(cli.config.as_deref())
        .and_then(|file| Settings::resolve(cli, file))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("upgak: {e}");
            return ExitCode::FAILURE;
        }
    };

    let token = CancellationToken::new();
    tokio::spawn(shutdown_signal(token.clone()));

    match upgak::run(settings, token).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
    token.cancel();
}
