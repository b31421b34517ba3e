mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ffshepherd_core::{load_config_or_default, validate_config};

use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level: {}", level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("Loading configuration from {:?}", cli.config);
    let config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    let token = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(token.clone()));

    match cli.command {
        Command::Monitor {
            max_processes,
            check_interval,
            metrics_out,
        } => {
            commands::monitor::run(
                &config,
                max_processes,
                check_interval,
                metrics_out.as_deref(),
                token,
            )
            .await
        }
        Command::Fix {
            input_dir,
            temp_dir,
            concurrency,
            no_limit,
            no_kill_on_exit,
            json,
            metrics_out,
        } => {
            let args = commands::fix::FixArgs {
                input_dir,
                temp_dir,
                concurrency,
                limit_processes: !no_limit,
                kill_on_exit: !no_kill_on_exit,
                json,
                metrics_out,
            };
            commands::fix::run(&config, args, token).await
        }
        Command::Restore {
            input_dir,
            purge,
            yes,
        } => commands::files::restore(&config, &input_dir, purge, yes).await,
        Command::Cleanup {
            input_dir,
            temp_dir,
            yes,
        } => commands::files::cleanup(&config, &input_dir, &temp_dir, yes).await,
        Command::ReplaceConverted { dir, marker } => {
            commands::files::replace_converted(&dir, &marker).await
        }
        Command::Kill => commands::processes::kill(&config).await,
        Command::Status { json } => commands::processes::status(&config, json).await,
    }
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn cancel_on_shutdown(token: CancellationToken) {
    shutdown_signal().await;
    info!("Shutdown requested, finishing up");
    token.cancel();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
