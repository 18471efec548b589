#![forbid(unsafe_code)]

//! `reaction-issues` — files GitHub issues for reacted-to Slack messages.
//!
//! Bootstraps configuration and credentials, connects Slack Socket Mode,
//! and routes `reaction_added` events through the issue pipeline until a
//! shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use reaction_issues::config::GlobalConfig;
use reaction_issues::github::client::GitHubClient;
use reaction_issues::pipeline::{Middleware, TracingLogger};
use reaction_issues::slack::client::SlackService;
use reaction_issues::slack::events::AppState;
use reaction_issues::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "reaction-issues", about = "Files GitHub issues for reacted-to Slack messages", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("reaction-issues bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(rules = config.rules.len(), "configuration loaded");

    // ── Collaborators ───────────────────────────────────
    let ct = CancellationToken::new();
    let (slack, queue_task) = SlackService::start(&config.slack, ct.clone())?;
    let slack = Arc::new(slack);
    let github = Arc::new(GitHubClient::new(&config.github));

    let middleware = Middleware::new(
        Arc::clone(&config),
        slack.clone(),
        github,
        Arc::new(TracingLogger),
    );
    let state = Arc::new(AppState {
        slack: Arc::clone(&slack),
        middleware,
    });

    let socket_task = slack.spawn_socket_mode(state);
    info!("listening for reactions");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    socket_task.abort();

    let _ = tokio::join!(queue_task, socket_task);
    info!("reaction-issues shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
