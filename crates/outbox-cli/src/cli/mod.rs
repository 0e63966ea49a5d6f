//! CLI for the outbox mutation queue.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use outbox_core::config;
use outbox_core::method::Method;
use outbox_core::queue::MutationQueue;
use std::path::PathBuf;

use commands::{run_check, run_clear, run_daemon, run_flush, run_send, run_status};

/// Top-level CLI for the outbox mutation queue.
#[derive(Debug, Parser)]
#[command(name = "outbox")]
#[command(about = "Outbox: durable delivery of deferred mutations to the coordination server", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/outbox/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show pending mutations and scheduler state.
    Status,

    /// Drain the queue once now through the HTTP transport.
    Flush,

    /// Discard every pending mutation.
    Clear {
        /// Confirm discarding pending mutations.
        #[arg(long)]
        yes: bool,
    },

    /// Show how the policy classifies a request.
    Check {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: Method,
        /// Endpoint path, e.g. /workers/42.
        endpoint: String,
    },

    /// Send a request; defer it if the server is unreachable and policy allows.
    Send {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: Method,
        /// Endpoint path, e.g. /workers/42.
        endpoint: String,
        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
    },

    /// Keep running and redeliver pending mutations on schedule until Ctrl-C.
    Run,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        if let CliCommand::Check { method, endpoint } = &cli.command {
            run_check(&cfg.queue_policy(), *method, endpoint);
            return Ok(());
        }

        let queue = MutationQueue::open_default(&cfg)?;
        match cli.command {
            CliCommand::Status => run_status(&queue),
            CliCommand::Flush => run_flush(&queue, &cfg).await?,
            CliCommand::Clear { yes } => run_clear(&queue, yes)?,
            CliCommand::Send {
                method,
                endpoint,
                body,
            } => run_send(&queue, &cfg, method, &endpoint, body.as_deref()).await?,
            CliCommand::Run => run_daemon(&queue, &cfg).await?,
            CliCommand::Check { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
