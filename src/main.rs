//! chordhook: chord daemon over a stream of hook events
//!
//! Reads newline-delimited hook JSON records on stdin (as produced by a
//! native input hook), registers the chords named in `CHORDHOOK_BINDINGS`
//! and logs each time one fires. Runs until stdin closes or a shutdown
//! signal arrives.

mod config;

use std::io::BufReader;

use anyhow::{Context, Result};
use chordhook::{Event, Hook, JsonLineSource};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "chordhook starting"
    );

    // Load configuration
    let config = Config::load()?;
    info!(
        buffer = config.buffer_capacity,
        bindings = config.bindings.len(),
        "configuration loaded"
    );

    let source = JsonLineSource::new(BufReader::new(std::io::stdin()));
    let hook = Hook::with_capacity(source, config.buffer_capacity);
    hook.set_debug_level(config.debug_level);

    for binding in &config.bindings {
        let label = binding.to_string();
        hook.register(binding.kind, &binding.keys, move |event: &Event| {
            info!(chord = %label, %event, "chord fired");
        })
        .with_context(|| format!("failed to register '{binding}'"))?;
    }

    let mut stream = hook.start()?;

    info!("hook running, reading events from stdin");

    tokio::select! {
        _ = async {
            while let Some(event) = stream.recv().await {
                debug!(%event, "raw event");
            }
        } => {
            info!("event stream ended");
        }

        result = shutdown_signal() => {
            match result {
                Ok(name) => info!(signal = name, "shutdown signal received"),
                Err(e) => error!(?e, "failed to install signal handlers"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");
    hook.stop();

    info!("chordhook stopped");

    Ok(())
}

/// Wait for SIGTERM or SIGINT and return which one arrived
async fn shutdown_signal() -> std::io::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}
