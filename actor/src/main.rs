//! Actor - self-play trainer for arbor
//!
//! A long-running process that:
//! 1. Loads `./data/models/latest.json` if a previous run left one
//! 2. Plays batches of Connect 4 games with the budgeted minimax engine
//! 3. Fits boosted regression trees to the residual of the current model
//! 4. Saves the extended model and periodically plays it against a
//!    static-evaluation baseline

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod arena;
mod config;
mod model;
mod orchestrator;
mod selfplay;
mod stats;

use crate::config::Config;
use crate::orchestrator::Orchestrator;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let iterations = if config.iterations == 0 {
        "unlimited".to_string()
    } else {
        config.iterations.to_string()
    };
    info!(
        model = %config.model_path().display(),
        "Training for {} iterations of {} games", iterations, config.games_per_iteration
    );

    let orchestrator = Arc::new(Orchestrator::new(config));

    let shutdown = Arc::clone(&orchestrator);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, finishing the current iteration...");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let run_result = orchestrator.run().await;
    shutdown_handle.abort();

    match run_result {
        Ok(model) => {
            let stats = orchestrator.stats().snapshot();
            info!(
                trees = model.len(),
                games = stats.games_completed,
                white_wins = stats.white_wins,
                black_wins = stats.black_wins,
                draws = stats.draws,
                stats_file = %orchestrator.stats().stats_path().display(),
                "Training completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!("Training failed: {:?}", e);
            Err(e)
        }
    }
}
