mod api;
mod cli;
mod config;
mod controller;
mod error;
mod format;
mod images;
mod model;
mod output;
mod shell;
mod state;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::AppConfig;
use std::io::Write;
use std::sync::Arc;

use crate::api::{ApiClient, HEALTH_TIMEOUT};
use crate::controller::SearchController;
use crate::shell::Shell;
use crate::state::ViewState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "scrape_search=debug"
    } else {
        "scrape_search=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(cli.overrides()).context("Failed to load configuration")?;
    tracing::debug!("Using API at {} ({:?})", config.api_base, config.environment);

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted.");
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    let api = ApiClient::new(&config.api_base);

    match cli.command {
        Commands::Search { keyword, limit } => {
            let controller = start_controller(&config, api);
            cmd_search(
                &config,
                &controller,
                &keyword,
                limit.unwrap_or(config.default_limit),
            )
            .await?;
        }
        Commands::Shell { limit } => {
            let controller = start_controller(&config, api);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            Shell::new(
                &controller,
                &config,
                limit.unwrap_or(config.default_limit),
                std::io::stdout(),
            )
            .run(stdin)
            .await
            .context("Interactive session failed")?;
        }
        Commands::Health => {
            cmd_health(&api).await?;
        }
    }

    Ok(())
}

/// Build the controller and fire the advisory health check without waiting on it.
fn start_controller(config: &AppConfig, api: ApiClient) -> Arc<SearchController> {
    let controller = Arc::new(SearchController::new(
        api,
        config.timeout,
        &config.currency_symbol,
    ));

    let checker = Arc::clone(&controller);
    tokio::spawn(async move { checker.probe_health().await });

    controller
}

async fn cmd_search(
    config: &AppConfig,
    controller: &SearchController,
    keyword: &str,
    limit: u32,
) -> Result<()> {
    let show_loading = !config.json;
    let outcome = controller
        .with_loading_notice(controller.submit_search(keyword, limit), || -> Result<()> {
            if show_loading {
                eprint!("{}", output::format_state(&ViewState::Loading));
            }
            Ok(())
        })
        .await?;
    let state = match outcome {
        Ok(state) => state,
        Err(e) => anyhow::bail!("{}", e),
    };

    let state = if config.check_images {
        images::checked_for_display(controller.http(), state).await
    } else {
        state
    };
    print!("{}", output::render(&state, config.json)?);

    if let ViewState::Error { .. } = state {
        std::io::stdout().flush()?;
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_health(api: &ApiClient) -> Result<()> {
    let health = api
        .health(HEALTH_TIMEOUT)
        .await
        .with_context(|| format!("API at {} is not reachable", api.base_url()))?;

    tracing::debug!("Health timestamp: {:?}", health.timestamp);
    match health.service {
        Some(ref service) => println!("{}: {}", service, health.status),
        None => println!("{}", health.status),
    }
    Ok(())
}
