use anyhow::Result;
use clap::Parser;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::info;

mod config;
mod console;
mod live_scores;
mod models;

use config::{Config, Day};
use console::Presenter;
use live_scores::{Clock, FilterOptions, LiveScoreApi, ScoreCoordinator, ScoreProvider, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let provider: Arc<dyn ScoreProvider> =
        Arc::new(LiveScoreApi::new(&config.api_url, config.request_timeout())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let filter = FilterOptions {
        query: config.query.clone(),
        live_only: config.live_only,
    };

    let sports = config.selected_sports();
    info!(
        "Following {} sport(s) via {} ({})",
        sports.len(),
        provider.name(),
        config.api_url
    );

    // One coordinator per sport, each with its own presenter task.
    let mut coordinators = Vec::with_capacity(sports.len());
    let mut presenters = Vec::with_capacity(sports.len());
    for sport in sports {
        let coordinator = ScoreCoordinator::spawn(
            sport,
            Arc::clone(&provider),
            Arc::clone(&clock),
            config.coordinator_config(),
        );

        // The coordinator already loads today on start.
        let start_date = match (&config.date, config.day) {
            (Some(date), _) if *date == coordinator.today() => None,
            (Some(date), _) => Some(date.clone()),
            (None, Some(Day::Yesterday)) => Some(coordinator.yesterday()),
            (None, Some(Day::Tomorrow)) => Some(coordinator.tomorrow()),
            (None, Some(Day::Today)) | (None, None) => None,
        };
        if let Some(date) = start_date {
            coordinator.select_date(date);
        }
        if let Some(match_id) = &config.match_id {
            coordinator.select_match(match_id.clone());
        }

        presenters.push(tokio::spawn(
            Presenter::attach(&coordinator, filter.clone()).run(),
        ));
        coordinators.push(coordinator);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down {} coordinator(s)", coordinators.len());

    join_all(coordinators.into_iter().map(ScoreCoordinator::shutdown)).await;
    join_all(presenters).await;

    Ok(())
}
