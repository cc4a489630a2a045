use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::live_scores::coordinator::CoordinatorConfig;
use crate::live_scores::livescore::DEFAULT_BASE_URL;
use crate::models::{DateKey, Sport};

/// Relative day to open instead of today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Day {
    Yesterday,
    Today,
    Tomorrow,
}

/// Live sports scores in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "livescores-sync", version, about)]
pub struct Config {
    /// Sports to follow; repeat or comma-separate. Defaults to all of them.
    #[arg(long = "sport", env = "SPORTS", value_enum, value_delimiter = ',')]
    pub sports: Vec<Sport>,

    /// Date to open (YYYYMMDD) instead of today
    #[arg(long, env = "SCORES_DATE", conflicts_with = "day")]
    pub date: Option<DateKey>,

    /// Relative day to open instead of today
    #[arg(long, value_enum)]
    pub day: Option<Day>,

    /// Only show matches whose teams or competition contain this text
    #[arg(long, env = "SCORES_QUERY", default_value = "")]
    pub query: String,

    /// Only show matches that are in play
    #[arg(long, env = "LIVE_ONLY", default_value = "false")]
    pub live_only: bool,

    /// Open the detail view for this match id on start (single sport only)
    #[arg(long, env = "MATCH_ID")]
    pub match_id: Option<String>,

    /// Scores API base URL
    #[arg(long, env = "LIVE_SCORES_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Background refresh interval in seconds while today is shown
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "60")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if !(1..=120).contains(&self.request_timeout_secs) {
            anyhow::bail!("request_timeout_secs must be between 1 and 120");
        }
        match url::Url::parse(&self.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => anyhow::bail!("api_url must be http or https, got {}", url.scheme()),
            Err(e) => anyhow::bail!("api_url is not a valid URL: {}", e),
        }
        if self.match_id.is_some() && self.selected_sports().len() != 1 {
            anyhow::bail!("--match-id needs exactly one --sport");
        }
        Ok(())
    }

    pub fn selected_sports(&self) -> Vec<Sport> {
        if self.sports.is_empty() {
            return Sport::ALL.to_vec();
        }
        let mut sports = Vec::new();
        for sport in &self.sports {
            if !sports.contains(sport) {
                sports.push(*sport);
            }
        }
        sports
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: self.request_timeout(),
        }
    }
}
