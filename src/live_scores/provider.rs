use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DateKey, MatchDetail, Snapshot, Sport};

/// Why a fetch failed. Always recoverable; the coordinator turns it into state.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("response is missing data: {0}")]
    MissingData(String),
}

/// Trait that every scores backend must implement.
///
/// Implementations are shared between coordinators and may be called
/// concurrently; they must not keep per-call state.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    /// All grouped matches for one date.
    async fn fetch_snapshot(&self, sport: Sport, date: &DateKey) -> Result<Snapshot, FetchError>;

    /// Detail record for a single match.
    async fn fetch_match_detail(
        &self,
        sport: Sport,
        match_id: &str,
    ) -> Result<MatchDetail, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
