// Where stat lines come from: the live stats API or a local CSV file.

pub mod csv;
pub mod mlb;

use async_trait::async_trait;
use thiserror::Error;

use dugout_baseball::{Population, SeasonLine, StatGroup, StatLine};

pub use self::csv::CsvPopulation;
pub use self::mlb::MlbStatsClient;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: ::csv::Error },

    #[error("{0} is not available from this source")]
    Unsupported(&'static str),

    #[error("not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// StatsSource
// ---------------------------------------------------------------------------

/// A provider of raw (un-enhanced) stat lines.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// One subject's line for a season. `Ok(None)` when the subject has no
    /// line for that season and group.
    async fn player_season(
        &self,
        player_id: u32,
        season: u16,
        group: StatGroup,
    ) -> Result<Option<StatLine>, FetchError>;

    /// Every subject's line for a season and group.
    async fn season_population(
        &self,
        season: u16,
        group: StatGroup,
    ) -> Result<Population, FetchError>;

    /// All of one subject's season splits, at every competition level.
    async fn year_by_year(
        &self,
        player_id: u32,
        group: StatGroup,
    ) -> Result<Vec<SeasonLine>, FetchError>;
}
