// Offline populations loaded from CSV exports.
//
// The header row names the columns. `name`, `player_id` and `team` are
// identity columns; every other column is read as a stat key, so an export
// of the stats API (`plateAppearances`, `homeRuns`, `avg`, ...) loads
// without a mapping step.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use dugout_baseball::{Population, PopulationEntry, SeasonLine, StatGroup, StatLine, StatValue};

use super::{FetchError, StatsSource};

const NAME_COLUMNS: &[&str] = &["name", "player", "fullname"];
const ID_COLUMNS: &[&str] = &["player_id", "playerid", "id"];
const TEAM_COLUMNS: &[&str] = &["team"];

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_population_from_reader<R: Read>(rdr: R, group: StatGroup) -> Result<Population, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut entries = Vec::new();
    for (row, result) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        match result {
            Ok(record) => match entry_from_record(record) {
                Some(entry) => entries.push(entry),
                None => warn!("skipping CSV row {}: no player name", row + 1),
            },
            Err(e) => {
                warn!("skipping malformed CSV row: {}", e);
            }
        }
    }
    Ok(Population::new(group, entries))
}

fn entry_from_record(record: HashMap<String, String>) -> Option<PopulationEntry> {
    let mut name = None;
    let mut player_id = None;
    let mut team = None;
    let mut line = StatLine::new();

    for (column, raw) in record {
        let value = raw.trim();
        let lowered = column.trim().to_lowercase();
        if NAME_COLUMNS.contains(&lowered.as_str()) {
            name = Some(value.to_string()).filter(|n| !n.is_empty());
        } else if ID_COLUMNS.contains(&lowered.as_str()) {
            player_id = match value.parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) if value.is_empty() => None,
                Err(_) => {
                    warn!("ignoring non-numeric player id '{}'", value);
                    None
                }
            };
        } else if TEAM_COLUMNS.contains(&lowered.as_str()) {
            team = Some(value.to_string()).filter(|t| !t.is_empty());
        } else if !value.is_empty() {
            line.set(column.trim(), StatValue::from(value));
        }
    }

    Some(PopulationEntry {
        player_id,
        name: name?,
        team,
        line,
    })
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load one group's population from a CSV file.
pub fn load_population(path: &Path, group: StatGroup) -> Result<Population, FetchError> {
    let file = std::fs::File::open(path).map_err(|e| FetchError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let population = load_population_from_reader(file, group).map_err(|e| FetchError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!(
        "loaded {} {} lines from {}",
        population.len(),
        group,
        path.display()
    );
    Ok(population)
}

// ---------------------------------------------------------------------------
// CsvPopulation
// ---------------------------------------------------------------------------

/// [`StatsSource`] over a single CSV file holding one season of one group.
///
/// The file is re-read on every call; the service layer caches results.
#[derive(Debug, Clone)]
pub struct CsvPopulation {
    path: PathBuf,
    group: StatGroup,
}

impl CsvPopulation {
    pub fn new(path: impl Into<PathBuf>, group: StatGroup) -> Self {
        Self {
            path: path.into(),
            group,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn group(&self) -> StatGroup {
        self.group
    }

    pub fn load(&self) -> Result<Population, FetchError> {
        load_population(&self.path, self.group)
    }
}

#[async_trait]
impl StatsSource for CsvPopulation {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn player_season(
        &self,
        player_id: u32,
        _season: u16,
        group: StatGroup,
    ) -> Result<Option<StatLine>, FetchError> {
        if group != self.group {
            return Ok(None);
        }
        let population = self.load()?;
        Ok(population.find_player(player_id).map(|e| e.line.clone()))
    }

    async fn season_population(
        &self,
        _season: u16,
        group: StatGroup,
    ) -> Result<Population, FetchError> {
        if group != self.group {
            return Ok(Population::new(group, Vec::new()));
        }
        self.load()
    }

    async fn year_by_year(
        &self,
        _player_id: u32,
        _group: StatGroup,
    ) -> Result<Vec<SeasonLine>, FetchError> {
        Err(FetchError::Unsupported("year-by-year history"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
