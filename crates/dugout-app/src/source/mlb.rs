// MLB Stats API client.
//
// Plain JSON over HTTPS, no auth. Every stats endpoint answers with the same
// envelope: `{"stats": [{"splits": [{season, stat, player, team, sport}]}]}`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use dugout_baseball::{Population, PopulationEntry, SeasonLine, StatGroup, StatLine};
use dugout_core::config::ApiConfig;

use super::{FetchError, StatsSource};

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    stats: Vec<StatsBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsBlock {
    #[serde(default)]
    splits: Vec<Split>,
}

#[derive(Debug, Deserialize)]
struct Split {
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    stat: StatLine,
    #[serde(default)]
    player: Option<PersonRef>,
    #[serde(default)]
    team: Option<TeamRef>,
    #[serde(default)]
    sport: Option<SportRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonRef {
    id: Option<u32>,
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SportRef {
    id: Option<u32>,
}

impl StatsResponse {
    fn into_splits(self) -> impl Iterator<Item = Split> {
        self.stats.into_iter().flat_map(|block| block.splits)
    }
}

// ---------------------------------------------------------------------------
// Response conversion
// ---------------------------------------------------------------------------

/// First split at `sport_id` (or with no sport given).
fn season_line_from(response: StatsResponse, sport_id: u32) -> Option<StatLine> {
    response
        .into_splits()
        .find(|split| split.sport.as_ref().and_then(|s| s.id).map_or(true, |id| id == sport_id))
        .map(|split| split.stat)
}

fn population_from(response: StatsResponse, group: StatGroup) -> Population {
    let entries = response
        .into_splits()
        .filter_map(|split| {
            let Some(player) = split.player else {
                warn!("skipping population split without a player");
                return None;
            };
            Some(PopulationEntry {
                player_id: player.id,
                name: player.full_name.unwrap_or_default(),
                team: split.team.and_then(|t| t.name),
                line: split.stat,
            })
        })
        .collect();
    Population::new(group, entries)
}

/// Season splits in upstream order. A player traded mid-season gets one
/// split per team plus a team-less total; only the total is kept so
/// aggregation does not count that season twice.
fn seasons_from(response: StatsResponse) -> Vec<SeasonLine> {
    let seasons: Vec<SeasonLine> = response
        .into_splits()
        .map(|split| SeasonLine {
            season: split.season.unwrap_or_default(),
            sport_id: split.sport.and_then(|s| s.id),
            team: split.team.and_then(|t| t.name),
            line: split.stat,
        })
        .collect();

    let mut has_total: HashMap<(String, Option<u32>), bool> = HashMap::new();
    let mut split_count: HashMap<(String, Option<u32>), usize> = HashMap::new();
    for s in &seasons {
        let key = (s.season.clone(), s.sport_id);
        *split_count.entry(key.clone()).or_default() += 1;
        if s.team.is_none() {
            has_total.insert(key, true);
        }
    }

    seasons
        .into_iter()
        .filter(|s| {
            let key = (s.season.clone(), s.sport_id);
            let traded = split_count.get(&key).copied().unwrap_or(0) > 1
                && has_total.get(&key).copied().unwrap_or(false);
            !traded || s.team.is_none()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MlbStatsClient
// ---------------------------------------------------------------------------

/// [`StatsSource`] backed by the public MLB Stats API.
pub struct MlbStatsClient {
    http: reqwest::Client,
    base_url: String,
    sport_id: u32,
    population_limit: u32,
}

impl MlbStatsClient {
    pub fn new(
        base_url: impl Into<String>,
        sport_id: u32,
        population_limit: u32,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http {
                url: base_url.clone(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url,
            sport_id,
            population_limit,
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, FetchError> {
        Self::new(
            api.base_url.clone(),
            api.sport_id,
            api.population_limit,
            api.timeout(),
        )
    }

    fn person_stats_url(&self, player_id: u32, kind: &str, group: StatGroup, season: Option<u16>) -> String {
        let mut url = format!(
            "{}/api/v1/people/{}/stats?stats={}&group={}",
            self.base_url, player_id, kind, group
        );
        if let Some(season) = season {
            url.push_str(&format!("&season={season}"));
        }
        url
    }

    fn population_url(&self, season: u16, group: StatGroup) -> String {
        format!(
            "{}/api/v1/stats?stats=season&group={}&season={}&sportId={}&playerPool=ALL&limit={}",
            self.base_url, group, season, self.sport_id, self.population_limit
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl StatsSource for MlbStatsClient {
    fn name(&self) -> &'static str {
        "mlb-stats-api"
    }

    async fn player_season(
        &self,
        player_id: u32,
        season: u16,
        group: StatGroup,
    ) -> Result<Option<StatLine>, FetchError> {
        let url = self.person_stats_url(player_id, "season", group, Some(season));
        let response: StatsResponse = self.get_json(&url).await?;
        Ok(season_line_from(response, self.sport_id))
    }

    async fn season_population(
        &self,
        season: u16,
        group: StatGroup,
    ) -> Result<Population, FetchError> {
        let url = self.population_url(season, group);
        let response: StatsResponse = self.get_json(&url).await?;
        let population = population_from(response, group);
        info!(
            "fetched {} {} lines for {}",
            population.len(),
            group,
            season
        );
        Ok(population)
    }

    async fn year_by_year(
        &self,
        player_id: u32,
        group: StatGroup,
    ) -> Result<Vec<SeasonLine>, FetchError> {
        let url = self.person_stats_url(player_id, "yearByYear", group, None);
        let response: StatsResponse = self.get_json(&url).await?;
        Ok(seasons_from(response))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
