// Player card: one season line rated against the qualified league.

use serde::Serialize;

use dugout_baseball::percentile::calculate_median;
use dugout_baseball::population::ranking_value;
use dugout_baseball::{QualifiedPopulation, RatedStat, ReferenceFrame, ReferencePopulation, StatGroup, StatLine};

/// What a card was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardRequest {
    pub player_id: u32,
    pub season: u16,
    pub group: StatGroup,
}

/// A season's display columns, each with its league percentile and tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub player_id: u32,
    pub season: u16,
    pub group: StatGroup,
    pub frame: ReferenceFrame,
    /// Number of qualified subjects the percentiles were computed against.
    pub population_size: usize,
    pub line: StatLine,
    pub stats: Vec<RatedStat>,
}

impl PlayerCard {
    /// Rate an enhanced season line against a qualified population.
    pub fn build(request: CardRequest, line: StatLine, population: &QualifiedPopulation) -> Self {
        let stats = population.rate_columns(&line);
        PlayerCard {
            player_id: request.player_id,
            season: request.season,
            group: request.group,
            frame: population.frame(),
            population_size: population.len(),
            line,
            stats,
        }
    }

    pub fn stat(&self, key: &str) -> Option<&RatedStat> {
        self.stats.iter().find(|s| s.key == key)
    }
}

/// League median of each display column, for a "vs. league" comparison row.
pub fn league_medians(population: &QualifiedPopulation) -> Vec<(&'static str, Option<f64>)> {
    population
        .group()
        .display_columns()
        .iter()
        .map(|key| {
            let median = calculate_median(population.lines().map(|line| ranking_value(line, key)));
            (*key, median)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
