// Reference populations for league-relative percentiles.
//
// A raw `Population` and a `QualifiedPopulation` are distinct types: the
// latter can only be produced by the qualification filter, and every rating
// records which frame it was computed against.

use serde::{Deserialize, Serialize};

use crate::enhance::enhance;
use crate::format::format_stat_value;
use crate::innings::Innings;
use crate::keys::{self, StatGroup};
use crate::percentile::{calculate_percentile, Direction, PercentileTier};
use crate::qualify::{filter_entries, QualificationRules};
use crate::statline::StatLine;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One subject's line within a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub player_id: Option<u32>,
    pub name: String,
    pub team: Option<String>,
    pub line: StatLine,
}

/// Numeric value of `key` for ranking purposes. Innings pitched are decoded
/// from outs notation so `180.2` ranks above `180.1` by the right margin.
pub fn ranking_value(line: &StatLine, key: &str) -> Option<f64> {
    if key == keys::INNINGS_PITCHED {
        line.get(key).and_then(Innings::parse).map(|ip| ip.as_f64())
    } else {
        line.number(key)
    }
}

// ---------------------------------------------------------------------------
// Reference frames and ratings
// ---------------------------------------------------------------------------

/// What a percentile was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ReferenceFrame {
    /// Every subject in the league for the season and group.
    League { qualified: bool },
    /// The subject's own seasons.
    SelfHistory,
}

/// A single stat prepared for display: formatted value, percentile and tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedStat {
    pub key: String,
    pub display: String,
    pub percentile: Option<u8>,
    pub tier: PercentileTier,
    pub frame: ReferenceFrame,
}

impl RatedStat {
    /// Rate `line[key]` against already-extracted reference values.
    pub fn rate<I>(
        line: &StatLine,
        key: &str,
        reference: I,
        direction: Direction,
        frame: ReferenceFrame,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<f64>>,
    {
        let percentile = calculate_percentile(ranking_value(line, key), reference, direction);
        RatedStat::with_percentile(line, key, percentile, frame)
    }

    /// Build a rating with a known (or absent) percentile.
    pub fn with_percentile(
        line: &StatLine,
        key: &str,
        percentile: Option<u8>,
        frame: ReferenceFrame,
    ) -> Self {
        RatedStat {
            key: key.to_string(),
            display: format_stat_value(line.get(key), key),
            percentile,
            tier: PercentileTier::from_percentile(percentile),
            frame,
        }
    }

    pub fn color(&self) -> &'static str {
        self.tier.color()
    }
}

/// Anything a stat line can be ranked against at league level.
pub trait ReferencePopulation {
    fn group(&self) -> StatGroup;
    fn frame(&self) -> ReferenceFrame;
    fn lines(&self) -> Box<dyn Iterator<Item = &StatLine> + '_>;

    /// Ranking values of `key` across the population (missing entries kept
    /// as `None`; the percentile engine drops them).
    fn values(&self, key: &str) -> Vec<Option<f64>> {
        self.lines().map(|line| ranking_value(line, key)).collect()
    }

    /// Rate one stat of `line` against this population.
    fn rate(&self, line: &StatLine, key: &str) -> RatedStat {
        RatedStat::rate(
            line,
            key,
            self.values(key),
            Direction::for_stat(key, self.group()),
            self.frame(),
        )
    }

    /// Rate every display column of the group.
    fn rate_columns(&self, line: &StatLine) -> Vec<RatedStat> {
        self.group()
            .display_columns()
            .iter()
            .map(|key| self.rate(line, key))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Every subject's line for one season and group, unfiltered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub group: StatGroup,
    pub entries: Vec<PopulationEntry>,
}

impl Population {
    pub fn new(group: StatGroup, entries: Vec<PopulationEntry>) -> Self {
        Population { group, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy with every line passed through the enhancer, so derived stats
    /// (`iso`, `babip`, `walkRate`, ...) can be ranked.
    pub fn enhanced(&self) -> Population {
        Population {
            group: self.group,
            entries: self
                .entries
                .iter()
                .map(|entry| PopulationEntry {
                    line: enhance(&entry.line, self.group),
                    ..entry.clone()
                })
                .collect(),
        }
    }

    /// Restrict to subjects meeting the minimum-volume threshold.
    pub fn qualify(&self, rules: &QualificationRules) -> QualifiedPopulation {
        QualifiedPopulation {
            group: self.group,
            rules: *rules,
            entries: filter_entries(&self.entries, self.group, rules),
        }
    }

    pub fn find_player(&self, player_id: u32) -> Option<&PopulationEntry> {
        self.entries.iter().find(|e| e.player_id == Some(player_id))
    }

    /// Case-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&PopulationEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name.trim().to_lowercase() == wanted)
    }
}

impl ReferencePopulation for Population {
    fn group(&self) -> StatGroup {
        self.group
    }

    fn frame(&self) -> ReferenceFrame {
        ReferenceFrame::League { qualified: false }
    }

    fn lines(&self) -> Box<dyn Iterator<Item = &StatLine> + '_> {
        Box::new(self.entries.iter().map(|e| &e.line))
    }
}

// ---------------------------------------------------------------------------
// QualifiedPopulation
// ---------------------------------------------------------------------------

/// A population restricted to qualified subjects. Only constructible through
/// [`Population::qualify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifiedPopulation {
    group: StatGroup,
    rules: QualificationRules,
    entries: Vec<PopulationEntry>,
}

impl QualifiedPopulation {
    pub fn entries(&self) -> &[PopulationEntry] {
        &self.entries
    }

    pub fn rules(&self) -> &QualificationRules {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filter again with (possibly stricter) rules.
    pub fn requalify(&self, rules: &QualificationRules) -> QualifiedPopulation {
        QualifiedPopulation {
            group: self.group,
            rules: *rules,
            entries: filter_entries(&self.entries, self.group, rules),
        }
    }
}

impl ReferencePopulation for QualifiedPopulation {
    fn group(&self) -> StatGroup {
        self.group
    }

    fn frame(&self) -> ReferenceFrame {
        ReferenceFrame::League { qualified: true }
    }

    fn lines(&self) -> Box<dyn Iterator<Item = &StatLine> + '_> {
        Box::new(self.entries.iter().map(|e| &e.line))
    }
}

/// Percentile of `line[key]` within a qualified league population, in the
/// direction appropriate for the key.
pub fn league_percentile(line: &StatLine, key: &str, population: &QualifiedPopulation) -> Option<u8> {
    calculate_percentile(
        ranking_value(line, key),
        population.values(key),
        Direction::for_stat(key, population.group),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
