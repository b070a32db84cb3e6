// Minimum-volume qualification for percentile reference populations.

use serde::{Deserialize, Serialize};

use crate::innings::Innings;
use crate::keys::{self, StatGroup};
use crate::population::PopulationEntry;
use crate::statline::StatLine;

/// Default plate-appearance floor for hitters.
pub const DEFAULT_MIN_PLATE_APPEARANCES: f64 = 200.0;

/// Default innings floor for pitchers.
pub const DEFAULT_MIN_INNINGS_PITCHED: f64 = 50.0;

/// Volume thresholds a subject must meet to join a qualified population.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualificationRules {
    pub min_plate_appearances: f64,
    pub min_innings_pitched: f64,
}

impl Default for QualificationRules {
    fn default() -> Self {
        QualificationRules {
            min_plate_appearances: DEFAULT_MIN_PLATE_APPEARANCES,
            min_innings_pitched: DEFAULT_MIN_INNINGS_PITCHED,
        }
    }
}

impl QualificationRules {
    /// The volume measure this rule set compares for `group`. Unparseable
    /// volumes count as zero.
    pub fn volume(line: &StatLine, group: StatGroup) -> f64 {
        match group {
            StatGroup::Hitting => line.number_or_zero(keys::PLATE_APPEARANCES),
            StatGroup::Pitching => line
                .get(keys::INNINGS_PITCHED)
                .and_then(Innings::parse)
                .map(|ip| ip.as_f64())
                .unwrap_or(0.0),
        }
    }

    pub fn threshold(&self, group: StatGroup) -> f64 {
        match group {
            StatGroup::Hitting => self.min_plate_appearances,
            StatGroup::Pitching => self.min_innings_pitched,
        }
    }

    pub fn is_qualified(&self, line: &StatLine, group: StatGroup) -> bool {
        Self::volume(line, group) >= self.threshold(group)
    }
}

/// Lines meeting the threshold, cloned unchanged and in input order.
/// Idempotent for a fixed rule set.
pub fn filter_qualified(
    lines: &[StatLine],
    group: StatGroup,
    rules: &QualificationRules,
) -> Vec<StatLine> {
    lines
        .iter()
        .filter(|line| rules.is_qualified(line, group))
        .cloned()
        .collect()
}

pub(crate) fn filter_entries(
    entries: &[PopulationEntry],
    group: StatGroup,
    rules: &QualificationRules,
) -> Vec<PopulationEntry> {
    entries
        .iter()
        .filter(|entry| rules.is_qualified(&entry.line, group))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
