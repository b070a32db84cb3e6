// Percentile ranking against a reference population, and the five-tier
// colour scale the display layer uses.
//
// The ranking primitive knows nothing about leagues or careers: callers pick
// the reference population (a qualified league population, or a player's
// own seasons) and pass the extracted values in.

use serde::Serialize;

use crate::keys::{self, StatGroup};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Whether a larger value ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Direction {
    /// Ranking direction for a stat key within a group.
    pub fn for_stat(key: &str, group: StatGroup) -> Self {
        let lower = match group {
            StatGroup::Hitting => HITTING_LOWER_IS_BETTER.contains(&key),
            StatGroup::Pitching => PITCHING_LOWER_IS_BETTER.contains(&key),
        };
        if lower {
            Direction::LowerIsBetter
        } else {
            Direction::HigherIsBetter
        }
    }
}

const HITTING_LOWER_IS_BETTER: &[&str] = &[
    keys::STRIKE_OUTS,
    keys::STRIKEOUT_RATE,
    keys::CAUGHT_STEALING,
    keys::GROUND_INTO_DOUBLE_PLAY,
];

// Opponent slash-line stats on a pitching line are allowed, not produced.
const PITCHING_LOWER_IS_BETTER: &[&str] = &[
    keys::ERA,
    keys::WHIP,
    keys::WALKS_PER_9,
    keys::HITS_PER_9,
    keys::HOME_RUNS_PER_9,
    keys::BASE_ON_BALLS,
    keys::HITS,
    keys::EARNED_RUNS,
    keys::RUNS,
    keys::HOME_RUNS,
    keys::LOSSES,
    keys::BLOWN_SAVES,
    keys::AVG,
    keys::OBP,
    keys::SLG,
    keys::OPS,
];

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Percentile rank of `value` within `population`, in `[0, 100]`.
///
/// Non-finite and missing population entries are dropped. Values tied with
/// `value` are credited at their midpoint. Returns `None` when the value is
/// missing/non-finite or no usable population entries remain.
///
/// The value need not be a member of the population; including it is the
/// caller's decision and only affects the tie term.
pub fn calculate_percentile<V, I>(value: V, population: I, direction: Direction) -> Option<u8>
where
    V: Into<Option<f64>>,
    I: IntoIterator,
    I::Item: Into<Option<f64>>,
{
    let value = value.into().filter(|v| v.is_finite())?;
    let mut sorted = finite_values(population);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let below = sorted.partition_point(|v| *v < value);
    let through_ties = sorted.partition_point(|v| *v <= value);
    let ties = through_ties - below;

    let raw = (below as f64 + ties as f64 / 2.0) / sorted.len() as f64 * 100.0;
    let directed = match direction {
        Direction::HigherIsBetter => raw,
        Direction::LowerIsBetter => 100.0 - raw,
    };
    Some(round_half_up(directed).clamp(0.0, 100.0) as u8)
}

/// Median of the finite values; mean of the two middle elements for even
/// counts. `None` for an empty input.
pub fn calculate_median<I>(values: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Into<Option<f64>>,
{
    let mut sorted = finite_values(values);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn finite_values<I>(values: I) -> Vec<f64>
where
    I: IntoIterator,
    I::Item: Into<Option<f64>>,
{
    values
        .into_iter()
        .filter_map(|v| -> Option<f64> { v.into() })
        .filter(|v| v.is_finite())
        .collect()
}

// Math.round semantics: .5 goes up.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Five-tier severity scale plus an unknown bucket for missing percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileTier {
    /// 80 and above.
    Elite,
    /// 60-79.
    AboveAverage,
    /// 40-59.
    Average,
    /// 20-39.
    BelowAverage,
    /// 0-19.
    Poor,
    /// No percentile could be computed.
    Unknown,
}

impl PercentileTier {
    pub fn from_percentile(percentile: Option<u8>) -> Self {
        match percentile {
            None => PercentileTier::Unknown,
            Some(80..=u8::MAX) => PercentileTier::Elite,
            Some(60..=79) => PercentileTier::AboveAverage,
            Some(40..=59) => PercentileTier::Average,
            Some(20..=39) => PercentileTier::BelowAverage,
            Some(_) => PercentileTier::Poor,
        }
    }

    /// Hex colour for the tier.
    pub fn color(&self) -> &'static str {
        match self {
            PercentileTier::Elite => "#22c55e",
            PercentileTier::AboveAverage => "#84cc16",
            PercentileTier::Average => "#eab308",
            PercentileTier::BelowAverage => "#f97316",
            PercentileTier::Poor => "#ef4444",
            PercentileTier::Unknown => "#666666",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PercentileTier::Elite => "elite",
            PercentileTier::AboveAverage => "above average",
            PercentileTier::Average => "average",
            PercentileTier::BelowAverage => "below average",
            PercentileTier::Poor => "poor",
            PercentileTier::Unknown => "unknown",
        }
    }
}

/// Colour for a percentile (or its absence).
pub fn percentile_color(percentile: Option<u8>) -> &'static str {
    PercentileTier::from_percentile(percentile).color()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const POP: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];

    #[test]
    fn ranks_with_midpoint_ties() {
        // 4 below, 1 tie: (4 + 0.5) / 10 = 45%
        assert_eq!(calculate_percentile(5.0, POP, Direction::HigherIsBetter), Some(45));
        // not a member: 5 below, no ties
        assert_eq!(calculate_percentile(5.5, POP, Direction::HigherIsBetter), Some(50));
    }

    #[test]
    fn ties_share_the_midpoint() {
        let pop = [0.300, 0.300, 0.300, 0.300];
        assert_eq!(calculate_percentile(0.300, pop, Direction::HigherIsBetter), Some(50));
        assert_eq!(calculate_percentile(0.300, pop, Direction::LowerIsBetter), Some(50));
    }

    #[test]
    fn lower_is_better_inverts() {
        assert_eq!(calculate_percentile(2.0, POP, Direction::LowerIsBetter), Some(85));
        assert_eq!(calculate_percentile(2.0, POP, Direction::HigherIsBetter), Some(15));
    }

    #[test]
    fn extremes_touch_bounds() {
        assert_eq!(calculate_percentile(0.0, POP, Direction::HigherIsBetter), Some(0));
        assert_eq!(calculate_percentile(11.0, POP, Direction::HigherIsBetter), Some(100));
        assert_eq!(calculate_percentile(11.0, POP, Direction::LowerIsBetter), Some(0));
    }

    #[test]
    fn empty_population_is_none() {
        let empty: [f64; 0] = [];
        assert_eq!(calculate_percentile(1.0, empty, Direction::HigherIsBetter), None);
        assert_eq!(calculate_percentile(1.0, empty, Direction::LowerIsBetter), None);
        assert_eq!(
            calculate_percentile(1.0, [None, Some(f64::NAN)], Direction::HigherIsBetter),
            None
        );
    }

    #[test]
    fn missing_value_is_none() {
        assert_eq!(calculate_percentile(None::<f64>, POP, Direction::HigherIsBetter), None);
        assert_eq!(calculate_percentile(f64::NAN, POP, Direction::HigherIsBetter), None);
    }

    #[test]
    fn non_numeric_population_entries_are_dropped() {
        let pop = vec![Some(1.0), None, Some(f64::NAN), Some(3.0)];
        // below = 1 of 2 usable values
        assert_eq!(calculate_percentile(2.0, pop, Direction::HigherIsBetter), Some(50));
    }

    #[test]
    fn monotonic_in_value() {
        let mut last = 0;
        for step in 0..=120 {
            let v = step as f64 / 10.0;
            let p = calculate_percentile(v, POP, Direction::HigherIsBetter).unwrap();
            assert!(p >= last, "percentile dropped at {v}: {p} < {last}");
            last = p;
        }
    }

    #[test]
    fn directions_are_complementary() {
        let pop = [0.210, 0.245, 0.251, 0.262, 0.270, 0.288, 0.301, 0.315];
        for v in [0.200, 0.250, 0.275, 0.310, 0.400] {
            let up = calculate_percentile(v, pop, Direction::HigherIsBetter).unwrap() as i32;
            let down = calculate_percentile(v, pop, Direction::LowerIsBetter).unwrap() as i32;
            assert!((up + down - 100).abs() <= 1, "{v}: {up} + {down}");
        }
    }

    #[test]
    fn rounds_half_up() {
        // 1 below of 8 = 12.5% → 13; inverted 87.5% → 88
        let pop = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(calculate_percentile(1.5, pop, Direction::HigherIsBetter), Some(13));
        assert_eq!(calculate_percentile(1.5, pop, Direction::LowerIsBetter), Some(88));
    }

    // -- Median --

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(calculate_median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(calculate_median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(calculate_median(Vec::<f64>::new()), None);
        assert_eq!(calculate_median([None, Some(5.0)]), Some(5.0));
    }

    // -- Tiers --

    #[test]
    fn tier_boundaries_are_inclusive_at_lower_edge() {
        assert_eq!(percentile_color(None), "#666666");
        assert_eq!(percentile_color(Some(100)), "#22c55e");
        assert_eq!(percentile_color(Some(80)), "#22c55e");
        assert_eq!(percentile_color(Some(79)), "#84cc16");
        assert_eq!(percentile_color(Some(60)), "#84cc16");
        assert_eq!(percentile_color(Some(59)), "#eab308");
        assert_eq!(percentile_color(Some(40)), "#eab308");
        assert_eq!(percentile_color(Some(39)), "#f97316");
        assert_eq!(percentile_color(Some(20)), "#f97316");
        assert_eq!(percentile_color(Some(19)), "#ef4444");
        assert_eq!(percentile_color(Some(0)), "#ef4444");
    }

    #[test]
    fn direction_table() {
        assert_eq!(Direction::for_stat("era", StatGroup::Pitching), Direction::LowerIsBetter);
        assert_eq!(Direction::for_stat("strikeOuts", StatGroup::Pitching), Direction::HigherIsBetter);
        assert_eq!(Direction::for_stat("strikeOuts", StatGroup::Hitting), Direction::LowerIsBetter);
        assert_eq!(Direction::for_stat("homeRuns", StatGroup::Hitting), Direction::HigherIsBetter);
        assert_eq!(Direction::for_stat("homeRuns", StatGroup::Pitching), Direction::LowerIsBetter);
    }
}
