// Career and split aggregation.
//
// Rolls several stat lines for one subject into a single synthetic line.
// Counting stats are summed; rate stats are recomputed from the summed
// components, never averaged. Season rows are also rated against the
// subject's own history (self-relative percentiles), which is a different
// reference frame from the league populations in population.rs.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enhance::{enhance, enhance_hitting, total_bases};
use crate::format::{to_fixed, MISSING};
use crate::innings::Innings;
use crate::keys::{self, StatGroup};
use crate::percentile::{calculate_percentile, Direction};
use crate::population::{ranking_value, RatedStat, ReferenceFrame};
use crate::statline::{StatLine, StatValue};

/// Sport id of the top-level (major league) competition upstream.
pub const TOP_LEVEL_SPORT_ID: u32 = 1;

/// Fewest numeric season values a column needs before self-relative
/// percentiles are shown for it.
pub const DEFAULT_MIN_SAMPLE: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One season split for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonLine {
    /// Season year as delivered upstream (`"2023"`).
    pub season: String,
    /// Competition level; `None` when upstream omits it.
    pub sport_id: Option<u32>,
    pub team: Option<String>,
    pub line: StatLine,
}

impl SeasonLine {
    pub fn season_year(&self) -> Option<u16> {
        self.season.trim().parse().ok()
    }
}

/// Tunables for career building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRules {
    pub min_sample: usize,
    pub sport_id: u32,
}

impl Default for CareerRules {
    fn default() -> Self {
        CareerRules {
            min_sample: DEFAULT_MIN_SAMPLE,
            sport_id: TOP_LEVEL_SPORT_ID,
        }
    }
}

/// One season row with its stats rated against the subject's own seasons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerRow {
    pub season: String,
    pub team: Option<String>,
    pub line: StatLine,
    pub stats: Vec<RatedStat>,
}

/// Season-by-season table plus the synthetic career line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerTable {
    pub group: StatGroup,
    pub rows: Vec<CareerRow>,
    /// Present only when more than one season qualifies.
    pub career: Option<StatLine>,
}

impl CareerTable {
    /// Career totals formatted per display column (no percentiles).
    pub fn career_stats(&self) -> Option<Vec<RatedStat>> {
        self.career.as_ref().map(|line| {
            self.group
                .display_columns()
                .iter()
                .map(|key| RatedStat::with_percentile(line, key, None, ReferenceFrame::SelfHistory))
                .collect()
        })
    }
}

// ---------------------------------------------------------------------------
// Season selection
// ---------------------------------------------------------------------------

/// Keep splits at `sport_id`. Splits without a sport id are kept.
pub fn top_level_only(seasons: Vec<SeasonLine>, sport_id: u32) -> Vec<SeasonLine> {
    seasons
        .into_iter()
        .filter(|s| s.sport_id.map_or(true, |id| id == sport_id))
        .collect()
}

/// Ascending by numeric season; stable, unparseable seasons last.
pub fn sort_by_season(seasons: &mut [SeasonLine]) {
    seasons.sort_by_key(|s| match s.season_year() {
        Some(year) => (0, year),
        None => (1, 0),
    });
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Roll several lines of one group into one.
///
/// Works for careers and for any other split (last N games, home/away).
/// Rates with a non-positive denominator come out as `"-"`.
pub fn aggregate_lines<'a, I>(lines: I, group: StatGroup) -> StatLine
where
    I: IntoIterator<Item = &'a StatLine>,
{
    let lines: Vec<&StatLine> = lines.into_iter().collect();
    let mut total = sum_counting(&lines, group.counting_keys());
    match group {
        StatGroup::Hitting => {
            add_hitting_rates(&mut total);
            enhance_hitting(&total)
        }
        StatGroup::Pitching => {
            let innings = sum_innings(&lines);
            total.set(keys::INNINGS_PITCHED, innings.to_string());
            add_pitching_rates(&mut total, innings);
            total
        }
    }
}

fn sum_counting(lines: &[&StatLine], counting_keys: &[&str]) -> StatLine {
    let mut total = StatLine::new();
    for key in counting_keys {
        if !lines.iter().any(|line| line.contains(key)) {
            continue;
        }
        let sum: f64 = lines.iter().map(|line| line.number_or_zero(key)).sum();
        total.set(*key, sum);
    }
    total
}

fn sum_innings(lines: &[&StatLine]) -> Innings {
    lines
        .iter()
        .filter_map(|line| {
            let raw = line.get(keys::INNINGS_PITCHED)?;
            let parsed = Innings::parse(raw);
            if parsed.is_none() && !matches!(raw, StatValue::Null) {
                warn!("ignoring malformed inningsPitched value {raw:?}");
            }
            parsed
        })
        .sum()
}

fn ratio(numerator: f64, denominator: f64, digits: usize) -> StatValue {
    if denominator > 0.0 {
        StatValue::Text(to_fixed(numerator / denominator, digits))
    } else {
        StatValue::Text(MISSING.to_string())
    }
}

fn add_hitting_rates(total: &mut StatLine) {
    let at_bats = total.number_or_zero(keys::AT_BATS);
    let hits = total.number_or_zero(keys::HITS);
    let walks = total.number_or_zero(keys::BASE_ON_BALLS);
    let hbp = total.number_or_zero(keys::HIT_BY_PITCH);
    let sac_flies = total.number_or_zero(keys::SAC_FLIES);
    let bases = total_bases(total);

    let on_base = hits + walks + hbp;
    let obp_denominator = at_bats + walks + hbp + sac_flies;

    total.set(keys::AVG, ratio(hits, at_bats, 3));
    total.set(keys::OBP, ratio(on_base, obp_denominator, 3));
    total.set(keys::SLG, ratio(bases, at_bats, 3));

    let ops = if at_bats > 0.0 && obp_denominator > 0.0 {
        StatValue::Text(to_fixed(on_base / obp_denominator + bases / at_bats, 3))
    } else {
        StatValue::Text(MISSING.to_string())
    };
    total.set(keys::OPS, ops);
}

fn add_pitching_rates(total: &mut StatLine, innings: Innings) {
    let ip = innings.as_f64();
    let earned_runs = total.number_or_zero(keys::EARNED_RUNS);
    let hits = total.number_or_zero(keys::HITS);
    let walks = total.number_or_zero(keys::BASE_ON_BALLS);
    let strike_outs = total.number_or_zero(keys::STRIKE_OUTS);
    let home_runs = total.number_or_zero(keys::HOME_RUNS);

    let per_nine = |count: f64| {
        if ip > 0.0 {
            StatValue::Text(to_fixed(count / ip * 9.0, 2))
        } else {
            StatValue::Text(MISSING.to_string())
        }
    };

    total.set(keys::ERA, per_nine(earned_runs));
    total.set(keys::WHIP, ratio(walks + hits, ip, 2));
    total.set(keys::STRIKEOUTS_PER_9, per_nine(strike_outs));
    total.set(keys::WALKS_PER_9, per_nine(walks));
    total.set(keys::HITS_PER_9, per_nine(hits));
    total.set(keys::HOME_RUNS_PER_9, per_nine(home_runs));
    total.set(keys::STRIKEOUT_WALK_RATIO, ratio(strike_outs, walks, 2));
}

// ---------------------------------------------------------------------------
// Career table
// ---------------------------------------------------------------------------

/// Build the season table and career line for one subject.
///
/// Seasons outside the configured competition level are dropped, the rest
/// are sorted by season and enhanced. Each display column is rated against
/// the subject's own season values when at least `rules.min_sample` of them
/// are numeric.
pub fn build_career(seasons: Vec<SeasonLine>, group: StatGroup, rules: &CareerRules) -> CareerTable {
    let mut seasons = top_level_only(seasons, rules.sport_id);
    sort_by_season(&mut seasons);

    let lines: Vec<StatLine> = seasons.iter().map(|s| enhance(&s.line, group)).collect();

    let columns = group.display_columns();
    let percentiles: Vec<Vec<Option<u8>>> = columns
        .iter()
        .map(|key| self_relative(&lines, key, group, rules.min_sample))
        .collect();

    let rows = seasons
        .into_iter()
        .zip(lines.iter())
        .enumerate()
        .map(|(i, (season, line))| CareerRow {
            season: season.season,
            team: season.team,
            stats: columns
                .iter()
                .zip(&percentiles)
                .map(|(key, column)| {
                    RatedStat::with_percentile(line, key, column[i], ReferenceFrame::SelfHistory)
                })
                .collect(),
            line: line.clone(),
        })
        .collect::<Vec<_>>();

    let career = (rows.len() > 1).then(|| aggregate_lines(&lines, group));

    CareerTable { group, rows, career }
}

/// Each line's percentile for `key` among all the lines' values, or all
/// `None` when fewer than `min_sample` values are numeric.
fn self_relative(lines: &[StatLine], key: &str, group: StatGroup, min_sample: usize) -> Vec<Option<u8>> {
    let values: Vec<Option<f64>> = lines.iter().map(|line| ranking_value(line, key)).collect();
    if values.iter().flatten().count() < min_sample {
        return vec![None; lines.len()];
    }
    let direction = Direction::for_stat(key, group);
    values
        .iter()
        .map(|value| calculate_percentile(*value, values.iter().copied(), direction))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
