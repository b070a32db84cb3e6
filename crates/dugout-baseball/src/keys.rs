// Stat groups and the upstream stat key names the engine reads and writes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Stat group
// ---------------------------------------------------------------------------

/// Which side of the ball a stat line describes. Hitting and pitching keys
/// overlap (`hits`, `homeRuns`, `strikeOuts`) but mean different things, so
/// a line always belongs to exactly one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatGroup {
    Hitting,
    Pitching,
}

impl StatGroup {
    /// The upstream API's group name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatGroup::Hitting => "hitting",
            StatGroup::Pitching => "pitching",
        }
    }

    /// Additive stats summed when rolling up several lines.
    pub fn counting_keys(&self) -> &'static [&'static str] {
        match self {
            StatGroup::Hitting => HITTING_COUNTING,
            StatGroup::Pitching => PITCHING_COUNTING,
        }
    }

    /// Columns shown on player cards and career tables, in display order.
    pub fn display_columns(&self) -> &'static [&'static str] {
        match self {
            StatGroup::Hitting => HITTING_COLUMNS,
            StatGroup::Pitching => PITCHING_COLUMNS,
        }
    }
}

impl fmt::Display for StatGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown stat group `{0}` (expected `hitting` or `pitching`)")]
pub struct UnknownStatGroup(pub String);

impl FromStr for StatGroup {
    type Err = UnknownStatGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hitting" | "batting" => Ok(StatGroup::Hitting),
            "pitching" => Ok(StatGroup::Pitching),
            other => Err(UnknownStatGroup(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Key names
// ---------------------------------------------------------------------------

pub const GAMES_PLAYED: &str = "gamesPlayed";
pub const GAMES_STARTED: &str = "gamesStarted";
pub const PLATE_APPEARANCES: &str = "plateAppearances";
pub const AT_BATS: &str = "atBats";
pub const RUNS: &str = "runs";
pub const HITS: &str = "hits";
pub const DOUBLES: &str = "doubles";
pub const TRIPLES: &str = "triples";
pub const HOME_RUNS: &str = "homeRuns";
pub const RBI: &str = "rbi";
pub const STOLEN_BASES: &str = "stolenBases";
pub const CAUGHT_STEALING: &str = "caughtStealing";
pub const BASE_ON_BALLS: &str = "baseOnBalls";
pub const INTENTIONAL_WALKS: &str = "intentionalWalks";
pub const STRIKE_OUTS: &str = "strikeOuts";
pub const HIT_BY_PITCH: &str = "hitByPitch";
pub const SAC_FLIES: &str = "sacFlies";
pub const SAC_BUNTS: &str = "sacBunts";
pub const GROUND_INTO_DOUBLE_PLAY: &str = "groundIntoDoublePlay";

pub const AVG: &str = "avg";
pub const OBP: &str = "obp";
pub const SLG: &str = "slg";
pub const OPS: &str = "ops";

// Derived by the enhancer.
pub const EXTRA_BASE_HITS: &str = "extraBaseHits";
pub const TOTAL_BASES: &str = "totalBases";
pub const ISO: &str = "iso";
pub const BABIP: &str = "babip";
pub const WALK_RATE: &str = "walkRate";
pub const STRIKEOUT_RATE: &str = "strikeoutRate";

// Pitching.
pub const WINS: &str = "wins";
pub const LOSSES: &str = "losses";
pub const SAVES: &str = "saves";
pub const HOLDS: &str = "holds";
pub const BLOWN_SAVES: &str = "blownSaves";
pub const COMPLETE_GAMES: &str = "completeGames";
pub const SHUTOUTS: &str = "shutouts";
pub const INNINGS_PITCHED: &str = "inningsPitched";
pub const EARNED_RUNS: &str = "earnedRuns";
pub const HIT_BATSMEN: &str = "hitBatsmen";
pub const BATTERS_FACED: &str = "battersFaced";
pub const ERA: &str = "era";
pub const WHIP: &str = "whip";
pub const STRIKEOUTS_PER_9: &str = "strikeoutsPer9Inn";
pub const WALKS_PER_9: &str = "walksPer9Inn";
pub const HITS_PER_9: &str = "hitsPer9Inn";
pub const HOME_RUNS_PER_9: &str = "homeRunsPer9";
pub const STRIKEOUT_WALK_RATIO: &str = "strikeoutWalkRatio";

const HITTING_COUNTING: &[&str] = &[
    GAMES_PLAYED,
    PLATE_APPEARANCES,
    AT_BATS,
    RUNS,
    HITS,
    DOUBLES,
    TRIPLES,
    HOME_RUNS,
    RBI,
    STOLEN_BASES,
    CAUGHT_STEALING,
    BASE_ON_BALLS,
    INTENTIONAL_WALKS,
    STRIKE_OUTS,
    HIT_BY_PITCH,
    SAC_FLIES,
    SAC_BUNTS,
    GROUND_INTO_DOUBLE_PLAY,
];

// inningsPitched is additive too but needs thirds arithmetic; see innings.rs.
const PITCHING_COUNTING: &[&str] = &[
    GAMES_PLAYED,
    GAMES_STARTED,
    WINS,
    LOSSES,
    SAVES,
    HOLDS,
    BLOWN_SAVES,
    COMPLETE_GAMES,
    SHUTOUTS,
    HITS,
    RUNS,
    EARNED_RUNS,
    HOME_RUNS,
    BASE_ON_BALLS,
    STRIKE_OUTS,
    HIT_BATSMEN,
    BATTERS_FACED,
];

const HITTING_COLUMNS: &[&str] = &[
    GAMES_PLAYED,
    PLATE_APPEARANCES,
    HITS,
    HOME_RUNS,
    RBI,
    RUNS,
    STOLEN_BASES,
    AVG,
    OBP,
    SLG,
    OPS,
    ISO,
    BABIP,
    WALK_RATE,
    STRIKEOUT_RATE,
];

const PITCHING_COLUMNS: &[&str] = &[
    GAMES_PLAYED,
    GAMES_STARTED,
    WINS,
    LOSSES,
    SAVES,
    INNINGS_PITCHED,
    STRIKE_OUTS,
    ERA,
    WHIP,
    STRIKEOUTS_PER_9,
    WALKS_PER_9,
    HITS_PER_9,
    HOME_RUNS_PER_9,
    STRIKEOUT_WALK_RATIO,
];
