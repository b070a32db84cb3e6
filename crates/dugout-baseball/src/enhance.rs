// Composite hitting stats derived from a raw stat line.
//
// Derived fields are always recomputed from base fields. Values already
// present under a derived key on the input are overwritten, never read.

use crate::format::to_fixed;
use crate::keys::{self, StatGroup};
use crate::statline::StatLine;

/// BABIP placeholder when the denominator is not positive.
pub const BABIP_UNDEFINED: &str = ".000";

/// Walk/strikeout rate placeholder when there are no plate appearances.
pub const RATE_UNDEFINED: &str = "0.0";

/// Enhance a line for its group. Pitching lines pass through unchanged.
pub fn enhance(line: &StatLine, group: StatGroup) -> StatLine {
    match group {
        StatGroup::Hitting => enhance_hitting(line),
        StatGroup::Pitching => line.clone(),
    }
}

/// Return a copy of `line` with `extraBaseHits`, `totalBases`, `iso`,
/// `babip`, `walkRate` and `strikeoutRate` added.
///
/// Missing or unparseable inputs count as zero; rates whose denominator is
/// not positive fall back to [`BABIP_UNDEFINED`] / [`RATE_UNDEFINED`].
pub fn enhance_hitting(line: &StatLine) -> StatLine {
    let hits = line.number_or_zero(keys::HITS);
    let home_runs = line.number_or_zero(keys::HOME_RUNS);
    let at_bats = line.number_or_zero(keys::AT_BATS);
    let strike_outs = line.number_or_zero(keys::STRIKE_OUTS);
    let sac_flies = line.number_or_zero(keys::SAC_FLIES);
    let walks = line.number_or_zero(keys::BASE_ON_BALLS);
    let plate_appearances = line.number_or_zero(keys::PLATE_APPEARANCES);

    let mut enhanced = line.clone();
    enhanced.set(keys::EXTRA_BASE_HITS, extra_base_hits(line));
    enhanced.set(keys::TOTAL_BASES, total_bases(line));

    let iso = line.number_or_zero(keys::SLG) - line.number_or_zero(keys::AVG);
    enhanced.set(keys::ISO, to_fixed(iso, 3));

    let babip_denominator = at_bats - strike_outs - home_runs + sac_flies;
    let babip = if babip_denominator > 0.0 {
        to_fixed((hits - home_runs) / babip_denominator, 3)
    } else {
        BABIP_UNDEFINED.to_string()
    };
    enhanced.set(keys::BABIP, babip);

    enhanced.set(keys::WALK_RATE, per_plate_appearance(walks, plate_appearances));
    enhanced.set(
        keys::STRIKEOUT_RATE,
        per_plate_appearance(strike_outs, plate_appearances),
    );

    enhanced
}

/// `doubles + triples + homeRuns`.
pub fn extra_base_hits(line: &StatLine) -> f64 {
    line.number_or_zero(keys::DOUBLES)
        + line.number_or_zero(keys::TRIPLES)
        + line.number_or_zero(keys::HOME_RUNS)
}

/// `singles + 2*doubles + 3*triples + 4*homeRuns`, where singles are hits
/// minus extra-base hits.
pub fn total_bases(line: &StatLine) -> f64 {
    let doubles = line.number_or_zero(keys::DOUBLES);
    let triples = line.number_or_zero(keys::TRIPLES);
    let home_runs = line.number_or_zero(keys::HOME_RUNS);
    let singles = line.number_or_zero(keys::HITS) - extra_base_hits(line);
    singles + 2.0 * doubles + 3.0 * triples + 4.0 * home_runs
}

fn per_plate_appearance(count: f64, plate_appearances: f64) -> String {
    if plate_appearances > 0.0 {
        to_fixed(count / plate_appearances * 100.0, 1)
    } else {
        RATE_UNDEFINED.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
