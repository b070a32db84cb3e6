// Innings-pitched arithmetic.
//
// Upstream encodes partial innings in outs notation: `180.1` is 180⅓
// innings and `120.2` is 120⅔, never tenths. Values are held as whole outs
// so sums stay exact.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::statline::StatValue;

const OUTS_PER_INNING: u32 = 3;
const NUMERIC_TOLERANCE: f64 = 1e-6;

/// A non-negative number of innings, stored as outs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Innings {
    outs: u32,
}

impl Innings {
    pub fn from_outs(outs: u32) -> Self {
        Innings { outs }
    }

    pub fn outs(&self) -> u32 {
        self.outs
    }

    /// True innings as a real number (`180.1` → 180.333…). Use this for
    /// rate denominators and threshold comparisons.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.outs) / f64::from(OUTS_PER_INNING)
    }

    /// Decode an upstream innings value.
    ///
    /// Returns `None` for missing values, negatives, and fractional parts
    /// other than `.0`, `.1` or `.2` (which would be a data error in outs
    /// notation).
    pub fn parse(value: &StatValue) -> Option<Self> {
        match value {
            StatValue::Number(n) => Self::from_number(*n),
            StatValue::Text(s) => Self::parse_str(s),
            StatValue::Null => None,
        }
    }

    /// Decode the textual form, e.g. `"180.1"`, `"57"`, `"12.20"`.
    pub fn parse_str(s: &str) -> Option<Self> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        let whole: u32 = if whole.is_empty() {
            0
        } else if whole.bytes().all(|b| b.is_ascii_digit()) {
            whole.parse().ok()?
        } else {
            return None;
        };
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let thirds = match fraction.trim_end_matches('0') {
            "" => 0,
            "1" => 1,
            "2" => 2,
            _ => return None,
        };
        Self::from_parts(whole, thirds)
    }

    fn from_number(n: f64) -> Option<Self> {
        if !n.is_finite() || n < 0.0 {
            return None;
        }
        let whole = n.trunc();
        let fraction = n - whole;
        let thirds = [0.0, 0.1, 0.2]
            .iter()
            .position(|t| (fraction - t).abs() < NUMERIC_TOLERANCE)?;
        if whole > f64::from(u32::MAX) {
            return None;
        }
        Self::from_parts(whole as u32, thirds as u32)
    }

    /// `None` when the total does not fit in the outs counter.
    fn from_parts(whole: u32, thirds: u32) -> Option<Self> {
        whole
            .checked_mul(OUTS_PER_INNING)
            .and_then(|outs| outs.checked_add(thirds))
            .map(Innings::from_outs)
    }
}

impl fmt::Display for Innings {
    /// Outs notation with one decimal place: 903 outs → `301.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.outs / OUTS_PER_INNING,
            self.outs % OUTS_PER_INNING
        )
    }
}

impl Add for Innings {
    type Output = Innings;

    /// Saturates at the largest representable count.
    fn add(self, rhs: Innings) -> Innings {
        Innings::from_outs(self.outs.saturating_add(rhs.outs))
    }
}

impl Sum for Innings {
    fn sum<I: Iterator<Item = Innings>>(iter: I) -> Innings {
        iter.fold(Innings::default(), Add::add)
    }
}
