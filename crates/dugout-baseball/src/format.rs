// Display formatting for stat values.
//
// The upstream web client formats with `Number.prototype.toFixed`, which
// rounds exact binary ties away from zero. Rust's `{:.N}` rounds ties to
// even, so `to_fixed` reproduces the former to keep derived strings stable.

use crate::keys;
use crate::statline::{StatLine, StatValue};

/// Placeholder shown for missing, unparseable, or uncomputable values.
pub const MISSING: &str = "-";

/// An f64 has at most 1074 fractional decimal digits, so formatting with
/// this precision yields the exact decimal expansion.
const EXACT_DIGITS: usize = 1074;

// ---------------------------------------------------------------------------
// Fixed-point rendering
// ---------------------------------------------------------------------------

/// Render `value` with exactly `digits` fractional digits, rounding the
/// way JavaScript's `toFixed` does.
pub fn to_fixed(value: f64, digits: usize) -> String {
    let digits = digits.min(EXACT_DIGITS - 1);
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let exact = format!("{:.*}", EXACT_DIGITS, magnitude);
    let Some(dot) = exact.find('.') else {
        return format!("{sign}{:.*}", digits, magnitude);
    };
    let cut = if digits == 0 { dot } else { dot + 1 + digits };
    let tail = &exact[dot + 1 + digits..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    if is_tie {
        format!("{sign}{}", increment_decimal(&exact[..cut]))
    } else {
        format!("{sign}{:.*}", digits, magnitude)
    }
}

/// Add one unit in the last place of a non-negative decimal string.
fn increment_decimal(truncated: &str) -> String {
    let mut bytes: Vec<u8> = truncated.bytes().collect();
    let mut i = bytes.len();
    loop {
        if i == 0 {
            bytes.insert(0, b'1');
            break;
        }
        i -= 1;
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            d => {
                bytes[i] = d + 1;
                break;
            }
        }
    }
    bytes.into_iter().map(char::from).collect()
}

// ---------------------------------------------------------------------------
// Per-key formatting rules
// ---------------------------------------------------------------------------

/// How a stat key is rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatFormat {
    /// Three decimals, leading zero dropped (`.287`).
    Average,
    /// Three decimals, leading zero kept (`0.850`).
    ThreeDecimals,
    /// Two decimals (`3.45`).
    TwoDecimals,
    /// One decimal plus a percent sign (`10.5%`).
    Percent,
    /// The value's own string form.
    Plain,
}

impl StatFormat {
    pub fn for_key(key: &str) -> Self {
        match key {
            keys::AVG | keys::OBP | keys::SLG | keys::ISO | keys::BABIP => StatFormat::Average,
            keys::OPS => StatFormat::ThreeDecimals,
            keys::ERA
            | keys::WHIP
            | keys::STRIKEOUTS_PER_9
            | keys::WALKS_PER_9
            | keys::HOME_RUNS_PER_9
            | keys::HITS_PER_9
            | keys::STRIKEOUT_WALK_RATIO => StatFormat::TwoDecimals,
            keys::WALK_RATE | keys::STRIKEOUT_RATE => StatFormat::Percent,
            _ => StatFormat::Plain,
        }
    }
}

/// Format a stat value for display according to its key.
///
/// Returns [`MISSING`] when the value is absent or, for numeric formats,
/// does not parse.
pub fn format_stat_value(value: Option<&StatValue>, key: &str) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };

    let numeric = |digits: usize| value.as_f64().map(|n| to_fixed(n, digits));

    let formatted = match StatFormat::for_key(key) {
        StatFormat::Average => numeric(3).map(|s| strip_leading_zero(&s)),
        StatFormat::ThreeDecimals => numeric(3),
        StatFormat::TwoDecimals => numeric(2),
        StatFormat::Percent => numeric(1).map(|s| format!("{s}%")),
        StatFormat::Plain => {
            if matches!(value, StatValue::Number(n) if !n.is_finite()) {
                return MISSING.to_string();
            }
            let s = value.to_string();
            (!s.trim().is_empty()).then_some(s)
        }
    };
    formatted.unwrap_or_else(|| MISSING.to_string())
}

/// Shorthand for formatting one field of a line.
pub fn format_line_stat(line: &StatLine, key: &str) -> String {
    format_stat_value(line.get(key), key)
}

fn strip_leading_zero(s: &str) -> String {
    match s.strip_prefix('0') {
        Some(rest) if rest.starts_with('.') => rest.to_string(),
        _ => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
