// Loosely-typed stat lines as delivered by the upstream statistics API.
//
// Every field may arrive as a number, a string (".287", "180.1", "-.--"),
// or not at all. All numeric reads funnel through `parse_numeric` so the
// rest of the crate never coerces values implicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// StatValue
// ---------------------------------------------------------------------------

/// A single stat field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
    Null,
}

impl StatValue {
    /// Parse this value as a finite number. See [`parse_numeric`].
    pub fn as_f64(&self) -> Option<f64> {
        parse_numeric(self)
    }
}

impl fmt::Display for StatValue {
    /// The value's direct string form: numbers print without a trailing
    /// `.0` when integral, text prints verbatim, null prints empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) => write!(f, "{n}"),
            StatValue::Text(s) => f.write_str(s),
            StatValue::Null => Ok(()),
        }
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        StatValue::Number(value)
    }
}

impl From<i64> for StatValue {
    fn from(value: i64) -> Self {
        StatValue::Number(value as f64)
    }
}

impl From<u32> for StatValue {
    fn from(value: u32) -> Self {
        StatValue::Number(f64::from(value))
    }
}

impl From<&str> for StatValue {
    fn from(value: &str) -> Self {
        StatValue::Text(value.to_string())
    }
}

impl From<String> for StatValue {
    fn from(value: String) -> Self {
        StatValue::Text(value)
    }
}

/// Parse a stat value as a finite `f64`.
///
/// Accepts numbers and numeric strings (surrounding whitespace allowed,
/// leading-dot forms like `".300"` included). Returns `None` for null,
/// empty strings, placeholders such as `".---"`, and NaN/infinite values.
pub fn parse_numeric(value: &StatValue) -> Option<f64> {
    let parsed = match value {
        StatValue::Number(n) => *n,
        StatValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        StatValue::Null => return None,
    };
    parsed.is_finite().then_some(parsed)
}

// ---------------------------------------------------------------------------
// StatLine
// ---------------------------------------------------------------------------

/// One subject's stats for one period and one stat group, keyed by the
/// upstream camelCase stat name (`atBats`, `inningsPitched`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatLine {
    fields: BTreeMap<String, StatValue>,
}

impl StatLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&StatValue> {
        self.fields.get(key)
    }

    /// Numeric field access; `None` when missing or unparseable.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(parse_numeric)
    }

    /// Numeric field access for additive terms: missing or unparseable is 0.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    /// Insert or overwrite a field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StatValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`StatLine::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StatValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for StatLine
where
    K: Into<String>,
    V: Into<StatValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut line = StatLine::new();
        for (k, v) in iter {
            line.set(k, v);
        }
        line
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_numeric_strings() {
        assert_eq!(parse_numeric(&StatValue::Number(150.0)), Some(150.0));
        assert_eq!(parse_numeric(&StatValue::from(".300")), Some(0.3));
        assert_eq!(parse_numeric(&StatValue::from(" 12 ")), Some(12.0));
        assert_eq!(parse_numeric(&StatValue::from("180.1")), Some(180.1));
    }

    #[test]
    fn rejects_placeholders_and_non_finite() {
        assert_eq!(parse_numeric(&StatValue::from(".---")), None);
        assert_eq!(parse_numeric(&StatValue::from("-.--")), None);
        assert_eq!(parse_numeric(&StatValue::from("")), None);
        assert_eq!(parse_numeric(&StatValue::from("NaN")), None);
        assert_eq!(parse_numeric(&StatValue::from("inf")), None);
        assert_eq!(parse_numeric(&StatValue::Number(f64::NAN)), None);
        assert_eq!(parse_numeric(&StatValue::Null), None);
    }

    #[test]
    fn number_or_zero_defaults_missing_fields() {
        let line = StatLine::new().with("hits", "abc");
        assert_eq!(line.number_or_zero("hits"), 0.0);
        assert_eq!(line.number_or_zero("doubles"), 0.0);
    }

    #[test]
    fn deserializes_mixed_json_values() {
        let line: StatLine =
            serde_json::from_str(r#"{"hits": 150, "avg": ".300", "note": null}"#).unwrap();
        assert_eq!(line.number("hits"), Some(150.0));
        assert_eq!(line.number("avg"), Some(0.3));
        assert_eq!(line.get("note"), Some(&StatValue::Null));
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn rejects_nested_objects_at_the_parsing_boundary() {
        let parsed: Result<StatLine, _> = serde_json::from_str(r#"{"hits": {"x": 1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn display_is_direct_string_form() {
        assert_eq!(StatValue::Number(150.0).to_string(), "150");
        assert_eq!(StatValue::Number(1.5).to_string(), "1.5");
        assert_eq!(StatValue::from(".287").to_string(), ".287");
    }
}
