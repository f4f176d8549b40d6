use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::super::normalizer::fields;
use super::super::profile::RiskProfile;
use super::super::values::{as_number, value_text};
use super::RuleError;

const AND: &str = " and ";

/// Parsed form of a rule's condition string.
///
/// Shapes are recognised by substring presence, in this order, and a condition is never
/// reinterpreted once an earlier shape matched.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field > threshold`
    GreaterThan { threshold: f64 },
    /// `field < threshold`
    LessThan { threshold: f64 },
    /// `field == "value"`, compared case-insensitively after trimming.
    Equals { expected: String },
    /// `field contains 'a' or 'b'`; literals are stored lower-cased.
    Contains { needles: Vec<String> },
    /// `clause and clause ...`; clauses name their own fields.
    Compound { clauses: Vec<Clause> },
    /// Anything else. Never fires.
    Unrecognized,
}

/// One sub-clause of a compound condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Equals { field: String, expected: String },
    /// Fails when the value is `<= threshold`.
    GreaterThan { field: String, threshold: f64 },
    /// A `>` clause whose threshold is not a number. Always fails.
    MalformedThreshold { field: String, raw: String },
    /// Neither `==` nor `>`. Ignored, so it never blocks the rule.
    Unsupported(String),
}

impl Condition {
    pub fn parse(condition: &str) -> Result<Self, RuleError> {
        let lowered = condition.to_ascii_lowercase();

        if condition.contains('>') && !condition.contains(AND) {
            let threshold = parse_threshold(last_segment(condition, '>'), condition)?;
            return Ok(Self::GreaterThan { threshold });
        }

        if condition.contains('<') && !condition.contains(AND) {
            let threshold = parse_threshold(last_segment(condition, '<'), condition)?;
            return Ok(Self::LessThan { threshold });
        }

        if condition.contains("==") && !condition.contains(AND) {
            let parts: Vec<&str> = condition.split("==").collect();
            return Ok(match parts.as_slice() {
                [_, expected] => Self::Equals {
                    expected: unquote(expected),
                },
                _ => Self::Unrecognized,
            });
        }

        if let Some(position) = lowered.rfind("contains") {
            let tail = &lowered[position + "contains".len()..];
            let needles = quoted_literals()
                .into_iter()
                .flat_map(|pattern| pattern.captures_iter(tail))
                .map(|captures| captures[1].to_lowercase())
                .collect();
            return Ok(Self::Contains { needles });
        }

        if lowered.contains(AND) {
            let clauses = split_ignoring_case(condition, &lowered, AND)
                .into_iter()
                .map(Clause::parse)
                .collect();
            return Ok(Self::Compound { clauses });
        }

        Ok(Self::Unrecognized)
    }

    /// Evaluates against `profile`; `field` is the rule's target field.
    pub fn is_met(&self, profile: &RiskProfile, field: &str) -> Result<bool, RuleError> {
        match self {
            Self::GreaterThan { threshold } => Ok(numeric_value(profile, field)? > *threshold),
            Self::LessThan { threshold } => Ok(numeric_value(profile, field)? < *threshold),
            Self::Equals { expected } => Ok(text_equals(lookup(profile, field), expected)),
            Self::Contains { needles } => {
                let value = lookup(profile, field)
                    .map(value_text)
                    .unwrap_or_default()
                    .to_lowercase();
                Ok(needles.iter().any(|needle| value.contains(needle.as_str())))
            }
            Self::Compound { clauses } => Ok(clauses.iter().all(|clause| clause.is_met(profile))),
            Self::Unrecognized => Ok(false),
        }
    }
}

impl Clause {
    fn parse(part: &str) -> Self {
        let part = part.trim();

        if part.contains("==") {
            let field = first_segment(part, "==");
            let expected = part.rsplit("==").next().unwrap_or_default();
            return Self::Equals {
                field,
                expected: unquote(expected),
            };
        }

        if part.contains('>') {
            let field = first_segment(part, ">");
            let raw = last_segment(part, '>').trim();
            return match raw.parse::<f64>() {
                Ok(threshold) => Self::GreaterThan { field, threshold },
                Err(_) => Self::MalformedThreshold {
                    field,
                    raw: raw.to_string(),
                },
            };
        }

        Self::Unsupported(part.to_string())
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    fn is_met(&self, profile: &RiskProfile) -> bool {
        match self {
            Self::Equals { field, expected } => text_equals(lookup(profile, field), expected),
            Self::GreaterThan { field, threshold } => match numeric_value(profile, field) {
                // `<=` fails the clause, so NaN passes here but not in the simple `>` shape.
                Ok(value) => !(value <= *threshold),
                Err(_) => false,
            },
            Self::MalformedThreshold { .. } => false,
            Self::Unsupported(part) => {
                debug!(clause = %part, "ignoring unsupported compound clause");
                true
            }
        }
    }
}

fn last_segment(text: &str, separator: char) -> &str {
    text.rsplit(separator).next().unwrap_or_default()
}

fn first_segment(text: &str, separator: &str) -> String {
    text.split(separator).next().unwrap_or_default().trim().to_string()
}

fn parse_threshold(raw: &str, condition: &str) -> Result<f64, RuleError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RuleError::NonNumericThreshold {
            condition: condition.to_string(),
        })
}

/// Trims whitespace, then any surrounding double and single quotes.
fn unquote(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}

/// Splits `original` wherever `needle` occurs in its ASCII-lowercased copy.
fn split_ignoring_case<'a>(original: &'a str, lowered: &str, needle: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, _) in lowered.match_indices(needle) {
        parts.push(&original[start..index]);
        start = index + needle.len();
    }
    parts.push(&original[start..]);
    parts
}

fn text_equals(value: Option<&Value>, expected: &str) -> bool {
    let actual = value.map(value_text).unwrap_or_default();
    actual.trim().to_lowercase() == expected.to_lowercase()
}

/// Exact field lookup, falling back to a case-insensitive match on the field name.
///
/// Every condition shape reads its field through here.
fn lookup<'p>(profile: &'p RiskProfile, field: &str) -> Option<&'p Value> {
    profile.get(field).or_else(|| {
        profile
            .fields()
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}

/// Numeric reading of a profile field. Missing fields read as zero.
fn numeric_value(profile: &RiskProfile, field: &str) -> Result<f64, RuleError> {
    let Some(value) = lookup(profile, field) else {
        return Ok(0.0);
    };

    if field.eq_ignore_ascii_case(fields::NUMBER_OF_STORIES) {
        if let Value::String(text) = value {
            return Ok(stories_from_text(text));
        }
    }

    as_number(value).ok_or_else(|| RuleError::NonNumericValue {
        field: field.to_string(),
        value: value_text(value),
    })
}

/// Story count read from free text.
///
/// The first digit run wins ("3 floors" reads 3), then "single" reads 1, then the first
/// spelled-out number ("Two-story" reads 2). Anything else reads 0.
pub(crate) fn stories_from_text(text: &str) -> f64 {
    let digits = digit_run().and_then(|pattern| pattern.find(text));
    if let Some(count) = digits.and_then(|digits| digits.as_str().parse::<f64>().ok()) {
        return count;
    }

    let lowered = text.to_lowercase();
    if lowered.contains("single") {
        return 1.0;
    }

    lowered
        .split(|c: char| !c.is_alphabetic())
        .find_map(|word| NUMBER_WORDS.iter().position(|candidate| *candidate == word))
        .map_or(0.0, |index| (index + 1) as f64)
}

const NUMBER_WORDS: [&str; 12] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve",
];

fn digit_run() -> Option<&'static Regex> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

fn quoted_literals() -> Option<&'static Regex> {
    static QUOTED: OnceLock<Option<Regex>> = OnceLock::new();
    QUOTED.get_or_init(|| Regex::new(r"'([^']*)'").ok()).as_ref()
}
