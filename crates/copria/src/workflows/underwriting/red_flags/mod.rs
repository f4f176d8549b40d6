mod condition;

pub use condition::{Clause, Condition};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::profile::RiskProfile;
use super::UnderwritingInputError;

/// Message used when a rule carries neither `description` nor `message`.
pub const DEFAULT_FLAG_MESSAGE: &str = "Red flag detected";

/// Declarative rule as written in the rules document.
///
/// Every key is optional at this level so one malformed entry cannot fail the whole load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleDefinition {
    pub fn new(field: &str, condition: &str, description: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            condition: Some(condition.to_string()),
            description: Some(description.to_string()),
            message: None,
        }
    }

    /// Flag text: `description`, else `message`, else [`DEFAULT_FLAG_MESSAGE`].
    pub fn flag_message(&self) -> &str {
        self.description
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or(DEFAULT_FLAG_MESSAGE)
    }
}

/// Failure of a single rule. Contained per rule and never fatal to a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("rule is not a valid rule object: {0}")]
    Malformed(String),
    #[error("rule has no `field`")]
    MissingField,
    #[error("rule has no `condition`")]
    MissingCondition,
    #[error("threshold in '{condition}' is not a number")]
    NonNumericThreshold { condition: String },
    #[error("value '{value}' of '{field}' is not a number")]
    NonNumericValue { field: String, value: String },
}

/// Rule with its condition parsed once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub field: String,
    pub condition: Condition,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum RuleEntry {
    Ready(CompiledRule),
    Invalid { field: Option<String>, error: RuleError },
}

/// Ordered rule list. Order decides flag order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    pub fn compile<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = RuleDefinition>,
    {
        let entries = definitions.into_iter().map(compile_definition).collect();
        Self { entries }
    }

    /// Compiles raw JSON entries; entries that are not rule objects are kept as invalid.
    pub fn from_values(values: Vec<Value>) -> Self {
        let entries = values
            .into_iter()
            .map(|value| match serde_json::from_value::<RuleDefinition>(value) {
                Ok(definition) => compile_definition(definition),
                Err(err) => RuleEntry::Invalid {
                    field: None,
                    error: RuleError::Malformed(err.to_string()),
                },
            })
            .collect();
        Self { entries }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UnderwritingInputError> {
        let values: Vec<Value> =
            serde_json::from_reader(reader).map_err(|source| UnderwritingInputError::Json {
                input: "rules",
                source,
            })?;
        Ok(Self::from_values(values))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, UnderwritingInputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| UnderwritingInputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules that compiled; invalid entries are skipped.
    pub fn compiled(&self) -> impl Iterator<Item = &CompiledRule> {
        self.entries.iter().filter_map(|entry| match entry {
            RuleEntry::Ready(rule) => Some(rule),
            RuleEntry::Invalid { .. } => None,
        })
    }

    /// Messages of every rule whose condition holds, in rule order.
    ///
    /// Rules that fail to compile or evaluate are logged and contribute nothing.
    pub fn flags_for(&self, profile: &RiskProfile) -> Vec<String> {
        let mut flags = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            match entry {
                RuleEntry::Ready(rule) => match rule.condition.is_met(profile, &rule.field) {
                    Ok(true) => flags.push(rule.message.clone()),
                    Ok(false) => {}
                    Err(error) => {
                        warn!(rule = index, field = %rule.field, %error, "red flag rule skipped");
                    }
                },
                RuleEntry::Invalid { field, error } => {
                    warn!(
                        rule = index,
                        field = field.as_deref().unwrap_or("<missing>"),
                        %error,
                        "red flag rule skipped"
                    );
                }
            }
        }
        flags
    }
}

fn compile_definition(definition: RuleDefinition) -> RuleEntry {
    let message = definition.flag_message().to_string();
    let RuleDefinition {
        field, condition, ..
    } = definition;

    let Some(field) = field else {
        return RuleEntry::Invalid {
            field: None,
            error: RuleError::MissingField,
        };
    };
    let Some(condition) = condition else {
        return RuleEntry::Invalid {
            field: Some(field),
            error: RuleError::MissingCondition,
        };
    };

    match Condition::parse(&condition) {
        Ok(condition) => RuleEntry::Ready(CompiledRule {
            field,
            condition,
            message,
        }),
        Err(error) => RuleEntry::Invalid {
            field: Some(field),
            error,
        },
    }
}

/// Returns `profile` with its red-flag list rebuilt from `rules`.
///
/// The list is replaced, not appended to, so evaluating the same profile twice yields
/// the same flags.
pub fn evaluate(mut profile: RiskProfile, rules: &RuleSet) -> RiskProfile {
    let flags = rules.flags_for(&profile);
    profile.replace_red_flags(flags);
    profile
}
