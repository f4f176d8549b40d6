use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::Schema;
use super::values::value_text;

/// Key under which triggered red-flag messages are serialized.
pub const RED_FLAGS_FIELD: &str = "Red Flags";

/// Flat, schema-complete record describing one property submission.
///
/// Holds exactly the schema's field names, in schema order, plus the list of red-flag
/// messages produced by the evaluator. Serializes as a single JSON object with the
/// flags under [`RED_FLAGS_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(rename = "Red Flags", default)]
    red_flags: Vec<String>,
}

impl RiskProfile {
    /// Profile with every schema field present and set to an empty string.
    pub fn blank(schema: &Schema) -> Self {
        let fields = schema
            .field_names()
            .map(|name| (name.to_string(), Value::String(String::new())))
            .collect();
        Self {
            fields,
            red_flags: Vec::new(),
        }
    }

    /// Builds a profile from already-canonical values, mostly useful for rule checks.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            red_flags: Vec::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field value rendered as text; missing fields render empty.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(value_text).unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn red_flags(&self) -> &[String] {
        &self.red_flags
    }

    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }

    pub(crate) fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Overwrites an existing field; unknown names are ignored so the field set never grows.
    pub(crate) fn assign(&mut self, field: &str, value: Value) -> bool {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn replace_red_flags(&mut self, red_flags: Vec<String>) {
        self.red_flags = red_flags;
    }
}
