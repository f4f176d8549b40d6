use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::UnderwritingInputError;

/// Named group of canonical fields, e.g. "COPE" or "Loss History".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSection {
    pub name: String,
    pub fields: Vec<String>,
}

/// Canonical vocabulary of a risk profile: section name to ordered field names.
///
/// Section and field order follow the source document. Field names are expected to be
/// unique across sections; a duplicate keeps a single slot in the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    sections: Vec<SchemaSection>,
}

impl Schema {
    pub fn new(sections: Vec<SchemaSection>) -> Self {
        Self { sections }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UnderwritingInputError> {
        serde_json::from_reader(reader).map_err(|source| UnderwritingInputError::Json {
            input: "schema",
            source,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, UnderwritingInputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| UnderwritingInputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn sections(&self) -> &[SchemaSection] {
        &self.sections
    }

    /// Every field name in section order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter().map(String::as_str))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.field_names().any(|name| name == field)
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|section| section.fields.len()).sum()
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, &section.fields)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SchemaVisitor)
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = Schema;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping section names to arrays of field names")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut sections = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, fields)) = access.next_entry::<String, Vec<String>>()? {
            if sections
                .iter()
                .any(|section: &SchemaSection| section.name == name)
            {
                return Err(de::Error::custom(format!("duplicate schema section '{name}'")));
            }
            sections.push(SchemaSection { name, fields });
        }
        Ok(Schema { sections })
    }
}
