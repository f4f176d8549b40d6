//! Commercial property submission intake: schema-driven normalization into risk profiles
//! followed by declarative red-flag evaluation.
//!
//! Submissions arrive as arbitrary JSON trees. The normalizer locates each schema field
//! wherever it sits in the tree, derives the safety and exposure indicators, and the rule
//! set then annotates the profile with underwriter-facing warnings.

pub mod export;
pub mod extraction;
pub mod normalizer;
pub mod profile;
pub mod red_flags;
pub mod resolver;
pub mod router;
pub mod schema;
pub mod service;
pub mod summary;
pub(crate) mod values;

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

pub use export::{write_profiles_csv, write_profiles_json};
pub use extraction::{
    build_prompt, parse_completion, ExtractionError, OpenAiExtractor, SubmissionExtractor,
};
pub use normalizer::{fields, normalize, NormalizerConfig, ProfileNormalizer};
pub use profile::{RiskProfile, RED_FLAGS_FIELD};
pub use red_flags::{
    evaluate, Clause, CompiledRule, Condition, RuleDefinition, RuleError, RuleSet,
    DEFAULT_FLAG_MESSAGE,
};
pub use resolver::resolve;
pub use router::underwriting_router;
pub use schema::{Schema, SchemaSection};
pub use service::{BatchAssessment, TextAssessment, UnderwritingService, UnderwritingServiceError};
pub use summary::{BatchSummary, FlagCount};

/// Failure to load or write one of the workflow's input documents.
#[derive(Debug, thiserror::Error)]
pub enum UnderwritingInputError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {input} JSON: {source}")]
    Json {
        input: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{input} must be {expected}")]
    Shape {
        input: &'static str,
        expected: &'static str,
    },
}

/// Reads a submissions document: a JSON array of submission objects.
pub fn submissions_from_reader<R: Read>(reader: R) -> Result<Vec<Value>, UnderwritingInputError> {
    let document: Value =
        serde_json::from_reader(reader).map_err(|source| UnderwritingInputError::Json {
            input: "submissions",
            source,
        })?;

    match document {
        Value::Array(submissions) => Ok(submissions),
        _ => Err(UnderwritingInputError::Shape {
            input: "submissions",
            expected: "a JSON array",
        }),
    }
}

pub fn submissions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<Value>, UnderwritingInputError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| UnderwritingInputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    submissions_from_reader(BufReader::new(file))
}
