use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::extraction::{failure_message, SubmissionExtractor};
use super::normalizer::{NormalizerConfig, ProfileNormalizer};
use super::profile::RiskProfile;
use super::red_flags::{evaluate, RuleSet};
use super::schema::Schema;
use super::summary::BatchSummary;
use super::UnderwritingInputError;
use crate::config::UnderwritingConfig;

/// Profiles for one batch alongside their aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAssessment {
    pub profiles: Vec<RiskProfile>,
    pub summary: BatchSummary,
    pub assessed_at: DateTime<Utc>,
}

/// Outcome of assessing free submission text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAssessment {
    pub profile: RiskProfile,
    /// Set when extraction failed and the profile holds only defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

/// Service composing schema, normalizer, rule set, and the text extractor.
///
/// Schema and rules are loaded once and shared read-only across requests.
pub struct UnderwritingService<E> {
    schema: Arc<Schema>,
    rules: Arc<RuleSet>,
    normalizer: ProfileNormalizer,
    extractor: Arc<E>,
}

impl<E> UnderwritingService<E>
where
    E: SubmissionExtractor + 'static,
{
    pub fn new(
        schema: Arc<Schema>,
        rules: Arc<RuleSet>,
        normalizer: ProfileNormalizer,
        extractor: Arc<E>,
    ) -> Self {
        Self {
            schema,
            rules,
            normalizer,
            extractor,
        }
    }

    /// Loads schema and rules from the configured paths.
    pub fn from_config(
        config: &UnderwritingConfig,
        extractor: Arc<E>,
    ) -> Result<Self, UnderwritingInputError> {
        let schema = Schema::from_path(&config.schema_path)?;
        let rules = RuleSet::from_path(&config.rules_path)?;
        info!(
            fields = schema.field_count(),
            rules = rules.len(),
            reference_year = config.reference_year,
            "underwriting inputs loaded"
        );

        Ok(Self::new(
            Arc::new(schema),
            Arc::new(rules),
            ProfileNormalizer::new(NormalizerConfig {
                reference_year: config.reference_year,
            }),
            extractor,
        ))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Normalize one submission and annotate it with red flags.
    pub fn assess(&self, submission: &Value) -> RiskProfile {
        let profile = self.normalizer.normalize(submission, &self.schema);
        evaluate(profile, &self.rules)
    }

    /// Assess every submission independently, preserving input order.
    pub fn assess_batch(&self, submissions: &[Value]) -> BatchAssessment {
        let profiles: Vec<RiskProfile> = submissions
            .iter()
            .map(|submission| self.assess(submission))
            .collect();
        let summary = BatchSummary::from_profiles(&profiles);

        info!(
            profiles = summary.properties_assessed,
            flagged = summary.properties_with_flags,
            flags = summary.total_flags,
            "batch assessed"
        );

        BatchAssessment {
            profiles,
            summary,
            assessed_at: Utc::now(),
        }
    }

    /// Extract fields from free text, then run the regular pipeline on the result.
    ///
    /// A failed extraction still produces a profile; the failure is reported alongside it.
    pub async fn assess_text(
        &self,
        text: &str,
    ) -> Result<TextAssessment, UnderwritingServiceError> {
        if text.trim().is_empty() {
            return Err(UnderwritingServiceError::EmptyText);
        }

        let extracted = self.extractor.extract(text, &self.schema).await;
        let extraction_error = failure_message(&extracted).map(str::to_string);
        let profile = self.assess(&extracted);

        Ok(TextAssessment {
            profile,
            extraction_error,
        })
    }
}

/// Error raised by the underwriting service.
#[derive(Debug, thiserror::Error)]
pub enum UnderwritingServiceError {
    #[error("submission text is empty")]
    EmptyText,
}
