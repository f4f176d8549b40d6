mod derivations;

use serde_json::Value;
use tracing::debug;

use super::profile::RiskProfile;
use super::resolver::resolve;
use super::schema::Schema;
use super::values::is_set;
use crate::config::DEFAULT_REFERENCE_YEAR;
use derivations::{DerivationContext, DERIVATIONS};

/// Canonical field names the built-in derivations read or fill.
pub mod fields {
    pub const YEAR_BUILT: &str = "Year Built";
    pub const ROOF_OVER_20_YEARS: &str = "Roof > 20 yrs";
    pub const TOTAL_TIV: &str = "Total TIV";
    pub const TOTAL_INSURED_VALUE_USD: &str = "Total Insured Value (USD)";
    pub const SPRINKLER_SYSTEM: &str = "Sprinkler System (Y/N)";
    pub const FIRE_ALARM: &str = "Fire Alarm (Y/N)";
    pub const FLOOD_ZONE: &str = "Flood Zone (e.g., Zone X, AE)";
    pub const EARTHQUAKE_EXPOSURE: &str =
        "Earthquake Exposure (Low/Moderate/High or ShakeMap Zone)";
    pub const WILDFIRE_RISK: &str = "Wildfire Risk (Low/Moderate/High or ISO Class)";
    pub const PRIOR_CLAIMS: &str = "Prior Claims (Y/N)";
    pub const TOTAL_LOSS_AMOUNT: &str = "Total Loss Amount";
    pub const NUMBER_OF_STORIES: &str = "Number of Stories";
    pub const CONSTRUCTION_TYPE: &str = "Construction Type";
    pub const OCCUPANCY_TYPE: &str = "Occupancy Type";
    pub const HAZARDOUS_MATERIALS: &str = "Hazardous Materials (Y/N)";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// "Current year" for the roof-age rule.
    pub reference_year: i32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            reference_year: DEFAULT_REFERENCE_YEAR,
        }
    }
}

/// Builds canonical profiles from raw submissions.
///
/// Supplied values always win: a field found anywhere in the submission is copied as-is,
/// and the derivation table only fills fields that are still unset afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileNormalizer {
    config: NormalizerConfig,
}

impl ProfileNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    pub fn normalize(&self, submission: &Value, schema: &Schema) -> RiskProfile {
        let mut profile = RiskProfile::blank(schema);

        for field in schema.field_names() {
            if let Some(value) = resolve(submission, field) {
                if !value.is_null() && value.as_str() != Some("") {
                    profile.assign(field, value.clone());
                }
            }
        }

        let ctx = DerivationContext {
            submission,
            reference_year: self.config.reference_year,
        };
        for derivation in DERIVATIONS {
            if !profile.contains(derivation.target) || is_set(profile.get(derivation.target)) {
                continue;
            }
            let value = (derivation.derive)(&ctx);
            debug!(field = derivation.target, %value, "derived profile field");
            profile.assign(derivation.target, value);
        }

        profile
    }
}

/// Normalizes with the default reference year.
pub fn normalize(submission: &Value, schema: &Schema) -> RiskProfile {
    ProfileNormalizer::default().normalize(submission, schema)
}
