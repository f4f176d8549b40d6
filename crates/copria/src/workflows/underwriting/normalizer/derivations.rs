use serde_json::Value;

use super::super::resolver::{direct, resolve};
use super::super::values::{as_integer, is_set, value_text};
use super::fields;

/// Read-only view of one submission while deriving missing fields.
pub(crate) struct DerivationContext<'a> {
    pub(crate) submission: &'a Value,
    pub(crate) reference_year: i32,
}

impl<'a> DerivationContext<'a> {
    /// Usable value for `key`: direct hit first, then the nested search.
    fn resolved(&self, key: &str) -> Option<&'a Value> {
        resolve(self.submission, key).filter(|value| is_set(Some(*value)))
    }

    fn supplied(&self, key: &str) -> Option<&'a Value> {
        direct(self.submission, key).filter(|value| is_set(Some(*value)))
    }

    fn resolved_text(&self, key: &str) -> String {
        self.resolved(key)
            .map(value_text)
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Fire-protection text combined with any COPE "Protection" note, lower-cased.
    fn protection_text(&self) -> String {
        let mut text = self.resolved_text("Fire Protection");
        if let Some(protection) = self.resolved("Protection") {
            text.push(' ');
            text.push_str(&value_text(protection).to_lowercase());
        }
        text
    }

    fn hazard_text(&self) -> String {
        self.resolved_text("Natural Hazard Exposure")
    }
}

/// Built-in heuristic filling one canonical field when nothing was supplied for it.
pub(crate) struct Derivation {
    pub(crate) target: &'static str,
    pub(crate) derive: fn(&DerivationContext<'_>) -> Value,
}

/// Applied independently; each entry only fires while its target is still unset.
pub(crate) const DERIVATIONS: &[Derivation] = &[
    Derivation {
        target: fields::ROOF_OVER_20_YEARS,
        derive: roof_over_20_years,
    },
    Derivation {
        target: fields::TOTAL_TIV,
        derive: total_insured_value,
    },
    Derivation {
        target: fields::SPRINKLER_SYSTEM,
        derive: sprinkler_system,
    },
    Derivation {
        target: fields::FIRE_ALARM,
        derive: fire_alarm,
    },
    Derivation {
        target: fields::FLOOD_ZONE,
        derive: flood_zone,
    },
    Derivation {
        target: fields::EARTHQUAKE_EXPOSURE,
        derive: earthquake_exposure,
    },
    Derivation {
        target: fields::WILDFIRE_RISK,
        derive: wildfire_risk,
    },
    Derivation {
        target: fields::PRIOR_CLAIMS,
        derive: prior_claims,
    },
    Derivation {
        target: fields::TOTAL_LOSS_AMOUNT,
        derive: total_loss_amount,
    },
    Derivation {
        target: fields::NUMBER_OF_STORIES,
        derive: number_of_stories,
    },
    Derivation {
        target: fields::CONSTRUCTION_TYPE,
        derive: construction_type,
    },
    Derivation {
        target: fields::OCCUPANCY_TYPE,
        derive: occupancy_type,
    },
    Derivation {
        target: fields::HAZARDOUS_MATERIALS,
        derive: hazardous_materials,
    },
];

fn yes_no(flag: bool) -> Value {
    Value::from(if flag { "Yes" } else { "No" })
}

/// Three-tier exposure read from free hazard text. Text without `peril` resolves to Low.
fn tiered_exposure(hazard: &str, peril: &str) -> Value {
    let tier = if hazard.contains(peril) && hazard.contains("high") {
        "High"
    } else if hazard.contains(peril) && hazard.contains("moderate") {
        "Moderate"
    } else {
        "Low"
    };
    Value::from(tier)
}

fn roof_over_20_years(ctx: &DerivationContext<'_>) -> Value {
    let year_built = direct(ctx.submission, fields::YEAR_BUILT)
        .and_then(as_integer)
        .unwrap_or(0);
    yes_no(year_built > 0 && i64::from(ctx.reference_year) - year_built > 20)
}

fn total_insured_value(ctx: &DerivationContext<'_>) -> Value {
    let total = ctx
        .supplied(fields::TOTAL_INSURED_VALUE_USD)
        .or_else(|| ctx.supplied(fields::TOTAL_TIV))
        .or_else(|| ctx.resolved(fields::TOTAL_INSURED_VALUE_USD));
    Value::from(total.map(value_text).unwrap_or_default())
}

// Plain substring match: "no sprinkler system" still reads as Yes.
fn sprinkler_system(ctx: &DerivationContext<'_>) -> Value {
    yes_no(ctx.protection_text().contains("sprinkler"))
}

fn fire_alarm(ctx: &DerivationContext<'_>) -> Value {
    yes_no(ctx.protection_text().contains("alarm"))
}

fn flood_zone(ctx: &DerivationContext<'_>) -> Value {
    let hazard = ctx.hazard_text();
    let zone = if hazard.contains("zone ae") {
        "AE"
    } else if hazard.contains("zone x") {
        "X"
    } else {
        "Unknown"
    };
    Value::from(zone)
}

fn earthquake_exposure(ctx: &DerivationContext<'_>) -> Value {
    tiered_exposure(&ctx.hazard_text(), "earthquake")
}

fn wildfire_risk(ctx: &DerivationContext<'_>) -> Value {
    tiered_exposure(&ctx.hazard_text(), "wildfire")
}

fn prior_claims(ctx: &DerivationContext<'_>) -> Value {
    own_value_or(ctx, fields::PRIOR_CLAIMS, "No")
}

fn total_loss_amount(ctx: &DerivationContext<'_>) -> Value {
    own_value_or(ctx, fields::TOTAL_LOSS_AMOUNT, "0")
}

fn number_of_stories(ctx: &DerivationContext<'_>) -> Value {
    own_value_or(ctx, fields::NUMBER_OF_STORIES, "1")
}

fn own_value_or(ctx: &DerivationContext<'_>, key: &str, fallback: &str) -> Value {
    direct(ctx.submission, key)
        .filter(|value| !value.is_null() && value.as_str() != Some(""))
        .cloned()
        .unwrap_or_else(|| Value::from(fallback))
}

fn construction_type(ctx: &DerivationContext<'_>) -> Value {
    ctx.supplied(fields::CONSTRUCTION_TYPE)
        .or_else(|| ctx.resolved("Construction"))
        .or_else(|| {
            ctx.supplied("COPE")
                .and_then(|cope| cope.get("Construction"))
                .filter(|value| is_set(Some(*value)))
        })
        .cloned()
        .unwrap_or_else(|| Value::from(""))
}

fn occupancy_type(ctx: &DerivationContext<'_>) -> Value {
    ctx.supplied(fields::OCCUPANCY_TYPE)
        .or_else(|| ctx.resolved("Occupancy"))
        .cloned()
        .unwrap_or_else(|| Value::from(""))
}

fn hazardous_materials(ctx: &DerivationContext<'_>) -> Value {
    let risk_factors = direct(ctx.submission, "Risk Factors")
        .map(value_text)
        .unwrap_or_default()
        .to_lowercase();
    yes_no(risk_factors.contains("hazardous") || risk_factors.contains("lithium"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn derive(target: &str, submission: Value) -> Value {
        let ctx = DerivationContext {
            submission: &submission,
            reference_year: 2025,
        };
        let derivation = DERIVATIONS
            .iter()
            .find(|derivation| derivation.target == target)
            .expect("derivation registered");
        (derivation.derive)(&ctx)
    }

    #[test]
    fn every_target_is_derived_once() {
        let mut targets: Vec<_> = DERIVATIONS.iter().map(|d| d.target).collect();
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), DERIVATIONS.len());
    }

    #[test]
    fn roof_age_uses_reference_year() {
        assert_eq!(derive(fields::ROOF_OVER_20_YEARS, json!({ "Year Built": 2004 })), "Yes");
        assert_eq!(derive(fields::ROOF_OVER_20_YEARS, json!({ "Year Built": "2005" })), "No");
        assert_eq!(derive(fields::ROOF_OVER_20_YEARS, json!({ "Year Built": "unknown" })), "No");
        assert_eq!(derive(fields::ROOF_OVER_20_YEARS, json!({ "Year Built": -40 })), "No");
    }

    #[test]
    fn roof_age_only_reads_top_level_year() {
        let submission = json!({ "Property": { "Year Built": 1960 } });
        assert_eq!(derive(fields::ROOF_OVER_20_YEARS, submission), "No");
    }

    #[test]
    fn total_insured_value_checks_alternates_then_nested() {
        assert_eq!(
            derive(fields::TOTAL_TIV, json!({ "Total Insured Value (USD)": 12500000 })),
            "12500000"
        );
        assert_eq!(
            derive(
                fields::TOTAL_TIV,
                json!({ "Values": { "Total Insured Value (USD)": "$4,000,000" } })
            ),
            "$4,000,000"
        );
        assert_eq!(derive(fields::TOTAL_TIV, json!({})), "");
    }

    #[test]
    fn protection_text_includes_cope_protection() {
        let submission = json!({
            "Fire Protection": "Central station monitored",
            "COPE": { "Protection": "Wet pipe sprinklers; smoke ALARM" }
        });
        assert_eq!(derive(fields::SPRINKLER_SYSTEM, submission.clone()), "Yes");
        assert_eq!(derive(fields::FIRE_ALARM, submission), "Yes");
    }

    #[test]
    fn negated_sprinkler_text_still_matches() {
        let submission = json!({ "Fire Protection": "no sprinkler system installed" });
        assert_eq!(derive(fields::SPRINKLER_SYSTEM, submission.clone()), "Yes");
        assert_eq!(derive(fields::FIRE_ALARM, submission), "No");
    }

    #[test]
    fn hazard_text_drives_flood_and_tiers() {
        let submission = json!({
            "Natural Hazard Exposure": "Zone AE flood plain; moderate earthquake risk; high wildfire"
        });
        assert_eq!(derive(fields::FLOOD_ZONE, submission.clone()), "AE");
        // "high" appears in the text, so the earthquake tier reads High as well.
        assert_eq!(derive(fields::EARTHQUAKE_EXPOSURE, submission.clone()), "High");
        assert_eq!(derive(fields::WILDFIRE_RISK, submission), "High");

        let submission = json!({ "Hazards": { "Natural Hazard Exposure": "Zone X, earthquake moderate" } });
        assert_eq!(derive(fields::FLOOD_ZONE, submission.clone()), "X");
        assert_eq!(derive(fields::EARTHQUAKE_EXPOSURE, submission.clone()), "Moderate");
        assert_eq!(derive(fields::WILDFIRE_RISK, submission), "Low");
    }

    #[test]
    fn high_without_peril_is_low() {
        let submission = json!({ "Natural Hazard Exposure": "high wind exposure" });
        assert_eq!(derive(fields::EARTHQUAKE_EXPOSURE, submission.clone()), "Low");
        assert_eq!(derive(fields::FLOOD_ZONE, submission), "Unknown");
    }

    #[test]
    fn loss_history_defaults() {
        assert_eq!(derive(fields::PRIOR_CLAIMS, json!({})), "No");
        assert_eq!(derive(fields::TOTAL_LOSS_AMOUNT, json!({})), "0");
        assert_eq!(derive(fields::NUMBER_OF_STORIES, json!({ "Number of Stories": "" })), "1");
        assert_eq!(derive(fields::TOTAL_LOSS_AMOUNT, json!({ "Total Loss Amount": 0 })), 0);
    }

    #[test]
    fn construction_falls_back_to_cope() {
        assert_eq!(
            derive(fields::CONSTRUCTION_TYPE, json!({ "COPE": { "Construction": "Joisted masonry" } })),
            "Joisted masonry"
        );
        assert_eq!(derive(fields::CONSTRUCTION_TYPE, json!({ "COPE": {} })), "");
        assert_eq!(
            derive(fields::OCCUPANCY_TYPE, json!({ "Location": { "Occupancy": "Warehouse" } })),
            "Warehouse"
        );
    }

    #[test]
    fn hazardous_materials_reads_risk_factors() {
        assert_eq!(
            derive(fields::HAZARDOUS_MATERIALS, json!({ "Risk Factors": "Lithium battery storage" })),
            "Yes"
        );
        assert_eq!(
            derive(fields::HAZARDOUS_MATERIALS, json!({ "Risk Factors": "Office use only" })),
            "No"
        );
        assert_eq!(
            derive(fields::HAZARDOUS_MATERIALS, json!({ "Details": { "Risk Factors": "hazardous" } })),
            "No"
        );
    }
}
