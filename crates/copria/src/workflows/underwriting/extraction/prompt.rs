use serde_json::{Map, Value};

use super::super::schema::Schema;

/// Wording submissions commonly use for canonical fields.
const FIELD_ALIASES: &[(&str, &str)] = &[
    ("\"Address\" or \"Property Address\"", "Property Address"),
    ("\"Year Built\" or \"constructed in [year]\"", "Year Built"),
    ("\"Construction Type\" or \"built using [material]\"", "Construction Type"),
    ("\"Number of Stories\", \"single-story\", \"two-story\"", "Number of Stories"),
    ("\"flammable materials\", \"hazardous\"", "Hazardous Materials (Y/N)"),
    ("\"Sprinkler System\" or \"sprinklers\"", "Sprinkler System (Y/N)"),
    ("\"Fire Alarm\", \"fire alarms\", \"basic fire alarms\"", "Fire Alarm (Y/N)"),
    ("\"Total TIV\" or \"total insured value\"", "Total TIV"),
    ("\"Prior Claims\" or \"claims\"", "Prior Claims (Y/N)"),
    ("\"Total Loss Amount\" or \"loss amounting to\"", "Total Loss Amount"),
    ("\"Flood Zone\", \"Zone AE\", \"Zone X\"", "Flood Zone (e.g., Zone X, AE)"),
    (
        "\"Earthquake\" or \"seismic\"",
        "Earthquake Exposure (Low/Moderate/High or ShakeMap Zone)",
    ),
];

const INSTRUCTIONS: &[&str] = &[
    "Fire Alarm (Y/N) is \"Yes\" whenever the text mentions any fire alarm, including basic ones.",
    "Hazardous Materials (Y/N) is \"Yes\" when the text mentions flammable, hazardous or dangerous materials.",
    "For the flood zone, extract the zone designation (for example AE or X) when one is named.",
    "Sprinkler System (Y/N) is \"No\" when the text says there are no sprinklers.",
    "Map information to fields even when the wording differs from the field name.",
    "Answer Y/N fields with \"Yes\" or \"No\".",
    "Use an empty string for anything the text does not state.",
    "Reply with a single JSON object and nothing else.",
];

/// Prompt asking the model to map free submission text onto the schema's fields.
pub fn build_prompt(text: &str, schema: &Schema) -> String {
    let fields: Vec<&str> = schema.field_names().collect();
    let template: Map<String, Value> = fields
        .iter()
        .map(|field| (field.to_string(), Value::String(String::new())))
        .collect();
    let template = serde_json::to_string_pretty(&Value::Object(template)).unwrap_or_default();

    let mut prompt = String::from(
        "You are assisting a commercial property underwriter. Extract risk information \
         from the submission text below and map it onto the listed fields. The text may \
         use different terminology than the field names.\n\n",
    );

    prompt.push_str("### Fields\n");
    for field in &fields {
        prompt.push_str("- ");
        prompt.push_str(field);
        prompt.push('\n');
    }

    prompt.push_str("\n### Common wording\n");
    for (wording, field) in FIELD_ALIASES {
        if schema.contains(field) {
            prompt.push_str(&format!("- {wording} -> \"{field}\"\n"));
        }
    }

    prompt.push_str("\n### Rules\n");
    for (index, instruction) in INSTRUCTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {instruction}\n", index + 1));
    }

    prompt.push_str("\n### Output template\n");
    prompt.push_str(&template);
    prompt.push_str("\n\n### Submission text\n");
    prompt.push_str(text);
    prompt.push('\n');
    prompt
}
