use crate::infra::{build_service, InputOverrides};
use clap::Args;
use copria::config::AppConfig;
use copria::error::AppError;
use copria::telemetry;
use copria::workflows::underwriting::{
    fields, submissions_from_path, write_profiles_csv, write_profiles_json, BatchSummary,
    RiskProfile, SubmissionExtractor, UnderwritingService,
};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "output/risk_profiles.json";
const HIGH_RISK_FLOOD_ZONES: [&str; 3] = ["AE", "VE", "A"];

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// JSON array of submissions to assess
    #[arg(long)]
    pub(crate) submissions: PathBuf,
    /// Risk profile schema (defaults to APP_SCHEMA_PATH)
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
    /// Red flag rules (defaults to APP_RULES_PATH)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Where to write the assessed profiles as JSON
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub(crate) output: PathBuf,
    /// Also write the profiles as CSV
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Override the reference year used for roof age
    #[arg(long)]
    pub(crate) reference_year: Option<i32>,
}

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// Submission text to extract risk data from
    #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
    pub(crate) text: Option<String>,
    /// File containing the submission text
    #[arg(long)]
    pub(crate) text_file: Option<PathBuf>,
    /// Risk profile schema (defaults to APP_SCHEMA_PATH)
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
    /// Red flag rules (defaults to APP_RULES_PATH)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Where to write the assessed profile as JSON
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub(crate) output: PathBuf,
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        submissions,
        schema,
        rules,
        output,
        csv,
        reference_year,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_service(
        &config,
        InputOverrides {
            schema,
            rules,
            reference_year,
        },
    )?;

    let submissions = submissions_from_path(&submissions)?;
    let assessment = service.assess_batch(&submissions);

    println!("Multiple property risk assessment");
    for (index, profile) in assessment.profiles.iter().enumerate() {
        print!("{}", render_batch_entry(index, profile));
    }
    print!("{}", render_summary(&assessment.summary));

    write_profiles_json(&output, &assessment.profiles)?;
    println!("\nProfiles written to {}", output.display());

    if let Some(csv_path) = csv {
        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&csv_path)?);
        write_profiles_csv(writer, service.schema(), &assessment.profiles)
            .map_err(std::io::Error::from)?;
        println!("CSV written to {}", csv_path.display());
    }

    Ok(())
}

pub(crate) async fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let ExtractArgs {
        text,
        text_file,
        schema,
        rules,
        output,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_service(
        &config,
        InputOverrides {
            schema,
            rules,
            reference_year: None,
        },
    )?;

    let text = match (text, text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => String::new(),
    };

    assess_text_to(&service, &text, &output).await
}

/// Blank text is an error so the command exits non-zero.
async fn assess_text_to<E>(
    service: &UnderwritingService<E>,
    text: &str,
    output: &Path,
) -> Result<(), AppError>
where
    E: SubmissionExtractor + 'static,
{
    let assessment = service.assess_text(text).await?;
    if let Some(error) = &assessment.extraction_error {
        println!("Warning: {error}");
    }
    print!("{}", render_profile(&assessment.profile));
    write_profiles_json(output, std::slice::from_ref(&assessment.profile))?;
    println!("\nProfile written to {}", output.display());

    Ok(())
}

fn indicator(risky: bool) -> &'static str {
    if risky {
        "[!]"
    } else {
        "[ok]"
    }
}

fn non_empty(profile: &RiskProfile, field: &str) -> Option<String> {
    Some(profile.text(field)).filter(|value| !value.is_empty())
}

fn render_safety(out: &mut String, profile: &RiskProfile, prefix: &str) {
    let sprinkler = profile.text(fields::SPRINKLER_SYSTEM);
    let alarm = profile.text(fields::FIRE_ALARM);
    let hazardous = profile.text(fields::HAZARDOUS_MATERIALS);

    let _ = writeln!(
        out,
        "{prefix}Sprinkler System: {} {sprinkler}",
        indicator(sprinkler == "No")
    );
    let _ = writeln!(
        out,
        "{prefix}Fire Alarm: {} {alarm}",
        indicator(alarm == "No")
    );
    let _ = writeln!(
        out,
        "{prefix}Hazardous Materials: {} {hazardous}",
        indicator(hazardous == "Yes")
    );
}

/// Single-profile view used for text submissions.
pub(crate) fn render_profile(profile: &RiskProfile) -> String {
    let mut out = String::from("Risk profile summary\n\nProperty information\n");
    for (label, field) in [
        ("Property", "Property Name"),
        ("Address", "Property Address"),
        ("State", "State"),
        ("Year Built", fields::YEAR_BUILT),
        ("Construction", fields::CONSTRUCTION_TYPE),
        ("Total TIV", fields::TOTAL_TIV),
    ] {
        if let Some(value) = non_empty(profile, field) {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }

    out.push_str("\nSafety and protection\n");
    render_safety(&mut out, profile, "  ");
    if let Some(zone) = non_empty(profile, fields::FLOOD_ZONE) {
        let risky = HIGH_RISK_FLOOD_ZONES.contains(&zone.as_str());
        let _ = writeln!(out, "  Flood Zone: {} {zone}", indicator(risky));
    }
    if let Some(exposure) = non_empty(profile, fields::EARTHQUAKE_EXPOSURE) {
        let _ = writeln!(
            out,
            "  Earthquake Exposure: {} {exposure}",
            indicator(exposure == "High")
        );
    }

    if profile.has_red_flags() {
        out.push_str("\nRisk flags identified\n");
        for (index, flag) in profile.red_flags().iter().enumerate() {
            let _ = writeln!(out, "  {}. {flag}", index + 1);
        }
        let _ = writeln!(out, "Total risk flags: {}", profile.red_flags().len());
    } else {
        out.push_str("\nNo risk flags identified\n");
    }
    out
}

/// Compact per-property block for batch runs.
pub(crate) fn render_batch_entry(index: usize, profile: &RiskProfile) -> String {
    let name = non_empty(profile, "Property Name").unwrap_or_else(|| "Unknown".to_string());
    let mut out = format!("\nProperty {}: {name}\n", index + 1);

    for (label, field) in [
        ("Location", "State"),
        ("Construction", fields::CONSTRUCTION_TYPE),
        ("Total TIV", fields::TOTAL_TIV),
    ] {
        if let Some(value) = non_empty(profile, field) {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    render_safety(&mut out, profile, "  ");

    if profile.has_red_flags() {
        let _ = writeln!(out, "  Red flags ({}):", profile.red_flags().len());
        for flag in profile.red_flags() {
            let _ = writeln!(out, "    - {flag}");
        }
    } else {
        out.push_str("  No risk flags\n");
    }
    out
}

pub(crate) fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::from("\nOverall summary\n");
    let _ = writeln!(out, "  Total properties: {}", summary.properties_assessed);
    let _ = writeln!(
        out,
        "  Properties with flags: {}",
        summary.properties_with_flags
    );
    let _ = writeln!(out, "  Total red flags: {}", summary.total_flags);

    if !summary.flag_counts.is_empty() {
        out.push_str("\nRed flag breakdown\n");
        for entry in &summary.flag_counts {
            let _ = writeln!(out, "  {}: {}", entry.flag, entry.count);
        }
    }
    out
}
