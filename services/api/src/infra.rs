use copria::config::{AppConfig, UnderwritingConfig};
use copria::error::AppError;
use copria::workflows::underwriting::{OpenAiExtractor, UnderwritingService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Command-line replacements for the configured underwriting inputs.
#[derive(Debug, Default, Clone)]
pub(crate) struct InputOverrides {
    pub(crate) schema: Option<PathBuf>,
    pub(crate) rules: Option<PathBuf>,
    pub(crate) reference_year: Option<i32>,
}

impl InputOverrides {
    pub(crate) fn apply(self, config: &UnderwritingConfig) -> UnderwritingConfig {
        UnderwritingConfig {
            reference_year: self.reference_year.unwrap_or(config.reference_year),
            schema_path: self.schema.unwrap_or_else(|| config.schema_path.clone()),
            rules_path: self.rules.unwrap_or_else(|| config.rules_path.clone()),
        }
    }
}

/// Loads schema and rules and wires the extraction client from configuration.
pub(crate) fn build_service(
    config: &AppConfig,
    overrides: InputOverrides,
) -> Result<UnderwritingService<OpenAiExtractor>, AppError> {
    let extractor = OpenAiExtractor::new(config.extraction.clone())?;
    if config.extraction.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; text extraction will return error payloads");
    }

    let underwriting = overrides.apply(&config.underwriting);
    let service = UnderwritingService::from_config(&underwriting, Arc::new(extractor))?;
    Ok(service)
}
