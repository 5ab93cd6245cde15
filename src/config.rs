//! Runtime configuration threaded through the screens and the checkout
//! pipeline.

use std::path::PathBuf;
use std::time::Duration;

/// What a non-fatal "already validated" answer from the storefront means for
/// the validation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidatedPolicy {
    /// The order was validated by an earlier attempt; continue checking out.
    #[default]
    TreatAsSuccess,
    /// Surface it as a failure and stop.
    TreatAsFailure,
}

/// Timing knobs for the checkout pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How long before the sale opens the pipeline wakes up and starts
    /// firing requests.
    pub lead_time: Duration,
    /// Delay between launching consecutive pipeline stages.
    pub stagger: Duration,
    pub validated_policy: ValidatedPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lead_time: Duration::ZERO,
            stagger: Duration::from_millis(100),
            validated_policy: ValidatedPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where saved sessions live.
    pub state_path: PathBuf,
    pub base_url: String,
    pub log_file: PathBuf,
    pub pipeline: PipelineConfig,
    /// Currency label for rendered prices.
    pub currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("flashcart.json"),
            base_url: storefront_api::DEFAULT_BASE_URL.to_string(),
            log_file: PathBuf::from("flashcart.log"),
            pipeline: PipelineConfig::default(),
            currency: "Rp".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.stagger, Duration::from_millis(100));
        assert_eq!(config.pipeline.lead_time, Duration::ZERO);
        assert_eq!(
            config.pipeline.validated_policy,
            ValidatedPolicy::TreatAsSuccess
        );
    }
}
