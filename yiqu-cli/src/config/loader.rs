use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::types::{
    AssessmentSection, AssistantSection, RawAssessmentSection, RawAssistantSection,
    RawSparkSection, RawYiquConfig, SparkSection, YiquConfig,
};

/// Overrides `spark.url`.
pub const SPARK_URL_ENV: &str = "SPARK_URL";
/// Overrides `spark.domain`.
pub const SPARK_DOMAIN_ENV: &str = "SPARK_DOMAIN";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project + environment)
    pub fn load() -> Result<YiquConfig> {
        let mut raw = RawYiquConfig::default();

        // Layer 1: User config
        let user_path = Self::user_config_path();
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: Environment
        raw = Self::merge_raw(raw, Self::env_overrides());

        Ok(Self::finalize(raw))
    }

    /// Get user config path (~/.config/yiqu/config.toml or $XDG_CONFIG_HOME)
    pub fn user_config_path() -> PathBuf {
        yiqu_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with YIQU_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("YIQU_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".yiqu/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawYiquConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(raw)
    }

    fn env_overrides() -> RawYiquConfig {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        RawYiquConfig {
            spark: RawSparkSection {
                url: var(SPARK_URL_ENV),
                domain: var(SPARK_DOMAIN_ENV),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawYiquConfig, overlay: RawYiquConfig) -> RawYiquConfig {
        RawYiquConfig {
            spark: RawSparkSection {
                url: overlay.spark.url.or(base.spark.url),
                domain: overlay.spark.domain.or(base.spark.domain),
                temperature: overlay.spark.temperature.or(base.spark.temperature),
                max_tokens: overlay.spark.max_tokens.or(base.spark.max_tokens),
                uid: overlay.spark.uid.or(base.spark.uid),
                auditing: overlay.spark.auditing.or(base.spark.auditing),
                timeout_secs: overlay.spark.timeout_secs.or(base.spark.timeout_secs),
            },
            assistant: RawAssistantSection {
                system_prompt: overlay
                    .assistant
                    .system_prompt
                    .or(base.assistant.system_prompt),
                context_window: overlay
                    .assistant
                    .context_window
                    .or(base.assistant.context_window),
            },
            assessment: RawAssessmentSection {
                text_matching: overlay
                    .assessment
                    .text_matching
                    .or(base.assessment.text_matching),
                save_reports: overlay
                    .assessment
                    .save_reports
                    .or(base.assessment.save_reports),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawYiquConfig) -> YiquConfig {
        let spark = SparkSection::default();
        let assistant = AssistantSection::default();
        let assessment = AssessmentSection::default();

        YiquConfig {
            spark: SparkSection {
                url: raw.spark.url.unwrap_or(spark.url),
                domain: raw.spark.domain.unwrap_or(spark.domain),
                temperature: raw.spark.temperature.unwrap_or(spark.temperature),
                max_tokens: raw.spark.max_tokens.unwrap_or(spark.max_tokens),
                uid: raw.spark.uid.unwrap_or(spark.uid),
                auditing: raw.spark.auditing.unwrap_or(spark.auditing),
                timeout_secs: raw.spark.timeout_secs.unwrap_or(spark.timeout_secs),
            },
            assistant: AssistantSection {
                system_prompt: raw
                    .assistant
                    .system_prompt
                    .unwrap_or(assistant.system_prompt),
                context_window: raw.assistant.context_window.filter(|&n| n > 0),
            },
            assessment: AssessmentSection {
                text_matching: raw
                    .assessment
                    .text_matching
                    .unwrap_or(assessment.text_matching),
                save_reports: raw
                    .assessment
                    .save_reports
                    .unwrap_or(assessment.save_reports),
            },
        }
    }

    /// Save config to a specific path
    ///
    /// Creates parent directories if they don't exist.
    #[cfg(test)]
    pub fn save_to_path(config: &YiquConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(config)?;
        std::fs::write(path, toml)?;

        Ok(())
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<YiquConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(YiquConfig::default())
        }
    }
}
