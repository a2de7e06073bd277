use std::time::Duration;

use serde::{Deserialize, Serialize};
use yiqu_mmse::TextMatching;
use yiqu_models::providers::spark::{DEFAULT_DOMAIN, DEFAULT_ENDPOINT};
use yiqu_models::providers::SparkConfig;

/// System prompt given to the assistant at the start of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一名专业的医疗助手，专注于认知障碍评估和相关咨询。请用通俗易懂的语言与患者交流，提供专业、准确的回答。";

/// Seconds to wait for a complete reply.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawYiquConfig {
    #[serde(default)]
    pub spark: RawSparkSection,

    #[serde(default)]
    pub assistant: RawAssistantSection,

    #[serde(default)]
    pub assessment: RawAssessmentSection,
}

/// Spark section as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSparkSection {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub uid: Option<String>,
    pub auditing: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAssistantSection {
    pub system_prompt: Option<String>,
    pub context_window: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAssessmentSection {
    pub text_matching: Option<TextMatching>,
    pub save_reports: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct YiquConfig {
    #[serde(default)]
    pub spark: SparkSection,

    #[serde(default)]
    pub assistant: AssistantSection,

    #[serde(default)]
    pub assessment: AssessmentSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkSection {
    /// WebSocket endpoint of the chat service
    pub url: String,

    /// Model domain matching the endpoint version
    pub domain: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// End-user id sent with each request
    pub uid: String,

    pub auditing: String,

    /// Upper bound for one complete reply
    pub timeout_secs: u64,
}

impl Default for SparkSection {
    fn default() -> Self {
        let spark = SparkConfig::default();
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            temperature: spark.temperature,
            max_tokens: spark.max_tokens,
            uid: spark.uid,
            auditing: spark.auditing,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SparkSection {
    pub fn provider_config(&self) -> SparkConfig {
        SparkConfig {
            endpoint: self.url.clone(),
            domain: self.domain.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            uid: self.uid.clone(),
            auditing: self.auditing.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSection {
    pub system_prompt: String,

    /// Send only the system prompt plus this many recent messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<usize>,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context_window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSection {
    /// How free-text answers are compared with accepted answers
    pub text_matching: TextMatching,

    /// Save a JSON report after each assessment
    pub save_reports: bool,
}

impl Default for AssessmentSection {
    fn default() -> Self {
        Self {
            text_matching: TextMatching::default(),
            save_reports: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = YiquConfig::default();
        assert_eq!(config.spark.url, DEFAULT_ENDPOINT);
        assert_eq!(config.spark.domain, DEFAULT_DOMAIN);
        assert_eq!(config.spark.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.assistant.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(config.assistant.context_window.is_none());
        assert_eq!(config.assessment.text_matching, TextMatching::Lenient);
        assert!(config.assessment.save_reports);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = YiquConfig {
            spark: SparkSection {
                url: "wss://spark-api.xf-yun.com/v4.0/chat".to_string(),
                domain: "4.0Ultra".to_string(),
                timeout_secs: 15,
                ..Default::default()
            },
            assistant: AssistantSection {
                context_window: Some(6),
                ..Default::default()
            },
            assessment: AssessmentSection {
                text_matching: TextMatching::Strict,
                save_reports: false,
            },
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: YiquConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.spark, config.spark);
        assert_eq!(parsed.assistant.context_window, Some(6));
        assert_eq!(parsed.assessment.text_matching, TextMatching::Strict);
        assert!(!parsed.assessment.save_reports);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[spark]
domain = "4.0Ultra"

[assessment]
text_matching = "strict"
"#;
        let raw: RawYiquConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.spark.domain.as_deref(), Some("4.0Ultra"));
        assert!(raw.spark.url.is_none());
        assert_eq!(raw.assessment.text_matching, Some(TextMatching::Strict));
        assert!(raw.assessment.save_reports.is_none());
        assert!(raw.assistant.system_prompt.is_none());
    }

    #[test]
    fn test_raw_config_empty_uses_none() {
        let raw: RawYiquConfig = toml::from_str("").unwrap();

        assert!(raw.spark.url.is_none());
        assert!(raw.spark.timeout_secs.is_none());
        assert!(raw.assistant.context_window.is_none());
    }

    #[test]
    fn unknown_text_matching_is_rejected() {
        let result = toml::from_str::<RawYiquConfig>("[assessment]\ntext_matching = \"fuzzy\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn provider_config_carries_spark_section() {
        let section = SparkSection {
            temperature: 0.2,
            max_tokens: 1024,
            ..Default::default()
        };
        let provider = section.provider_config();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.temperature, 0.2);
        assert_eq!(provider.max_tokens, 1024);
        assert_eq!(section.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
