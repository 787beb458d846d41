// Configuration management with layered configuration (file, env)

use crate::errors::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing every environment-keyed value the
/// pipeline and the approval handler read at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub sheet: SheetSettings,
    pub approval: ApprovalSettings,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub min_score: u8,
    pub worker_count: usize,
    pub default_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSettings {
    pub sheet_id: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSettings {
    pub channel_id: String,
    pub chat_api_base_url: String,
    #[serde(default)]
    pub chat_api_token: Option<String>,
    pub signing_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → config/default.toml
    /// → config/local.toml → `APP__`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("pipeline.min_score", 70)?
            .set_default("pipeline.worker_count", 4)?
            .set_default("pipeline.default_source", "manual")?
            .set_default("observability.log_level", "info")?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings, turning a missing required secret or malformed
    /// value into a descriptive startup error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.worker_count == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "pipeline.worker_count".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.pipeline.min_score > 100 {
            return Err(ConfigError::InvalidSetting {
                field: "pipeline.min_score".into(),
                reason: "must be in [0, 100]".into(),
            });
        }
        if self.sheet.sheet_id.is_empty() {
            return Err(ConfigError::MissingSetting("sheet.sheet_id".into()));
        }
        if self.sheet.base_url.is_empty() {
            return Err(ConfigError::MissingSetting("sheet.base_url".into()));
        }
        if self.approval.channel_id.is_empty() {
            return Err(ConfigError::MissingSetting("approval.channel_id".into()));
        }
        if self.approval.signing_secret.is_empty() {
            return Err(ConfigError::MissingSetting(
                "approval.signing_secret".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings {
                min_score: 70,
                worker_count: 4,
                default_source: "manual".to_string(),
            },
            sheet: SheetSettings {
                sheet_id: "local-dev-sheet".to_string(),
                base_url: "http://localhost:8090".to_string(),
                api_key: None,
            },
            approval: ApprovalSettings {
                channel_id: "local-dev-channel".to_string(),
                chat_api_base_url: "http://localhost:8091".to_string(),
                chat_api_token: None,
                signing_secret: "change-me-in-production".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}
