use crate::app::report::OutputFormat;
use crate::core::assessment::DecisionPolicy;
use crate::domain::contract::{FeatureContract, CONTRACT_VERSION};
use crate::utils::error::{RiskError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ARTIFACT_PATH: &str = "models/cardio_logistic.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub assessment: AssessmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// 預期 artifact 宣告的特徵契約版本
    #[serde(default = "default_contract_version")]
    pub contract_version: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            contract_version: default_contract_version(),
        }
    }
}

fn default_artifact_path() -> String {
    DEFAULT_ARTIFACT_PATH.to_string()
}

fn default_contract_version() -> u32 {
    CONTRACT_VERSION
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// 未設定時沿用模型本身的二元輸出
    pub decision_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RiskError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RiskError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_DIR})，未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RiskError::ConfigError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_path("model.artifact_path", &self.model.artifact_path)?;

        if self.model.contract_version == 0 {
            return Err(RiskError::ConfigError {
                field: "model.contract_version".to_string(),
                message: "Contract version must be at least 1".to_string(),
            });
        }

        if let Some(threshold) = self.assessment.decision_threshold {
            crate::utils::validation::validate_probability_threshold(
                "assessment.decision_threshold",
                threshold,
            )?;
        }

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.as_str()) {
                return Err(RiskError::ConfigError {
                    field: "logging.level".to_string(),
                    message: format!(
                        "Unsupported level '{}'. Valid levels: {}",
                        level,
                        valid_levels.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(&self.model.artifact_path)
    }

    /// 依設定的版本建立 gateway 要核對的契約
    pub fn feature_contract(&self) -> FeatureContract {
        FeatureContract::with_version(self.model.contract_version)
    }

    pub fn decision_policy(&self) -> Result<DecisionPolicy> {
        match self.assessment.decision_threshold {
            Some(threshold) => DecisionPolicy::probability_threshold(threshold),
            None => Ok(DecisionPolicy::ModelLabel),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[model]
artifact_path = "/opt/models/cardio.json"
contract_version = 2

[assessment]
decision_threshold = 0.3

[logging]
level = "debug"
format = "json"

[output]
format = "json"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.artifact_path(), PathBuf::from("/opt/models/cardio.json"));
        assert_eq!(config.feature_contract().version, 2);
        assert_eq!(config.feature_contract().features, FeatureContract::current().features);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(
            config.decision_policy().unwrap(),
            DecisionPolicy::ProbabilityThreshold(0.3)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.model.artifact_path, DEFAULT_ARTIFACT_PATH);
        assert_eq!(config.feature_contract(), FeatureContract::current());
        assert_eq!(config.decision_policy().unwrap(), DecisionPolicy::ModelLabel);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CARDIO_RISK_TEST_MODEL_DIR", "/srv/models");

        let toml_content = r#"
[model]
artifact_path = "${CARDIO_RISK_TEST_MODEL_DIR}/cardio.json"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model.artifact_path, "/srv/models/cardio.json");

        std::env::remove_var("CARDIO_RISK_TEST_MODEL_DIR");
    }

    #[test]
    fn test_config_validation() {
        let bad_threshold = AppConfig::from_toml_str("[assessment]\ndecision_threshold = 1.2\n").unwrap();
        assert!(bad_threshold.validate().is_err());

        let bad_level = AppConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());

        let bad_path = AppConfig::from_toml_str("[model]\nartifact_path = \"\"\n").unwrap();
        assert!(bad_path.validate().is_err());

        let bad_version = AppConfig::from_toml_str("[model]\ncontract_version = 0\n").unwrap();
        assert!(bad_version.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AppConfig::from_toml_str("[model\nartifact_path = 1");
        assert!(matches!(result, Err(RiskError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[model]\nartifact_path = \"models/forest.json\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.model.artifact_path, "models/forest.json");
    }
}
