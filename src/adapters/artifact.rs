use crate::adapters::forest::TreeEnsemble;
use crate::adapters::linear::LogisticRegression;
use crate::domain::contract::FeatureContract;
use crate::domain::ports::{ArtifactLoader, Classifier};
use crate::utils::error::ModelLoadError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// 支援的 artifact 格式版本
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// On-disk model artifact exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub contract: FeatureContract,
    #[serde(default)]
    pub description: Option<String>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
    TreeEnsemble(TreeEnsemble),
}

impl ModelSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::LogisticRegression(_) => "logistic_regression",
            ModelSpec::TreeEnsemble(_) => "tree_ensemble",
        }
    }
}

impl ModelArtifact {
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// 驗證格式版本、特徵契約與模型結構，通過後建立 classifier
    pub fn into_classifier(
        self,
        path: &Path,
        contract: &FeatureContract,
    ) -> Result<Box<dyn Classifier>, ModelLoadError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                version: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }

        contract
            .ensure_matches(&self.contract)
            .map_err(|reason| ModelLoadError::ContractMismatch {
                path: path.to_path_buf(),
                reason,
            })?;

        let corrupt = |reason: String| ModelLoadError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let n_features = contract.len();
        let classifier: Box<dyn Classifier> = match self.model {
            ModelSpec::LogisticRegression(model) => {
                model.check(n_features).map_err(corrupt)?;
                Box::new(model)
            }
            ModelSpec::TreeEnsemble(model) => {
                model.check(n_features).map_err(corrupt)?;
                Box::new(model)
            }
        };
        Ok(classifier)
    }
}

/// Loads [`ModelArtifact`] JSON documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArtifactLoader;

impl ArtifactLoader for JsonArtifactLoader {
    fn load(
        &self,
        path: &Path,
        contract: &FeatureContract,
    ) -> Result<Box<dyn Classifier>, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ModelLoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ModelLoadError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let artifact = ModelArtifact::from_json_str(&content).map_err(|e| ModelLoadError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            "Parsed artifact {} (kind={}, format_version={}, description={:?})",
            path.display(),
            artifact.model.kind(),
            artifact.format_version,
            artifact.description
        );

        artifact.into_classifier(path, contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn logistic_artifact_json(features: &[&str], coefficients: usize) -> String {
        serde_json::json!({
            "format_version": 1,
            "contract": { "version": 1, "features": features },
            "model": {
                "kind": "logistic_regression",
                "coefficients": vec![0.1; coefficients],
                "intercept": -1.0
            }
        })
        .to_string()
    }

    fn current_columns() -> Vec<&'static str> {
        crate::domain::model::Field::ALL
            .iter()
            .map(|f| f.column())
            .collect()
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_logistic_artifact() {
        let file = write_temp(&logistic_artifact_json(&current_columns(), 13));
        let classifier = JsonArtifactLoader
            .load(file.path(), &FeatureContract::current())
            .unwrap();
        assert_eq!(classifier.n_features(), 13);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = JsonArtifactLoader.load(
            Path::new("/nonexistent/cardio_model.json"),
            &FeatureContract::current(),
        );
        assert!(matches!(result, Err(ModelLoadError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let file = write_temp("{ not json");
        let result = JsonArtifactLoader.load(file.path(), &FeatureContract::current());
        assert!(matches!(result, Err(ModelLoadError::Corrupt { .. })));
    }

    #[test]
    fn test_reordered_contract_is_rejected() {
        let mut columns = current_columns();
        columns.swap(0, 1);
        let file = write_temp(&logistic_artifact_json(&columns, 13));

        let result = JsonArtifactLoader.load(file.path(), &FeatureContract::current());
        assert!(matches!(result, Err(ModelLoadError::ContractMismatch { .. })));
    }

    #[test]
    fn test_wrong_coefficient_count_is_corrupt() {
        let file = write_temp(&logistic_artifact_json(&current_columns(), 12));
        let result = JsonArtifactLoader.load(file.path(), &FeatureContract::current());
        assert!(matches!(result, Err(ModelLoadError::Corrupt { .. })));
    }

    #[test]
    fn test_unknown_format_version() {
        let json = logistic_artifact_json(&current_columns(), 13)
            .replace("\"format_version\":1", "\"format_version\":7");
        let file = write_temp(&json);

        let result = JsonArtifactLoader.load(file.path(), &FeatureContract::current());
        assert!(matches!(
            result,
            Err(ModelLoadError::UnsupportedFormat { version: 7, .. })
        ));
    }

    #[test]
    fn test_unknown_model_kind_is_corrupt() {
        let json = serde_json::json!({
            "format_version": 1,
            "contract": { "version": 1, "features": current_columns() },
            "model": { "kind": "neural_network", "layers": [] }
        })
        .to_string();
        let file = write_temp(&json);

        let result = JsonArtifactLoader.load(file.path(), &FeatureContract::current());
        assert!(matches!(result, Err(ModelLoadError::Corrupt { .. })));
    }
}
