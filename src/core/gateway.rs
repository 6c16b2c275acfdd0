use crate::adapters::JsonArtifactLoader;
use crate::domain::contract::FeatureContract;
use crate::domain::model::{FeatureVector, Score};
use crate::domain::ports::{ArtifactLoader, Classifier};
use crate::utils::error::{ModelLoadError, ScoringError};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A loaded classifier together with the contract it was validated against.
///
/// Read-only after construction; share it across threads through `Arc`.
#[derive(Debug)]
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    contract: FeatureContract,
    source: PathBuf,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    pub fn new(classifier: Box<dyn Classifier>, contract: FeatureContract, source: PathBuf) -> Self {
        Self {
            classifier,
            contract,
            source,
            loaded_at: Utc::now(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Scores one row.
    ///
    /// Rejects vectors whose length differs from the contract or that hold
    /// NaN/infinite values, and checks that the classifier answered with a
    /// binary label and a probability pair summing to one.
    pub fn score(&self, features: &FeatureVector) -> Result<Score, ScoringError> {
        let expected = self.contract.len();
        if features.len() != expected {
            return Err(ScoringError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        if let Some((index, value)) = features
            .as_slice()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ScoringError::NonFinite {
                index,
                feature: self.contract.feature_name(index).unwrap_or("?").to_string(),
                value: *value,
            });
        }

        let label = self.classifier.predict(features.as_slice())?;
        let [p_negative, p_positive] = self.classifier.predict_proba(features.as_slice())?;

        if label > 1 {
            return Err(ScoringError::InvalidOutput {
                reason: format!("label {} is not binary", label),
            });
        }
        if !(0.0..=1.0).contains(&p_positive) || !(0.0..=1.0).contains(&p_negative) {
            return Err(ScoringError::InvalidOutput {
                reason: format!(
                    "probabilities [{}, {}] fall outside [0, 1]",
                    p_negative, p_positive
                ),
            });
        }
        if (p_negative + p_positive - 1.0).abs() > 1e-6 {
            return Err(ScoringError::InvalidOutput {
                reason: format!(
                    "probabilities [{}, {}] do not sum to 1",
                    p_negative, p_positive
                ),
            });
        }

        Ok(Score {
            label,
            probability: p_positive,
        })
    }
}

/// Owns the process-wide model handle.
///
/// The first successful [`initialize`](ModelGateway::initialize) loads the
/// artifact; every later call with the same path gets the same `Arc` back.
/// Concurrent first callers are serialized on `init_lock` so the artifact is
/// deserialized at most once. A failed load leaves the gateway unloaded.
pub struct ModelGateway<L: ArtifactLoader = JsonArtifactLoader> {
    loader: L,
    contract: FeatureContract,
    handle: OnceLock<Arc<ModelHandle>>,
    init_lock: Mutex<()>,
}

impl ModelGateway<JsonArtifactLoader> {
    pub fn new() -> Self {
        Self::with_loader(JsonArtifactLoader)
    }
}

impl Default for ModelGateway<JsonArtifactLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ArtifactLoader> ModelGateway<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            contract: FeatureContract::current(),
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// 覆寫預期的特徵契約
    pub fn with_contract(mut self, contract: FeatureContract) -> Self {
        self.contract = contract;
        self
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    pub fn initialize(&self, artifact_path: impl AsRef<Path>) -> Result<Arc<ModelHandle>, ModelLoadError> {
        let requested = resolve(artifact_path.as_ref());

        if let Some(handle) = self.handle.get() {
            return reuse(handle, &requested);
        }

        // 鎖內的 () 沒有可被破壞的狀態，poison 可直接忽略
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = self.handle.get() {
            return reuse(handle, &requested);
        }

        tracing::info!("📦 Loading model artifact from {}", requested.display());
        let classifier = self.loader.load(&requested, &self.contract).map_err(|e| {
            tracing::error!("❌ Model load failed: {}", e);
            e
        })?;

        if classifier.n_features() != self.contract.len() {
            return Err(ModelLoadError::ContractMismatch {
                path: requested,
                reason: format!(
                    "model accepts {} features, contract declares {}",
                    classifier.n_features(),
                    self.contract.len()
                ),
            });
        }

        let handle = Arc::new(ModelHandle::new(classifier, self.contract.clone(), requested));
        // 持有 init_lock 期間 cell 必為空
        let _ = self.handle.set(Arc::clone(&handle));

        tracing::info!(
            "✅ Model loaded (contract v{}, {} features)",
            self.contract.version,
            self.contract.len()
        );
        Ok(handle)
    }

    pub fn handle(&self) -> Option<Arc<ModelHandle>> {
        self.handle.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.get().is_some()
    }
}

fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn reuse(handle: &Arc<ModelHandle>, requested: &Path) -> Result<Arc<ModelHandle>, ModelLoadError> {
    if handle.source() != requested {
        return Err(ModelLoadError::AlreadyInitialized {
            loaded: handle.source().to_path_buf(),
            requested: requested.to_path_buf(),
        });
    }
    tracing::debug!("Reusing cached model handle for {}", requested.display());
    Ok(Arc::clone(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LogisticRegression;

    #[derive(Debug)]
    struct FixedClassifier {
        label: u8,
        proba: [f64; 2],
        n_features: usize,
    }

    impl Classifier for FixedClassifier {
        fn n_features(&self) -> usize {
            self.n_features
        }

        fn predict(&self, _features: &[f64]) -> Result<u8, ScoringError> {
            Ok(self.label)
        }

        fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ScoringError> {
            Ok(self.proba)
        }
    }

    fn handle_with(classifier: impl Classifier + 'static) -> ModelHandle {
        ModelHandle::new(
            Box::new(classifier),
            FeatureContract::current(),
            PathBuf::from("fixture.json"),
        )
    }

    #[test]
    fn test_score_rejects_wrong_dimension() {
        let handle = handle_with(LogisticRegression::new(vec![0.0; 13], 0.0));
        let result = handle.score(&FeatureVector::new(vec![1.0; 12]));
        assert_eq!(
            result,
            Err(ScoringError::DimensionMismatch {
                expected: 13,
                actual: 12
            })
        );
    }

    #[test]
    fn test_score_rejects_nan_with_feature_name() {
        let handle = handle_with(LogisticRegression::new(vec![0.0; 13], 0.0));
        let mut values = vec![1.0; 13];
        values[4] = f64::NAN;

        match handle.score(&FeatureVector::new(values)) {
            Err(ScoringError::NonFinite { index, feature, .. }) => {
                assert_eq!(index, 4);
                assert_eq!(feature, "ap_hi");
            }
            other => panic!("expected NonFinite, got {:?}", other),
        }
    }

    #[test]
    fn test_score_rejects_invalid_classifier_output() {
        let bad_label = handle_with(FixedClassifier {
            label: 2,
            proba: [0.5, 0.5],
            n_features: 13,
        });
        assert!(matches!(
            bad_label.score(&FeatureVector::new(vec![1.0; 13])),
            Err(ScoringError::InvalidOutput { .. })
        ));

        let bad_sum = handle_with(FixedClassifier {
            label: 1,
            proba: [0.5, 0.9],
            n_features: 13,
        });
        assert!(matches!(
            bad_sum.score(&FeatureVector::new(vec![1.0; 13])),
            Err(ScoringError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn test_score_returns_positive_class_probability() {
        let handle = handle_with(FixedClassifier {
            label: 1,
            proba: [0.25, 0.75],
            n_features: 13,
        });
        let score = handle.score(&FeatureVector::new(vec![1.0; 13])).unwrap();
        assert_eq!(score.label, 1);
        assert_eq!(score.probability, 0.75);
    }

    #[test]
    fn test_initialize_missing_artifact_leaves_gateway_unloaded() {
        let gateway = ModelGateway::new();
        let result = gateway.initialize("/nonexistent/model.json");

        assert!(matches!(result, Err(ModelLoadError::NotFound { .. })));
        assert!(!gateway.is_loaded());
        assert!(gateway.handle().is_none());
    }
}
