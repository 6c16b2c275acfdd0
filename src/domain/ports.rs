use crate::domain::contract::FeatureContract;
use crate::utils::error::{ModelLoadError, ScoringError};
use std::fmt;
use std::path::Path;

/// A pre-trained binary classifier treated as a black box.
///
/// Implementations receive rows already ordered by the feature contract.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Number of input columns the model was built for.
    fn n_features(&self) -> usize;

    /// Binary class (0 or 1) chosen by the model's own decision boundary.
    fn predict(&self, features: &[f64]) -> Result<u8, ScoringError>;

    /// Class probabilities `[p(0), p(1)]`.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError>;
}

/// Turns an artifact on disk into a [`Classifier`].
pub trait ArtifactLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
        contract: &FeatureContract,
    ) -> Result<Box<dyn Classifier>, ModelLoadError>;
}
