use crate::core::gateway::{ModelGateway, ModelHandle};
use crate::domain::model::{FeatureVector, Field, PatientRecord, RiskDecision, RiskLabel, Score};
use crate::domain::ports::ArtifactLoader;
use crate::utils::error::{PreconditionError, Result, ValidationError};
use crate::utils::validation::{self, FieldError};
use std::path::Path;
use std::sync::Arc;

/// 欄位錯誤清單，依欄位順序排列；空清單代表通過
pub type ValidationResult = Vec<FieldError>;

/// How a model score becomes a [`RiskLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DecisionPolicy {
    /// Use the classifier's own binary output.
    #[default]
    ModelLabel,
    /// Elevated when the positive-class probability is at or above the threshold.
    ProbabilityThreshold(f64),
}

impl DecisionPolicy {
    pub fn probability_threshold(threshold: f64) -> Result<Self> {
        validation::validate_probability_threshold("decision_threshold", threshold)?;
        Ok(DecisionPolicy::ProbabilityThreshold(threshold))
    }

    pub fn label(&self, score: &Score) -> RiskLabel {
        let elevated = match self {
            DecisionPolicy::ModelLabel => score.label == 1,
            DecisionPolicy::ProbabilityThreshold(t) => score.probability >= *t,
        };
        if elevated {
            RiskLabel::Elevated
        } else {
            RiskLabel::Low
        }
    }
}

/// Validates, vectorizes and scores patient records against one model handle.
///
/// Holds no per-request state; clone it or share it freely.
#[derive(Debug, Clone)]
pub struct RiskAssessmentService {
    handle: Arc<ModelHandle>,
    policy: DecisionPolicy,
}

impl RiskAssessmentService {
    pub fn new(handle: Arc<ModelHandle>) -> Self {
        Self {
            handle,
            policy: DecisionPolicy::default(),
        }
    }

    /// Initializes (or reuses) the gateway's handle for `artifact_path`.
    pub fn from_gateway<L: ArtifactLoader>(
        gateway: &ModelGateway<L>,
        artifact_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let handle = gateway.initialize(artifact_path)?;
        Ok(Self::new(handle))
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Checks every field and reports all violations in field order.
    pub fn validate(record: &PatientRecord) -> ValidationResult {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                let checked = match record.unparsed_value(field) {
                    Some(raw) => validation::check_raw(field, raw),
                    None => validation::check_field(field, record.get(field)),
                };
                checked.err().map(|kind| FieldError { field, kind })
            })
            .collect()
    }

    /// Fixed-order mapping of a record onto the model input.
    ///
    /// # Errors
    /// `PreconditionError::UnvalidatedRecord` when the record does not pass [`validate`](Self::validate).
    pub fn to_feature_vector(
        record: &PatientRecord,
    ) -> std::result::Result<FeatureVector, PreconditionError> {
        let errors = Self::validate(record);
        if !errors.is_empty() {
            return Err(PreconditionError::UnvalidatedRecord {
                violations: errors.len(),
            });
        }
        vectorize(record)
    }

    pub fn assess(&self, record: &PatientRecord) -> Result<RiskDecision> {
        let errors = Self::validate(record);
        if !errors.is_empty() {
            tracing::debug!("Record rejected with {} field error(s)", errors.len());
            return Err(ValidationError::new(errors).into());
        }

        let features = vectorize(record)?;
        let score = self.handle.score(&features)?;
        let decision = RiskDecision::new(self.policy.label(&score), score.probability);

        tracing::debug!(
            "Assessment complete: model_label={}, label={}, probability={:.4}",
            score.label,
            decision.label(),
            decision.probability()
        );
        Ok(decision)
    }
}

fn vectorize(record: &PatientRecord) -> std::result::Result<FeatureVector, PreconditionError> {
    let values = Field::ALL
        .iter()
        .map(|&field| record.get(field).map(|v| v.as_f64()))
        .collect::<Option<Vec<f64>>>()
        .ok_or(PreconditionError::UnvalidatedRecord { violations: 1 })?;
    Ok(FeatureVector::new(values))
}
