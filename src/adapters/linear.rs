use crate::domain::ports::Classifier;
use crate::utils::error::ScoringError;
use serde::{Deserialize, Serialize};

/// Per-column standardization applied before the linear model: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(format!(
                "scaler has {} means and {} scales, expected {} each",
                self.mean.len(),
                self.scale.len(),
                n_features
            ));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("scaler mean at position {} is not finite", i));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(format!("scaler scale at position {} must be finite and non-zero", i));
        }
        Ok(())
    }

    fn transform(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.scale[index]
    }
}

/// Binary logistic regression, optionally preceded by a [`StandardScaler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            scaler: None,
        }
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// 結構檢查，於載入時呼叫
    pub fn check(&self, n_features: usize) -> Result<(), String> {
        if self.coefficients.len() != n_features {
            return Err(format!(
                "{} coefficients, expected {}",
                self.coefficients.len(),
                n_features
            ));
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(format!("coefficient at position {} is not finite", i));
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".to_string());
        }
        if let Some(scaler) = &self.scaler {
            scaler.check(n_features)?;
        }
        Ok(())
    }

    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ScoringError> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let z = features
            .iter()
            .zip(&self.coefficients)
            .enumerate()
            .fold(self.intercept, |acc, (i, (x, w))| {
                let x = match &self.scaler {
                    Some(scaler) => scaler.transform(i, *x),
                    None => *x,
                };
                acc + w * x
            });

        if !z.is_finite() {
            return Err(ScoringError::InvalidOutput {
                reason: format!("decision function evaluated to {}", z),
            });
        }
        Ok(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<u8, ScoringError> {
        let z = self.decision_function(features)?;
        Ok(u8::from(z > 0.0))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        let p = sigmoid(self.decision_function(features)?);
        Ok([1.0 - p, p])
    }
}
