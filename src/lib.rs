pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::AppConfig;

pub use crate::core::assessment::{DecisionPolicy, RiskAssessmentService, ValidationResult};
pub use crate::core::gateway::{ModelGateway, ModelHandle};
pub use domain::contract::FeatureContract;
pub use domain::model::{FeatureVector, Field, PatientRecord, RiskDecision, RiskLabel};
pub use utils::error::{ModelLoadError, PreconditionError, Result, RiskError, ScoringError, ValidationError};
