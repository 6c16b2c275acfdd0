use crate::utils::validation::FieldError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model artifact not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Model artifact {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error(
        "Model artifact {} uses format version {version}, supported version is {supported}",
        .path.display()
    )]
    UnsupportedFormat {
        path: PathBuf,
        version: u32,
        supported: u32,
    },

    #[error("Model artifact {} does not match the feature contract: {reason}", .path.display())]
    ContractMismatch { path: PathBuf, reason: String },

    #[error(
        "Model already loaded from {}, refusing to load {}",
        .loaded.display(),
        .requested.display()
    )]
    AlreadyInitialized { loaded: PathBuf, requested: PathBuf },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Feature '{feature}' at position {index} is not a finite number ({value})")]
    NonFinite {
        index: usize,
        feature: String,
        value: f64,
    },

    #[error("Model produced an invalid output: {reason}")]
    InvalidOutput { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Record must pass validation before vectorization ({violations} field error(s))")]
    UnvalidatedRecord { violations: usize },
}

/// Every field-level violation found in one record, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn fields(&self) -> impl Iterator<Item = crate::domain::model::Field> + '_ {
        self.errors.iter().map(|e| e.field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid patient record: {0}")]
    Validation(#[from] ValidationError),

    #[error("Model load failed: {0}")]
    ModelLoad(#[from] ModelLoadError),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("Invalid input: {message}")]
    InputError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Model,
    Configuration,
    System,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 使用者可修正後重新提交
    Medium,
    High,
    /// 服務無法處理任何請求
    Critical,
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::Validation(_) | RiskError::InputError { .. } => ErrorCategory::Input,
            RiskError::SerializationError(_) | RiskError::CsvError(_) => ErrorCategory::Input,
            RiskError::ModelLoad(_) | RiskError::Scoring(_) => ErrorCategory::Model,
            RiskError::ConfigError { .. } => ErrorCategory::Configuration,
            RiskError::IoError(_) => ErrorCategory::System,
            RiskError::Precondition(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RiskError::Validation(_)
            | RiskError::InputError { .. }
            | RiskError::SerializationError(_)
            | RiskError::CsvError(_) => ErrorSeverity::Medium,
            RiskError::Scoring(_) | RiskError::Precondition(_) | RiskError::IoError(_) => {
                ErrorSeverity::High
            }
            RiskError::ModelLoad(_) | RiskError::ConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RiskError::Validation(_) => "Correct the highlighted fields and submit the record again",
            RiskError::InputError { .. } | RiskError::SerializationError(_) => {
                "Check that the record is a JSON object using the documented field names"
            }
            RiskError::CsvError(_) => "Check the CSV header row and that every cell holds a number",
            RiskError::ModelLoad(ModelLoadError::NotFound { .. }) => {
                "Point --model or [model].artifact_path at an existing artifact"
            }
            RiskError::ModelLoad(ModelLoadError::ContractMismatch { .. }) => {
                "Re-export the model with the current feature order or upgrade this tool"
            }
            RiskError::ModelLoad(_) => "Re-export the model artifact from the training pipeline",
            RiskError::Scoring(_) => {
                "The model and the feature contract disagree; re-export the artifact"
            }
            RiskError::Precondition(_) => "This is a bug; please report it with the input record",
            RiskError::ConfigError { .. } => "Fix the configuration file or command line flags",
            RiskError::IoError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RiskError::Validation(e) => format!(
                "The patient record has {} invalid field(s): {}",
                e.errors.len(),
                e.errors
                    .iter()
                    .map(|err| err.field.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            RiskError::ModelLoad(e) => format!("The risk model could not be loaded. {}", e),
            RiskError::Scoring(e) => format!("The risk model could not score this record. {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
