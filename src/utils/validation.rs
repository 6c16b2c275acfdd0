use crate::domain::model::{Constraint, Field, FieldValue, RawValue};
use crate::utils::error::{Result, RiskError};
use serde::Serialize;
use std::fmt;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 單一欄位的驗證錯誤類型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldErrorKind {
    Missing,
    OutOfRange {
        value: FieldValue,
        min: FieldValue,
        max: FieldValue,
    },
    NotBinary {
        value: i64,
    },
    NotInteger {
        value: f64,
    },
    NotNumeric {
        value: String,
    },
    NotFinite,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Missing => write!(f, "value is required"),
            FieldErrorKind::OutOfRange { value, min, max } => {
                write!(f, "value {} must be between {} and {}", value, min, max)
            }
            FieldErrorKind::NotBinary { value } => write!(f, "value {} must be 0 or 1", value),
            FieldErrorKind::NotInteger { value } => write!(f, "value {} must be a whole number", value),
            FieldErrorKind::NotNumeric { value } => write!(f, "value '{}' is not a number", value),
            FieldErrorKind::NotFinite => write!(f, "value must be a finite number"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: Field,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// 依欄位限制檢查單一數值
pub fn check_field(field: Field, value: Option<FieldValue>) -> std::result::Result<(), FieldErrorKind> {
    let value = value.ok_or(FieldErrorKind::Missing)?;

    match (field.constraint(), value) {
        (Constraint::Binary, FieldValue::Int(v)) => validate_binary(v),
        (Constraint::IntRange { min, max }, FieldValue::Int(v)) => validate_int_range(v, min, max),
        (Constraint::FloatRange { min, max }, v) => validate_float_range(v.as_f64(), min, max),
        // 整數欄位以浮點值提供時
        (Constraint::Binary, FieldValue::Float(v)) => {
            validate_whole_number(v)?;
            validate_binary(v as i64)
        }
        (Constraint::IntRange { min, max }, FieldValue::Float(v)) => {
            validate_whole_number(v)?;
            validate_float_range(v, min as f64, max as f64)
        }
    }
}

/// 檢查無法以欄位型別讀取的原始值
pub fn check_raw(field: Field, raw: &RawValue) -> std::result::Result<(), FieldErrorKind> {
    match raw {
        RawValue::Number(value) => check_field(field, Some(*value)),
        RawValue::Text(value) => Err(FieldErrorKind::NotNumeric {
            value: value.clone(),
        }),
    }
}

pub fn validate_binary(value: i64) -> std::result::Result<(), FieldErrorKind> {
    match value {
        0 | 1 => Ok(()),
        _ => Err(FieldErrorKind::NotBinary { value }),
    }
}

pub fn validate_int_range(value: i64, min: i64, max: i64) -> std::result::Result<(), FieldErrorKind> {
    if value < min || value > max {
        return Err(FieldErrorKind::OutOfRange {
            value: FieldValue::Int(value),
            min: FieldValue::Int(min),
            max: FieldValue::Int(max),
        });
    }
    Ok(())
}

pub fn validate_finite(value: f64) -> std::result::Result<(), FieldErrorKind> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FieldErrorKind::NotFinite)
    }
}

pub fn validate_whole_number(value: f64) -> std::result::Result<(), FieldErrorKind> {
    validate_finite(value)?;
    if value.fract() != 0.0 {
        return Err(FieldErrorKind::NotInteger { value });
    }
    Ok(())
}

pub fn validate_float_range(value: f64, min: f64, max: f64) -> std::result::Result<(), FieldErrorKind> {
    validate_finite(value)?;
    if value < min || value > max {
        return Err(FieldErrorKind::OutOfRange {
            value: FieldValue::Float(value),
            min: FieldValue::Float(min),
            max: FieldValue::Float(max),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(RiskError::ConfigError {
            field: field_name.to_string(),
            message: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RiskError::ConfigError {
            field: field_name.to_string(),
            message: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_probability_threshold(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(RiskError::ConfigError {
            field: field_name.to_string(),
            message: format!("Threshold {} must be strictly between 0 and 1", value),
        });
    }
    Ok(())
}
