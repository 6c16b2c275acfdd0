use crate::core::gateway::ModelHandle;
use crate::domain::model::{RiskDecision, RiskLabel};
use crate::utils::error::Result;
use crate::utils::validation::FieldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const DISCLAIMER: &str = "This assessment is for educational and screening purposes only and does not replace professional medical diagnosis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What the presentation layer shows for one decision.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub assessed_at: DateTime<Utc>,
    pub label: RiskLabel,
    pub probability: f64,
    pub model: String,
    pub model_loaded_at: DateTime<Utc>,
}

impl AssessmentReport {
    pub fn new(decision: &RiskDecision, model: &ModelHandle) -> Self {
        Self {
            assessed_at: Utc::now(),
            label: decision.label(),
            probability: decision.probability(),
            model: model.source().display().to_string(),
            model_loaded_at: model.loaded_at(),
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.label {
            RiskLabel::Elevated => "⚠️  HIGH CARDIOVASCULAR RISK DETECTED",
            RiskLabel::Low => "✅ LOW CARDIOVASCULAR RISK",
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.headline());
        let _ = writeln!(
            out,
            "Estimated probability of cardiovascular disease: {:.1}%",
            self.probability * 100.0
        );
        let _ = writeln!(out, "Model: {}", self.model);
        let _ = writeln!(out, "Assessed at: {}", self.assessed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out);
        let _ = write!(out, "{}", DISCLAIMER);
        out
    }
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    errors: &'a [FieldError],
}

/// 列出所有欄位錯誤；清單為空時回報通過
pub fn render_validation(errors: &[FieldError], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ValidationReport {
            valid: errors.is_empty(),
            errors,
        })?),
        OutputFormat::Text if errors.is_empty() => Ok("✅ Patient record is valid".to_string()),
        OutputFormat::Text => {
            let mut out = format!("❌ {} field(s) need attention:", errors.len());
            for error in errors {
                let _ = write!(out, "\n  - {}", error);
            }
            Ok(out)
        }
    }
}
