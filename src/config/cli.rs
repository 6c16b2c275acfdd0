use crate::app::report::OutputFormat;
use crate::config::toml_config::AppConfig;
use crate::utils::logger::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cardio-risk")]
#[command(about = "Cardiovascular disease risk assessment from patient health metrics")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model artifact to load (overrides [model].artifact_path)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Output format (overrides [output].format)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Flag as elevated when the probability reaches this value instead of using the model label
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Assess one patient record (JSON file, `-` for stdin)
    Assess { record: PathBuf },

    /// Validate one patient record without loading the model
    Validate { record: PathBuf },

    /// Assess every row of a CSV file and write the results to another CSV
    Batch {
        input: PathBuf,

        #[arg(short, long, default_value = "assessments.csv")]
        output: PathBuf,
    },
}

impl CliConfig {
    /// 命令列參數覆蓋設定檔
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.artifact_path = model.to_string_lossy().into_owned();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(threshold) = self.threshold {
            config.assessment.decision_threshold = Some(threshold);
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assess_with_overrides() {
        let cli = CliConfig::parse_from([
            "cardio-risk",
            "assess",
            "patient.json",
            "--model",
            "models/forest.json",
            "--format",
            "json",
            "--threshold",
            "0.4",
            "--json-logs",
        ]);

        assert!(matches!(cli.command, Command::Assess { ref record } if record == &PathBuf::from("patient.json")));

        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.model.artifact_path, "models/forest.json");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.assessment.decision_threshold, Some(0.4));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_batch_default_output() {
        let cli = CliConfig::parse_from(["cardio-risk", "batch", "patients.csv"]);
        match cli.command {
            Command::Batch { input, output } => {
                assert_eq!(input, PathBuf::from("patients.csv"));
                assert_eq!(output, PathBuf::from("assessments.csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let cli = CliConfig::parse_from(["cardio-risk", "validate", "patient.json"]);
        let mut config = AppConfig::default();
        config.model.artifact_path = "from-file.json".to_string();

        cli.apply_overrides(&mut config);
        assert_eq!(config.model.artifact_path, "from-file.json");
        assert_eq!(config.assessment.decision_threshold, None);
    }
}
