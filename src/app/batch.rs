use crate::core::assessment::RiskAssessmentService;
use crate::domain::model::{PatientRecord, RiskLabel};
use crate::utils::error::{Result, RiskError};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub elevated: usize,
    pub low: usize,
    pub rejected: usize,
}

#[derive(Debug, Serialize)]
struct BatchRow {
    row: usize,
    label: Option<RiskLabel>,
    probability: Option<f64>,
    errors: String,
}

/// Assesses every CSV row independently and writes one result row per input row.
///
/// Rows that fail to parse or validate are written with their errors and the
/// batch continues. Scoring and model errors abort the batch.
pub fn assess_csv<R: Read, W: Write>(
    service: &RiskAssessmentService,
    input: R,
    output: W,
) -> Result<BatchSummary> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for (index, parsed) in reader.deserialize::<PatientRecord>().enumerate() {
        let row = index + 1;
        summary.total += 1;

        let outcome = match parsed {
            Ok(record) => service.assess(&record),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(RiskError::InputError {
                message: e.to_string(),
            }),
        };

        let result_row = match outcome {
            Ok(decision) => {
                match decision.label() {
                    RiskLabel::Elevated => summary.elevated += 1,
                    RiskLabel::Low => summary.low += 1,
                }
                BatchRow {
                    row,
                    label: Some(decision.label()),
                    probability: Some(decision.probability()),
                    errors: String::new(),
                }
            }
            Err(RiskError::Validation(e)) => {
                summary.rejected += 1;
                BatchRow {
                    row,
                    label: None,
                    probability: None,
                    errors: e
                        .errors
                        .iter()
                        .map(|err| err.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                }
            }
            Err(RiskError::InputError { message }) => {
                summary.rejected += 1;
                tracing::warn!("Row {} could not be parsed: {}", row, message);
                BatchRow {
                    row,
                    label: None,
                    probability: None,
                    errors: message,
                }
            }
            Err(e) => {
                tracing::error!("❌ Batch aborted at row {}: {}", row, e);
                return Err(e);
            }
        };

        writer.serialize(result_row)?;
    }

    writer.flush()?;
    tracing::info!(
        "📊 Batch complete: {} rows, {} elevated, {} low, {} rejected",
        summary.total,
        summary.elevated,
        summary.low,
        summary.rejected
    );
    Ok(summary)
}

pub fn assess_csv_file(
    service: &RiskAssessmentService,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary> {
    let reader = File::open(input)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = File::create(output)?;

    assess_csv(service, reader, writer)
}
