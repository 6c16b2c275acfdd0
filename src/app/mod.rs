// Presentation collaborators: render decisions and drive batch assessment.

pub mod batch;
pub mod report;

use crate::domain::model::PatientRecord;
use crate::utils::error::{Result, RiskError};
use std::io::Read;
use std::path::Path;

/// 讀取單筆 JSON 病患記錄；路徑為 `-` 時從 stdin 讀取
pub fn read_record(path: &Path) -> Result<PatientRecord> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };

    serde_json::from_str(&content).map_err(|e| RiskError::InputError {
        message: format!("could not parse patient record {}: {}", path.display(), e),
    })
}
