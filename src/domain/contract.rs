use crate::domain::model::Field;
use serde::{Deserialize, Serialize};

/// 目前的特徵契約版本
pub const CONTRACT_VERSION: u32 = 1;

/// Versioned description of the model input: which columns, in which order.
///
/// A model artifact declares the contract it was trained against and the
/// gateway refuses to load it unless it matches the one this build vectorizes
/// records into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContract {
    pub version: u32,
    pub features: Vec<String>,
}

impl FeatureContract {
    /// Contract produced by [`Field::ALL`].
    pub fn current() -> Self {
        Self {
            version: CONTRACT_VERSION,
            features: Field::ALL.iter().map(|f| f.column().to_string()).collect(),
        }
    }

    /// Current column list under another version number.
    pub fn with_version(version: u32) -> Self {
        Self {
            version,
            ..Self::current()
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_name(&self, index: usize) -> Option<&str> {
        self.features.get(index).map(String::as_str)
    }

    /// 檢查 artifact 宣告的契約是否與預期一致，回傳第一個差異的描述
    pub fn ensure_matches(&self, declared: &FeatureContract) -> Result<(), String> {
        if declared.version != self.version {
            return Err(format!(
                "contract version {} declared, {} expected",
                declared.version, self.version
            ));
        }

        if declared.len() != self.len() {
            return Err(format!(
                "{} features declared, {} expected",
                declared.len(),
                self.len()
            ));
        }

        if let Some((position, (expected, found))) = self
            .features
            .iter()
            .zip(&declared.features)
            .enumerate()
            .find(|(_, (expected, found))| expected != found)
        {
            return Err(format!(
                "feature at position {} is '{}', expected '{}'",
                position, found, expected
            ));
        }

        Ok(())
    }
}

impl Default for FeatureContract {
    fn default() -> Self {
        Self::current()
    }
}
