use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 模型輸入欄位數量
pub const FEATURE_COUNT: usize = 13;

/// 病患記錄的欄位。宣告順序即為模型訓練時的特徵順序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "gender")]
    Gender,
    #[serde(rename = "height")]
    Height,
    #[serde(rename = "weight")]
    Weight,
    #[serde(rename = "systolicBP")]
    SystolicBp,
    #[serde(rename = "diastolicBP")]
    DiastolicBp,
    #[serde(rename = "cholesterolLevel")]
    CholesterolLevel,
    #[serde(rename = "glucoseLevel")]
    GlucoseLevel,
    #[serde(rename = "smoker")]
    Smoker,
    #[serde(rename = "alcoholUse")]
    AlcoholUse,
    #[serde(rename = "physicallyActive")]
    PhysicallyActive,
    #[serde(rename = "bodyMassIndex")]
    BodyMassIndex,
    #[serde(rename = "substanceUseScore")]
    SubstanceUseScore,
}

/// 欄位的數值限制
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Whole number within an inclusive range.
    IntRange { min: i64, max: i64 },
    /// 0 or 1.
    Binary,
    /// Finite number within an inclusive range.
    FloatRange { min: f64, max: f64 },
}

impl Field {
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Age,
        Field::Gender,
        Field::Height,
        Field::Weight,
        Field::SystolicBp,
        Field::DiastolicBp,
        Field::CholesterolLevel,
        Field::GlucoseLevel,
        Field::Smoker,
        Field::AlcoholUse,
        Field::PhysicallyActive,
        Field::BodyMassIndex,
        Field::SubstanceUseScore,
    ];

    /// Name used by inbound payloads.
    pub fn name(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Height => "height",
            Field::Weight => "weight",
            Field::SystolicBp => "systolicBP",
            Field::DiastolicBp => "diastolicBP",
            Field::CholesterolLevel => "cholesterolLevel",
            Field::GlucoseLevel => "glucoseLevel",
            Field::Smoker => "smoker",
            Field::AlcoholUse => "alcoholUse",
            Field::PhysicallyActive => "physicallyActive",
            Field::BodyMassIndex => "bodyMassIndex",
            Field::SubstanceUseScore => "substanceUseScore",
        }
    }

    /// Column name in the training dataset.
    pub fn column(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Height => "height",
            Field::Weight => "weight",
            Field::SystolicBp => "ap_hi",
            Field::DiastolicBp => "ap_lo",
            Field::CholesterolLevel => "cholesterol",
            Field::GlucoseLevel => "gluc",
            Field::Smoker => "smoke",
            Field::AlcoholUse => "alco",
            Field::PhysicallyActive => "active",
            Field::BodyMassIndex => "bmi",
            Field::SubstanceUseScore => "substance used",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn constraint(self) -> Constraint {
        match self {
            Field::Age => Constraint::IntRange { min: 1, max: 120 },
            Field::Height => Constraint::IntRange { min: 50, max: 250 },
            Field::SystolicBp => Constraint::IntRange { min: 50, max: 250 },
            Field::DiastolicBp => Constraint::IntRange { min: 30, max: 200 },
            Field::CholesterolLevel | Field::GlucoseLevel => Constraint::IntRange { min: 1, max: 3 },
            Field::Gender | Field::Smoker | Field::AlcoholUse | Field::PhysicallyActive => {
                Constraint::Binary
            }
            Field::Weight => Constraint::FloatRange { min: 10.0, max: 300.0 },
            Field::BodyMassIndex => Constraint::FloatRange { min: 3.47, max: 300.5 },
            Field::SubstanceUseScore => Constraint::FloatRange { min: 10.0, max: 300.0 },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 單一欄位的原始數值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FieldValue::Int(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// 表單或 CSV 送來、尚未套用欄位型別的原始值
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(FieldValue),
    Text(String),
}

impl RawValue {
    fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            RawValue::Number(FieldValue::Int(v))
        } else if let Ok(v) = trimmed.parse::<f64>() {
            RawValue::Number(FieldValue::Float(v))
        } else {
            RawValue::Text(text.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Number(FieldValue::Int(v)))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<RawValue, E> {
        Ok(RawValue::Number(FieldValue::Float(v as f64)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(RawValue::Number(match i64::try_from(v) {
            Ok(v) => FieldValue::Int(v),
            Err(_) => FieldValue::Float(v as f64),
        }))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<RawValue, E> {
        Ok(RawValue::Number(FieldValue::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Number(FieldValue::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::parse(v))
    }
}

/// One assessment request as submitted by a form, CLI or CSV row.
///
/// Every field is optional at the boundary so that a missing value can be
/// reported by validation instead of failing deserialization. Values that
/// cannot be read as the field's type (`55.5` for age, `"abc"` anywhere) are
/// kept in `unparsed` for the same reason. Training column names (`ap_hi`,
/// `gluc`, ...) are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordInput")]
pub struct PatientRecord {
    pub age: Option<i64>,
    pub gender: Option<i64>,
    pub height: Option<i64>,
    pub weight: Option<f64>,
    #[serde(rename = "systolicBP")]
    pub systolic_bp: Option<i64>,
    #[serde(rename = "diastolicBP")]
    pub diastolic_bp: Option<i64>,
    #[serde(rename = "cholesterolLevel")]
    pub cholesterol_level: Option<i64>,
    #[serde(rename = "glucoseLevel")]
    pub glucose_level: Option<i64>,
    pub smoker: Option<i64>,
    #[serde(rename = "alcoholUse")]
    pub alcohol_use: Option<i64>,
    #[serde(rename = "physicallyActive")]
    pub physically_active: Option<i64>,
    #[serde(rename = "bodyMassIndex")]
    pub body_mass_index: Option<f64>,
    #[serde(rename = "substanceUseScore")]
    pub substance_use_score: Option<f64>,
    #[serde(skip)]
    pub unparsed: Vec<(Field, RawValue)>,
}

impl PatientRecord {
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Age => self.age.map(FieldValue::Int),
            Field::Gender => self.gender.map(FieldValue::Int),
            Field::Height => self.height.map(FieldValue::Int),
            Field::Weight => self.weight.map(FieldValue::Float),
            Field::SystolicBp => self.systolic_bp.map(FieldValue::Int),
            Field::DiastolicBp => self.diastolic_bp.map(FieldValue::Int),
            Field::CholesterolLevel => self.cholesterol_level.map(FieldValue::Int),
            Field::GlucoseLevel => self.glucose_level.map(FieldValue::Int),
            Field::Smoker => self.smoker.map(FieldValue::Int),
            Field::AlcoholUse => self.alcohol_use.map(FieldValue::Int),
            Field::PhysicallyActive => self.physically_active.map(FieldValue::Int),
            Field::BodyMassIndex => self.body_mass_index.map(FieldValue::Float),
            Field::SubstanceUseScore => self.substance_use_score.map(FieldValue::Float),
        }
    }

    /// Raw value submitted for `field` that could not be read as its type.
    pub fn unparsed_value(&self, field: Field) -> Option<&RawValue> {
        self.unparsed
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, raw)| raw)
    }
}

/// Wire shape of [`PatientRecord`] before field types are applied.
#[derive(Deserialize)]
struct RecordInput {
    age: Option<RawValue>,
    gender: Option<RawValue>,
    height: Option<RawValue>,
    weight: Option<RawValue>,
    #[serde(rename = "systolicBP", alias = "ap_hi")]
    systolic_bp: Option<RawValue>,
    #[serde(rename = "diastolicBP", alias = "ap_lo")]
    diastolic_bp: Option<RawValue>,
    #[serde(rename = "cholesterolLevel", alias = "cholesterol")]
    cholesterol_level: Option<RawValue>,
    #[serde(rename = "glucoseLevel", alias = "gluc")]
    glucose_level: Option<RawValue>,
    #[serde(alias = "smoke")]
    smoker: Option<RawValue>,
    #[serde(rename = "alcoholUse", alias = "alco")]
    alcohol_use: Option<RawValue>,
    #[serde(rename = "physicallyActive", alias = "active")]
    physically_active: Option<RawValue>,
    #[serde(rename = "bodyMassIndex", alias = "bmi")]
    body_mass_index: Option<RawValue>,
    #[serde(rename = "substanceUseScore", alias = "substance used")]
    substance_use_score: Option<RawValue>,
}

/// f64 以上的整數無法精確表示
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

fn whole_number(field: Field, raw: Option<RawValue>, unparsed: &mut Vec<(Field, RawValue)>) -> Option<i64> {
    match raw? {
        RawValue::Number(FieldValue::Int(v)) => Some(v),
        RawValue::Number(FieldValue::Float(v)) if v.fract() == 0.0 && v.abs() <= EXACT_INTEGER_LIMIT => {
            Some(v as i64)
        }
        other => {
            unparsed.push((field, other));
            None
        }
    }
}

fn number(field: Field, raw: Option<RawValue>, unparsed: &mut Vec<(Field, RawValue)>) -> Option<f64> {
    match raw? {
        RawValue::Number(v) => Some(v.as_f64()),
        other => {
            unparsed.push((field, other));
            None
        }
    }
}

impl From<RecordInput> for PatientRecord {
    fn from(input: RecordInput) -> Self {
        let mut unparsed = Vec::new();
        PatientRecord {
            age: whole_number(Field::Age, input.age, &mut unparsed),
            gender: whole_number(Field::Gender, input.gender, &mut unparsed),
            height: whole_number(Field::Height, input.height, &mut unparsed),
            weight: number(Field::Weight, input.weight, &mut unparsed),
            systolic_bp: whole_number(Field::SystolicBp, input.systolic_bp, &mut unparsed),
            diastolic_bp: whole_number(Field::DiastolicBp, input.diastolic_bp, &mut unparsed),
            cholesterol_level: whole_number(Field::CholesterolLevel, input.cholesterol_level, &mut unparsed),
            glucose_level: whole_number(Field::GlucoseLevel, input.glucose_level, &mut unparsed),
            smoker: whole_number(Field::Smoker, input.smoker, &mut unparsed),
            alcohol_use: whole_number(Field::AlcoholUse, input.alcohol_use, &mut unparsed),
            physically_active: whole_number(Field::PhysicallyActive, input.physically_active, &mut unparsed),
            body_mass_index: number(Field::BodyMassIndex, input.body_mass_index, &mut unparsed),
            substance_use_score: number(Field::SubstanceUseScore, input.substance_use_score, &mut unparsed),
            unparsed,
        }
    }
}

/// Ordered model input for a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.0.get(field.index()).copied()
    }
}

/// 模型的原始輸出：二元標籤與正類機率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub label: u8,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Elevated,
    Low,
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Elevated => write!(f, "elevated"),
            RiskLabel::Low => write!(f, "low"),
        }
    }
}

/// Outcome of one assessment. Fields are read-only once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskDecision {
    label: RiskLabel,
    probability: f64,
}

impl RiskDecision {
    pub(crate) fn new(label: RiskLabel, probability: f64) -> Self {
        Self { label, probability }
    }

    pub fn label(&self) -> RiskLabel {
        self.label
    }

    /// Probability of the positive (disease) class, in `[0, 1]`.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn is_elevated(&self) -> bool {
        self.label == RiskLabel::Elevated
    }
}
