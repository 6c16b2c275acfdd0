use cardio_risk::utils::validation::FieldErrorKind;
use cardio_risk::{
    DecisionPolicy, Field, ModelGateway, PatientRecord, RiskAssessmentService, RiskError, RiskLabel,
};

const LOGISTIC_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cardio_logistic.json");
const FOREST_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cardio_forest.json");

fn example_record() -> PatientRecord {
    PatientRecord {
        age: Some(55),
        gender: Some(0),
        height: Some(170),
        weight: Some(80.0),
        systolic_bp: Some(150),
        diastolic_bp: Some(95),
        cholesterol_level: Some(3),
        glucose_level: Some(2),
        smoker: Some(1),
        alcohol_use: Some(0),
        physically_active: Some(0),
        body_mass_index: Some(27.7),
        substance_use_score: Some(50.0),
        unparsed: Vec::new(),
    }
}

fn healthy_record() -> PatientRecord {
    PatientRecord {
        age: Some(30),
        gender: Some(1),
        height: Some(165),
        weight: Some(58.5),
        systolic_bp: Some(115),
        diastolic_bp: Some(75),
        cholesterol_level: Some(1),
        glucose_level: Some(1),
        smoker: Some(0),
        alcohol_use: Some(0),
        physically_active: Some(1),
        body_mass_index: Some(22.0),
        substance_use_score: Some(20.0),
        unparsed: Vec::new(),
    }
}

fn logistic_service() -> RiskAssessmentService {
    let gateway = ModelGateway::new();
    RiskAssessmentService::from_gateway(&gateway, LOGISTIC_FIXTURE).unwrap()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[test]
fn test_end_to_end_example_is_elevated() {
    let service = logistic_service();

    let decision = service.assess(&example_record()).unwrap();

    // z = -14.5 + 55*0.04 + 150*0.05 + 95*0.03 + 3*0.6 + 2*0.2 + 1*0.2 + 27.7*0.02
    let expected = sigmoid(1.004);
    assert_eq!(decision.label(), RiskLabel::Elevated);
    assert!(decision.is_elevated());
    assert!((decision.probability() - expected).abs() < 1e-9);
}

#[test]
fn test_healthy_record_is_low() {
    let service = logistic_service();

    let decision = service.assess(&healthy_record()).unwrap();

    assert_eq!(decision.label(), RiskLabel::Low);
    assert!(decision.probability() < 0.5);
    assert!((0.0..=1.0).contains(&decision.probability()));
}

#[test]
fn test_label_is_consistent_with_model_output() {
    let service = logistic_service();

    for record in [example_record(), healthy_record()] {
        let decision = service.assess(&record).unwrap();
        let features = RiskAssessmentService::to_feature_vector(&record).unwrap();
        let score = service.handle().score(&features).unwrap();

        assert_eq!(decision.is_elevated(), score.label == 1);
        assert_eq!(decision.probability(), score.probability);
    }
}

#[test]
fn test_tree_ensemble_fixture() {
    let gateway = ModelGateway::new();
    let service = RiskAssessmentService::from_gateway(&gateway, FOREST_FIXTURE).unwrap();

    let elevated = service.assess(&example_record()).unwrap();
    assert_eq!(elevated.label(), RiskLabel::Elevated);
    assert!((elevated.probability() - 0.75).abs() < 1e-12);

    let low = service.assess(&healthy_record()).unwrap();
    assert_eq!(low.label(), RiskLabel::Low);
    assert!((low.probability() - 0.15).abs() < 1e-12);
}

#[test]
fn test_assess_lists_every_violated_field() {
    let service = logistic_service();
    let record = PatientRecord {
        age: Some(121),
        gender: Some(2),
        weight: None,
        cholesterol_level: Some(0),
        glucose_level: Some(4),
        substance_use_score: Some(5.0),
        ..example_record()
    };

    match service.assess(&record) {
        Err(RiskError::Validation(e)) => {
            let fields: Vec<Field> = e.fields().collect();
            assert_eq!(
                fields,
                vec![
                    Field::Age,
                    Field::Gender,
                    Field::Weight,
                    Field::CholesterolLevel,
                    Field::GlucoseLevel,
                    Field::SubstanceUseScore,
                ]
            );
            assert_eq!(e.errors[2].kind, FieldErrorKind::Missing);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_age_boundaries() {
    let service = logistic_service();

    for age in [1, 120] {
        let record = PatientRecord {
            age: Some(age),
            ..example_record()
        };
        assert!(RiskAssessmentService::validate(&record).is_empty(), "age {} should pass", age);
        assert!(service.assess(&record).is_ok());
    }

    for age in [0, 121] {
        let record = PatientRecord {
            age: Some(age),
            ..example_record()
        };
        let errors = RiskAssessmentService::validate(&record);
        assert_eq!(errors.len(), 1, "age {} should fail", age);
        assert_eq!(errors[0].field, Field::Age);
        assert!(matches!(errors[0].kind, FieldErrorKind::OutOfRange { .. }));
    }
}

#[test]
fn test_cholesterol_and_glucose_boundaries() {
    for level in [1, 2, 3] {
        let record = PatientRecord {
            cholesterol_level: Some(level),
            glucose_level: Some(level),
            ..example_record()
        };
        assert!(RiskAssessmentService::validate(&record).is_empty());
    }

    for level in [0, 4] {
        let record = PatientRecord {
            cholesterol_level: Some(level),
            glucose_level: Some(level),
            ..example_record()
        };
        let fields: Vec<Field> = RiskAssessmentService::validate(&record)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec![Field::CholesterolLevel, Field::GlucoseLevel]);
    }
}

#[test]
fn test_probability_threshold_policy_overrides_model_label() {
    let service = logistic_service().with_policy(DecisionPolicy::probability_threshold(0.01).unwrap());

    let decision = service.assess(&healthy_record()).unwrap();

    // 模型本身判定為低風險，但機率高於 1%
    assert_eq!(decision.label(), RiskLabel::Elevated);
    assert!(decision.probability() < 0.5);
}

#[test]
fn test_record_from_json_payload() {
    let payload = r#"{
        "age": 55, "gender": 0, "height": 170, "weight": 80.0,
        "systolicBP": 150, "diastolicBP": 95,
        "cholesterolLevel": 3, "glucoseLevel": 2,
        "smoker": 1, "alcoholUse": 0, "physicallyActive": 0,
        "bodyMassIndex": 27.7, "substanceUseScore": 50.0
    }"#;

    let record: PatientRecord = serde_json::from_str(payload).unwrap();
    assert_eq!(record, example_record());
}

#[test]
fn test_wrongly_typed_json_values_are_reported_with_other_violations() {
    let payload = r#"{
        "age": 55.5, "gender": 0, "height": 170, "weight": 80.0,
        "systolicBP": "high", "diastolicBP": 95,
        "cholesterolLevel": 4, "glucoseLevel": 2,
        "smoker": 1, "alcoholUse": 0, "physicallyActive": 0,
        "bodyMassIndex": 27.7, "substanceUseScore": 500.0
    }"#;

    let record: PatientRecord = serde_json::from_str(payload).unwrap();

    match logistic_service().assess(&record) {
        Err(RiskError::Validation(e)) => {
            let fields: Vec<Field> = e.fields().collect();
            assert_eq!(
                fields,
                vec![
                    Field::Age,
                    Field::SystolicBp,
                    Field::CholesterolLevel,
                    Field::SubstanceUseScore,
                ]
            );
            assert_eq!(e.errors[0].kind, FieldErrorKind::NotInteger { value: 55.5 });
            assert_eq!(
                e.errors[1].kind,
                FieldErrorKind::NotNumeric {
                    value: "high".to_string()
                }
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_whole_number_floats_are_accepted_for_integer_fields() {
    let payload = r#"{
        "age": 55.0, "gender": 0, "height": 170, "weight": 80,
        "systolicBP": 150, "diastolicBP": 95,
        "cholesterolLevel": 3, "glucoseLevel": 2,
        "smoker": 1, "alcoholUse": 0, "physicallyActive": 0,
        "bodyMassIndex": 27.7, "substanceUseScore": 50
    }"#;

    let record: PatientRecord = serde_json::from_str(payload).unwrap();
    assert_eq!(record, example_record());
}
