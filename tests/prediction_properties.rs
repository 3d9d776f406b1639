use healthy_plate::{
    ml::ModelArtifact, Advisor, FeatureAssembler, Nutrient, NutritionInput, PlateError,
};
use std::path::PathBuf;

fn demo_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/healthy_plate_model.json")
}

fn demo_advisor() -> Advisor {
    Advisor::new(ModelArtifact::load(demo_model_path()).unwrap()).unwrap()
}

fn advice_line(text: &str) -> &str {
    text.lines().nth(1).expect("two-line response")
}

#[test]
fn every_input_gets_prediction_or_error_text() {
    let advisor = demo_advisor();
    let awkward = [
        0.0,
        -0.0,
        -1.0,
        1e-300,
        1e300,
        -1e300,
        f64::MAX,
        f64::MIN,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
    ];

    for value in awkward {
        for slot in 0..8 {
            let mut values = [100.0; 8];
            values[slot] = value;
            let text = advisor.predict(&NutritionInput::from_array(values));
            assert!(
                text.starts_with("Prediction: ") || text.starts_with("Error in prediction: "),
                "slot {slot} = {value}: {text}"
            );
        }
        let text = advisor.predict(&NutritionInput::from_array([value; 8]));
        assert!(text.contains("Prediction:") || text.contains("Error in prediction:"));
    }
}

#[test]
fn nan_input_is_an_error_not_a_guess() {
    let advisor = demo_advisor();
    let mut input = NutritionInput::from_array([100.0; 8]);
    input.sodium = f64::NAN;
    let text = advisor.predict(&input);
    assert!(text.starts_with("Error in prediction: "), "{text}");
    assert_eq!(text.lines().count(), 1);
}

#[test]
fn form_defaults_plate() {
    let advisor = demo_advisor();
    let text = advisor.predict_values(200.0, 20.0, 15.0, 40.0, 10.0, 5.0, 300.0, 50.0);
    assert_eq!(
        text,
        "Prediction: Balanced (Confidence: 64.76%)\n\
         Advice: Add more fiber (fruits/vegetables). Increase protein intake."
    );
}

#[test]
fn repeated_calls_are_identical() {
    let advisor = demo_advisor();
    let input = NutritionInput::new(200.0, 20.0, 15.0, 40.0, 10.0, 5.0, 300.0, 50.0);
    let first = advisor.predict(&input);
    for _ in 0..10 {
        assert_eq!(advisor.predict(&input), first);
    }
}

#[test]
fn first_example_plate() {
    let advisor = demo_advisor();
    let text = advisor.predict_values(500.0, 30.0, 10.0, 50.0, 8.0, 6.0, 400.0, 60.0);
    assert_eq!(
        text,
        "Prediction: Balanced (Confidence: 61.74%)\n\
         Advice: Add more fiber (fruits/vegetables). Increase protein intake."
    );
}

#[test]
fn second_example_plate() {
    let advisor = demo_advisor();
    let text = advisor.predict_values(900.0, 10.0, 70.0, 100.0, 45.0, 5.0, 900.0, 30.0);
    assert_eq!(
        text,
        "Prediction: Unbalanced (Confidence: 99.99%)\n\
         Advice: Add more fiber (fruits/vegetables). Increase protein intake."
    );
}

#[test]
fn all_zero_plate() {
    let advisor = demo_advisor();
    let text = advisor.predict(&NutritionInput::from_array([0.0; 8]));
    assert!(text.starts_with("Prediction: Balanced (Confidence: 69.88%)"), "{text}");
    assert_eq!(
        advice_line(&text),
        "Advice: Add more fiber (fruits/vegetables). Increase protein intake."
    );
}

#[test]
fn balanced_advice_is_the_fallback_message_only() {
    let advisor = demo_advisor();
    let text = advisor.predict_values(400.0, 60.0, 80.0, 50.0, 50.0, 20.0, 300.0, 50.0);
    assert_eq!(
        advice_line(&text),
        "Advice: Your input looks generally balanced. Keep it up!"
    );
}

#[test]
fn fat_tip_alone() {
    let advisor = demo_advisor();
    let text = advisor.predict_values(400.0, 60.0, 81.0, 50.0, 10.0, 25.0, 300.0, 50.0);
    assert_eq!(advice_line(&text), "Advice: Reduce fatty foods.");
}

#[test]
fn permuted_schema_round_trips_by_name() {
    let schema: Vec<String> = [
        "Nutrition Density",
        "Sodium",
        "Dietary Fiber",
        "Sugars",
        "Carbohydrates",
        "Fat",
        "Protein",
        "Caloric Value",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let assembler = FeatureAssembler::new(&schema).unwrap();
    let input = NutritionInput::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0);
    let fv = assembler.assemble(&input);

    assert_eq!(fv.values(), &[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    for nutrient in Nutrient::ALL {
        assert_eq!(fv.value_of(nutrient), Some(input.get(nutrient)));
    }
    assert_eq!(fv.to_input(), Some(input));
}

#[test]
fn artifact_with_foreign_schema_refuses_to_serve() {
    let dir = std::env::temp_dir().join(format!("healthy-plate-schema-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("model.json");

    let mut artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(demo_model_path()).unwrap()).unwrap();
    artifact["features"][0] = serde_json::json!("Calories");
    std::fs::write(&path, artifact.to_string()).unwrap();

    let loaded = ModelArtifact::load(&path).expect("artifact itself is well-formed");
    match Advisor::new(loaded) {
        Err(PlateError::SchemaMismatch { reason, .. }) => {
            assert!(reason.contains("Calories"), "{reason}");
        }
        Err(other) => panic!("expected schema mismatch, got {other}"),
        Ok(_) => panic!("expected schema mismatch"),
    }
}
