use mushid::display::{DATASET_SOURCE, render_summary};
use mushid::{
    Edibility, MushroomData, MushroomError, MushroomModel, REFERENCE_EDIBLE, REFERENCE_POISONOUS,
    TrainingConfig,
};
use std::io::Write;
use std::path::Path;

const SAMPLE: &str = "tests/data/mushrooms_sample.csv";

fn sample_model() -> MushroomModel {
    MushroomModel::from_csv(Path::new(SAMPLE)).unwrap()
}

#[test]
fn loads_sample_dataset() {
    let data = MushroomData::load_and_prepare(Path::new(SAMPLE)).unwrap();
    assert_eq!(data.features.len(), 22);
    assert_eq!(data.features[0], "cap-shape");
    assert!(!data.features.iter().any(|f| f == "class"));
    assert_eq!(data.records.len(), 482);
    assert_eq!(data.catalog.len(), 22);
    assert_eq!(data.catalog.values("veil-type").unwrap(), &["p"]);
}

#[test]
fn missing_dataset_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mushroom.csv");
    let err = MushroomModel::from_csv(&path).err().unwrap();
    match err {
        MushroomError::DatasetNotFound(p) => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ragged_row_is_a_csv_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "class,odor,habitat").unwrap();
    writeln!(file, "e,n,g").unwrap();
    writeln!(file, "p,f").unwrap();
    let err = MushroomData::load_and_prepare(file.path()).unwrap_err();
    assert!(matches!(err, MushroomError::Csv(_)));
}

#[test]
fn training_is_deterministic_for_fixed_seed() {
    let data = MushroomData::load_and_prepare(Path::new(SAMPLE)).unwrap();
    let a = MushroomModel::train(&data).unwrap();
    let b = MushroomModel::train(&data).unwrap();
    assert_eq!(a.accuracy(), b.accuracy());
    assert_eq!(a.confusion(), b.confusion());
    assert_eq!(a.feature_importances(5), b.feature_importances(5));
}

#[test]
fn held_out_accuracy_on_sample() {
    let model = sample_model();
    let confusion = model.confusion();
    assert_eq!(confusion.total(), 121);
    assert!(model.accuracy() > 0.9, "accuracy {}", model.accuracy());
    assert!(model.accuracy_percent().ends_with('%'));
}

#[test]
fn custom_config_changes_split_size() {
    let data = MushroomData::load_and_prepare(Path::new(SAMPLE)).unwrap();
    let config = TrainingConfig {
        test_ratio: 0.5,
        seed: 7,
        ..TrainingConfig::default()
    };
    let model = MushroomModel::train_with(&data, &config).unwrap();
    assert_eq!(model.confusion().total(), 241);
}

#[test]
fn reference_specimens() {
    let model = sample_model();
    assert_eq!(model.predict(REFERENCE_POISONOUS), Edibility::Poisonous);
    assert_eq!(model.predict(REFERENCE_EDIBLE), Edibility::Edible);
    assert_eq!(model.predict(REFERENCE_POISONOUS).to_string(), "POISONOUS");
    assert_eq!(model.predict(REFERENCE_EDIBLE).to_string(), "EDIBLE");
}

#[test]
fn malformed_keys_are_ignored() {
    let model = sample_model();
    let mut query: Vec<(&str, &str)> = REFERENCE_POISONOUS.to_vec();
    query.push(("smell", "f"));
    query.push(("habitat", "zz"));
    assert_eq!(model.predict(query), Edibility::Poisonous);
}

#[test]
fn top_five_importances() {
    let model = sample_model();
    let top = model.feature_importances(5);
    assert_eq!(top.len(), 5);
    assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    assert!(top.iter().all(|(_, s)| *s >= 0.0));

    let sum: f64 = top.iter().map(|(_, s)| s).sum();
    assert!(sum <= 1.0 + 1e-9, "sum {sum}");

    let all: f64 = model
        .feature_importances(model.schema().len())
        .iter()
        .map(|(_, s)| s)
        .sum();
    assert!(all <= 1.0 + 1e-9, "sum {all}");

    assert!(top.iter().all(|(name, _)| model.schema().position(name).is_some()));
}

#[test]
fn report_serializes() {
    let model = sample_model();
    let json = serde_json::to_value(model.report(3)).unwrap();
    assert_eq!(json["samples"], 482);
    assert_eq!(json["top_features"].as_array().unwrap().len(), 3);
}

#[test]
fn every_dataset_row_predicts_its_label() {
    let data = MushroomData::load_and_prepare(Path::new(SAMPLE)).unwrap();
    let model = MushroomModel::train(&data).unwrap();

    let wrong: Vec<usize> = data
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| model.predict(data.features.iter().zip(&r.attributes)) != r.label)
        .map(|(i, _)| i)
        .collect();
    assert!(wrong.is_empty(), "misclassified rows: {wrong:?}");
    assert_eq!(model.accuracy(), 1.0);
}

#[test]
fn each_odor_alone_follows_its_class() {
    let model = sample_model();
    for code in ["a", "l", "n"] {
        assert_eq!(model.predict([("odor", code)]), Edibility::Edible, "odor={code}");
    }
    for code in ["c", "y", "f", "m", "p", "s"] {
        assert_eq!(
            model.predict([("odor", code)]),
            Edibility::Poisonous,
            "odor={code}"
        );
    }
}

#[test]
fn summary_names_dataset_and_accuracy() {
    let model = sample_model();
    let text = render_summary(&model, 5);
    assert!(text.contains("482 samples"));
    assert!(text.contains(DATASET_SOURCE));
    assert!(text.contains(&model.accuracy_percent()));
    assert!(text.contains("Top 5 feature importances"));
    assert!(text.contains("Odor: "));
}
