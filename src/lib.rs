//! # mushid 🍄
//!
//! Classify mushrooms as edible or poisonous from their categorical attributes
//! using a decision tree.
//!
//! The dataset is a CSV in the layout of the UCI Mushroom data set: a `class`
//! column (`e` / `p`) followed by single-letter attribute codes such as
//! `odor=f`. Attributes are one-hot encoded (`odor_f`, `odor_n`, ...), split
//! 75/25 with a fixed seed, and fitted with a CART decision tree that plugs
//! into [`linfa`](https://crates.io/crates/linfa)'s `Fit`/`Predict` traits.
//!
//! ## Features
//! - Feature catalog of observed values, for building selection menus
//! - One-hot encoding with a schema fixed at training time
//! - Held-out accuracy and confusion counts
//! - Top-N feature importances
//! - Single-record prediction by feature name → code
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use mushid::MushroomModel;
//!
//! let model = MushroomModel::from_csv(Path::new("mushroom.csv")).unwrap();
//! println!("Accuracy: {}", model.accuracy_percent());
//! let label = model.predict([("odor", "f"), ("gill-size", "n")]);
//! println!("Predicted: {label}");
//! ```

pub mod display;
pub mod encoding;
pub mod error;
pub mod tree;

use linfa::prelude::*;
use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

pub use encoding::{EncodingSchema, Reindexed};
pub use error::{MushroomError, Result};
pub use tree::{CartTree, TreeParams};

/// Binary class of a mushroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Edibility {
    Edible,
    Poisonous,
}

impl Edibility {
    /// Parses the dataset's class code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "e" => Some(Edibility::Edible),
            "p" => Some(Edibility::Poisonous),
            _ => None,
        }
    }

    fn class_index(self) -> usize {
        match self {
            Edibility::Edible => 0,
            Edibility::Poisonous => 1,
        }
    }

    fn from_class_index(idx: usize) -> Self {
        if idx == 1 {
            Edibility::Poisonous
        } else {
            Edibility::Edible
        }
    }
}

impl fmt::Display for Edibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edibility::Edible => f.write_str("EDIBLE"),
            Edibility::Poisonous => f.write_str("POISONOUS"),
        }
    }
}

/// One labeled row of the dataset. `attributes` is aligned with
/// [`MushroomData::features`].
#[derive(Debug, Clone, PartialEq)]
pub struct MushroomRecord {
    pub label: Edibility,
    pub attributes: Vec<String>,
}

/// Distinct observed values per feature, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl FeatureCatalog {
    fn build(features: &[String], records: &[MushroomRecord]) -> Self {
        let mut entries: Vec<(String, Vec<String>)> =
            features.iter().map(|f| (f.clone(), Vec::new())).collect();

        for record in records {
            for ((_, values), value) in entries.iter_mut().zip(&record.attributes) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }

        FeatureCatalog { entries }
    }

    pub fn values(&self, feature: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A loaded dataset: feature names, records and the derived catalog.
#[derive(Debug, Clone)]
pub struct MushroomData {
    pub features: Vec<String>,
    pub records: Vec<MushroomRecord>,
    pub catalog: FeatureCatalog,
}

impl MushroomData {
    /// Reads the CSV at `path` using `class` as the target column.
    pub fn load_and_prepare(path: &Path) -> Result<Self> {
        Self::load_with_target(path, &TrainingConfig::default().target_column)
    }

    pub fn load_with_target(path: &Path, target: &str) -> Result<Self> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => MushroomError::DatasetNotFound(path.to_path_buf()),
            _ => MushroomError::Io(err),
        })?;

        info!(path = %path.display(), "Loading dataset");
        let data = Self::from_reader(file, target)?;
        info!(
            samples = data.records.len(),
            features = data.features.len(),
            "Dataset loaded"
        );
        Ok(data)
    }

    /// Parses CSV data with a header row from any reader.
    pub fn from_reader<R: io::Read>(reader: R, target: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let target_idx = headers
            .iter()
            .position(|h| h == target)
            .ok_or_else(|| MushroomError::MissingTarget(target.to_string()))?;

        let features: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let label_code = record.get(target_idx).unwrap_or_default();
            let label =
                Edibility::from_code(label_code).ok_or_else(|| MushroomError::InvalidLabel {
                    row: row + 1,
                    label: label_code.to_string(),
                })?;

            let attributes = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != target_idx)
                .map(|(_, v)| v.to_string())
                .collect();

            records.push(MushroomRecord { label, attributes });
        }

        if records.is_empty() {
            return Err(MushroomError::EmptyDataset);
        }

        let catalog = FeatureCatalog::build(&features, &records);
        Ok(MushroomData {
            features,
            records,
            catalog,
        })
    }
}

/// A helper type for holding train/test splits.
#[derive(Debug)]
pub struct DatasetSplit {
    pub train: Vec<MushroomRecord>,
    pub test: Vec<MushroomRecord>,
}

/// Shuffles with a seeded RNG and moves `ceil(len * test_ratio)` records into the test set.
pub fn train_test_split(data: &[MushroomRecord], test_ratio: f64, seed: u64) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = data.to_vec();
    data.shuffle(&mut rng);

    let test_size = ((data.len() as f64) * test_ratio).ceil() as usize;
    let test_size = test_size.min(data.len());
    let train = data.split_off(test_size);

    DatasetSplit { train, test: data }
}

/// Training parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub target_column: String,
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            target_column: "class".to_string(),
            test_ratio: 0.25,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(MushroomError::InvalidConfig(format!(
                "test ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

/// Held-out confusion counts. Poisonous is the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Confusion {
    pub true_edible: usize,
    pub false_edible: usize,
    pub true_poisonous: usize,
    pub false_poisonous: usize,
}

impl Confusion {
    fn record(&mut self, actual: Edibility, predicted: Edibility) {
        match (actual, predicted) {
            (Edibility::Edible, Edibility::Edible) => self.true_edible += 1,
            (Edibility::Poisonous, Edibility::Edible) => self.false_edible += 1,
            (Edibility::Poisonous, Edibility::Poisonous) => self.true_poisonous += 1,
            (Edibility::Edible, Edibility::Poisonous) => self.false_poisonous += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_edible + self.false_edible + self.true_poisonous + self.false_poisonous
    }

    /// Fraction of correct predictions, `0.0` when nothing was evaluated.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.true_edible + self.true_poisonous) as f64 / total as f64,
        }
    }
}

/// Summary of a trained model, serializable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub samples: usize,
    pub columns: usize,
    pub accuracy: f64,
    pub confusion: Confusion,
    pub top_features: Vec<(String, f64)>,
}

/// Trained decision tree together with the encoding it expects.
pub struct MushroomModel {
    features: Vec<String>,
    catalog: FeatureCatalog,
    schema: EncodingSchema,
    tree: CartTree,
    importances: Vec<f64>,
    confusion: Confusion,
    samples: usize,
}

impl MushroomModel {
    /// Loads the CSV and trains with the default configuration.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let data = MushroomData::load_and_prepare(path)?;
        Self::train(&data)
    }

    pub fn train(data: &MushroomData) -> Result<Self> {
        Self::train_with(data, &TrainingConfig::default())
    }

    /// Encodes, splits, fits and evaluates.
    pub fn train_with(data: &MushroomData, config: &TrainingConfig) -> Result<Self> {
        config.validate()?;
        if data.records.is_empty() {
            return Err(MushroomError::EmptyDataset);
        }

        let schema = EncodingSchema::fit(&data.features, &data.records);
        let split = train_test_split(&data.records, config.test_ratio, config.seed);
        if split.train.is_empty() {
            return Err(MushroomError::EmptyDataset);
        }
        debug!(
            train = split.train.len(),
            test = split.test.len(),
            columns = schema.len(),
            "Split dataset"
        );

        info!("🧠 Training decision tree...");
        let x_train = schema.encode_records(&data.features, &split.train);
        let y_train: Array1<usize> = split.train.iter().map(|r| r.label.class_index()).collect();
        let train = Dataset::new(x_train, y_train);

        let tree = TreeParams::default()
            .fit(&train)
            .map_err(MushroomError::training)?;
        debug!(
            depth = tree.depth(),
            leaves = tree.num_leaves(),
            "Fitted decision tree"
        );

        let importances = tree.feature_importance().to_vec();

        let mut confusion = Confusion::default();
        if !split.test.is_empty() {
            let x_test = schema.encode_records(&data.features, &split.test);
            let predicted = tree.predict(&x_test);
            for (record, &idx) in split.test.iter().zip(predicted.iter()) {
                confusion.record(record.label, Edibility::from_class_index(idx));
            }
        } else {
            warn!("Test split is empty, accuracy is not meaningful");
        }

        let model = MushroomModel {
            features: data.features.clone(),
            catalog: data.catalog.clone(),
            schema,
            tree,
            importances,
            confusion,
            samples: data.records.len(),
        };
        info!(accuracy = %model.accuracy_percent(), "✅ Training done");
        Ok(model)
    }

    /// Predicts edibility for a mapping of feature name to attribute code.
    ///
    /// Features that are not supplied are encoded as zeros. Pairs with no
    /// matching column (unknown feature or unseen code) are dropped.
    pub fn predict<I, K, V>(&self, record: I) -> Edibility
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = self.schema.reindex(record);
        for column in &encoded.dropped {
            warn!(column = %column, "Query column not in training schema, ignored");
        }

        let predicted = self.tree.predict(&encoded.into_matrix());
        Edibility::from_class_index(predicted[0])
    }

    /// Top `top_n` encoded columns by importance, descending.
    pub fn feature_importances(&self, top_n: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.importances.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .take(top_n)
            .map(|(i, score)| (self.schema.columns()[i].clone(), score))
            .collect()
    }

    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    /// Accuracy as a percentage string, e.g. `"100.00%"`.
    pub fn accuracy_percent(&self) -> String {
        format!("{:.2}%", self.accuracy() * 100.0)
    }

    pub fn confusion(&self) -> Confusion {
        self.confusion
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    pub fn schema(&self) -> &EncodingSchema {
        &self.schema
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn report(&self, top_n: usize) -> ModelReport {
        ModelReport {
            samples: self.samples,
            columns: self.schema.len(),
            accuracy: self.accuracy(),
            confusion: self.confusion,
            top_features: self.feature_importances(top_n),
        }
    }
}

/// A known poisonous specimen (foul odour).
pub const REFERENCE_POISONOUS: [(&str, &str); 22] = [
    ("cap-shape", "x"),
    ("cap-surface", "s"),
    ("cap-color", "n"),
    ("bruises", "t"),
    ("odor", "f"),
    ("gill-attachment", "f"),
    ("gill-spacing", "c"),
    ("gill-size", "n"),
    ("gill-color", "b"),
    ("stalk-shape", "e"),
    ("stalk-root", "?"),
    ("stalk-surface-above-ring", "s"),
    ("stalk-surface-below-ring", "s"),
    ("stalk-color-above-ring", "w"),
    ("stalk-color-below-ring", "w"),
    ("veil-type", "p"),
    ("veil-color", "w"),
    ("ring-number", "o"),
    ("ring-type", "p"),
    ("spore-print-color", "k"),
    ("population", "v"),
    ("habitat", "u"),
];

/// A known edible specimen (no odour).
pub const REFERENCE_EDIBLE: [(&str, &str); 22] = [
    ("cap-shape", "x"),
    ("cap-surface", "s"),
    ("cap-color", "n"),
    ("bruises", "t"),
    ("odor", "n"),
    ("gill-attachment", "f"),
    ("gill-spacing", "c"),
    ("gill-size", "b"),
    ("gill-color", "w"),
    ("stalk-shape", "e"),
    ("stalk-root", "c"),
    ("stalk-surface-above-ring", "s"),
    ("stalk-surface-below-ring", "s"),
    ("stalk-color-above-ring", "w"),
    ("stalk-color-below-ring", "w"),
    ("veil-type", "p"),
    ("veil-color", "w"),
    ("ring-number", "o"),
    ("ring-type", "p"),
    ("spore-print-color", "k"),
    ("population", "s"),
    ("habitat", "u"),
];

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
class,cap-shape,odor
p,x,f
e,x,n
e,b,a
p,b,p
p,b,f
e,b,n
e,x,a
p,x,p
p,x,f
e,x,n
e,b,a
p,b,p
p,b,f
e,b,n
e,x,a
p,x,p
";

    fn data() -> MushroomData {
        MushroomData::from_reader(SAMPLE.as_bytes(), "class").unwrap()
    }

    #[test]
    fn edibility_codes_and_display() {
        assert_eq!(Edibility::from_code("e"), Some(Edibility::Edible));
        assert_eq!(Edibility::from_code("p"), Some(Edibility::Poisonous));
        assert_eq!(Edibility::from_code("x"), None);
        assert_eq!(Edibility::Poisonous.to_string(), "POISONOUS");
        assert_eq!(Edibility::Edible.to_string(), "EDIBLE");
    }

    #[test]
    fn catalog_keeps_order_of_appearance() {
        let data = data();
        assert_eq!(data.features, vec!["cap-shape", "odor"]);
        assert_eq!(data.catalog.values("odor").unwrap(), &["f", "n", "a", "p"]);
        assert_eq!(data.catalog.values("cap-shape").unwrap(), &["x", "b"]);
        assert!(data.catalog.values("class").is_none());
    }

    #[test]
    fn invalid_label_reports_row() {
        let csv = "class,odor\ne,n\nq,f\n";
        let err = MushroomData::from_reader(csv.as_bytes(), "class").unwrap_err();
        assert!(matches!(err, MushroomError::InvalidLabel { row: 2, .. }));
    }

    #[test]
    fn missing_target_column() {
        let csv = "label,odor\ne,n\n";
        let err = MushroomData::from_reader(csv.as_bytes(), "class").unwrap_err();
        assert!(matches!(err, MushroomError::MissingTarget(_)));
    }

    #[test]
    fn header_only_is_empty() {
        let err = MushroomData::from_reader("class,odor\n".as_bytes(), "class").unwrap_err();
        assert!(matches!(err, MushroomError::EmptyDataset));
    }

    #[test]
    fn split_uses_ceil_and_is_seeded() {
        let data = data();
        let a = train_test_split(&data.records, 0.25, 42);
        let b = train_test_split(&data.records, 0.25, 42);
        assert_eq!(a.test.len(), 4);
        assert_eq!(a.train.len(), 12);
        assert_eq!(a.test, b.test);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn rejects_out_of_range_test_ratio() {
        let config = TrainingConfig {
            test_ratio: 1.0,
            ..TrainingConfig::default()
        };
        let err = MushroomModel::train_with(&data(), &config).err().unwrap();
        assert!(matches!(err, MushroomError::InvalidConfig(_)));
    }

    #[test]
    fn confusion_accuracy() {
        let mut c = Confusion::default();
        assert_eq!(c.accuracy(), 0.0);
        c.record(Edibility::Edible, Edibility::Edible);
        c.record(Edibility::Poisonous, Edibility::Poisonous);
        c.record(Edibility::Poisonous, Edibility::Edible);
        c.record(Edibility::Edible, Edibility::Edible);
        assert_eq!(c.total(), 4);
        assert_eq!(c.false_edible, 1);
        assert!((c.accuracy() - 0.75).abs() < 1e-12);
    }

    fn odor_model() -> MushroomModel {
        let config = TrainingConfig {
            test_ratio: 0.05,
            ..TrainingConfig::default()
        };
        MushroomModel::train_with(&data(), &config).unwrap()
    }

    #[test]
    fn trained_model_separates_by_odor() {
        let model = odor_model();
        assert_eq!(model.sample_count(), 16);
        assert_eq!(model.schema().len(), 6);
        assert_eq!(model.predict([("odor", "f")]), Edibility::Poisonous);
        assert_eq!(model.predict([("odor", "n")]), Edibility::Edible);
        assert_eq!(model.predict([("odor", "a")]), Edibility::Edible);
        assert_eq!(model.predict([("odor", "p")]), Edibility::Poisonous);
    }

    #[test]
    fn every_sample_row_predicts_its_label() {
        let data = data();
        let model = odor_model();
        for record in &data.records {
            let query = data.features.iter().zip(&record.attributes);
            assert_eq!(model.predict(query), record.label, "{record:?}");
        }
        assert_eq!(model.feature_importances(6)[0].0.split('_').next(), Some("odor"));
    }
}
