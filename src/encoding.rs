//! One-hot encoding of categorical attributes.
//!
//! The column list is fixed when the schema is fitted on the training data. Any
//! later query is reindexed onto exactly that list: missing columns are zero and
//! pairs that have no column are dropped, so the classifier always sees rows of
//! the width it was trained on.

use ndarray::{Array1, Array2, Axis};
use std::collections::{BTreeSet, HashMap};

use crate::MushroomRecord;

/// Name of the indicator column for `feature` taking `value`, e.g. `odor_n`.
pub fn column_name(feature: &str, value: &str) -> String {
    format!("{feature}_{value}")
}

/// Ordered indicator columns captured at training time.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

/// A single query row after reindexing onto a schema.
#[derive(Debug, Clone)]
pub struct Reindexed {
    pub row: Array1<f64>,
    /// Columns the query produced that the schema does not know about.
    pub dropped: Vec<String>,
}

impl Reindexed {
    /// The row as a `1 x columns` matrix, ready for prediction.
    pub fn into_matrix(self) -> Array2<f64> {
        self.row.insert_axis(Axis(0))
    }
}

impl EncodingSchema {
    /// Builds the schema from every (feature, value) pair observed in `records`.
    ///
    /// Features keep their column order; values within a feature are sorted.
    pub fn fit(features: &[String], records: &[MushroomRecord]) -> Self {
        let mut observed: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); features.len()];
        for record in records {
            for (values, value) in observed.iter_mut().zip(&record.attributes) {
                values.insert(value.as_str());
            }
        }

        let columns = features
            .iter()
            .zip(&observed)
            .flat_map(|(feature, values)| values.iter().map(move |v| column_name(feature, v)))
            .collect();

        Self::from_columns(columns)
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        EncodingSchema { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Encodes a batch of records into a dense indicator matrix.
    pub fn encode_records(&self, features: &[String], records: &[MushroomRecord]) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((records.len(), self.len()));
        for (mut row, record) in x.rows_mut().into_iter().zip(records) {
            for (feature, value) in features.iter().zip(&record.attributes) {
                if let Some(i) = self.position(&column_name(feature, value)) {
                    row[i] = 1.0;
                }
            }
        }
        x
    }

    /// One-hot encodes a single query and aligns it with the schema.
    pub fn reindex<I, K, V>(&self, pairs: I) -> Reindexed
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut row = Array1::<f64>::zeros(self.len());
        let mut dropped = Vec::new();

        for (feature, value) in pairs {
            let column = column_name(feature.as_ref(), value.as_ref());
            match self.position(&column) {
                Some(i) => row[i] = 1.0,
                None => dropped.push(column),
            }
        }

        Reindexed { row, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edibility;

    fn record(label: Edibility, attrs: &[&str]) -> MushroomRecord {
        MushroomRecord {
            label,
            attributes: attrs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn features() -> Vec<String> {
        vec!["cap-shape".to_string(), "odor".to_string()]
    }

    fn schema() -> EncodingSchema {
        let records = vec![
            record(Edibility::Poisonous, &["x", "p"]),
            record(Edibility::Edible, &["b", "a"]),
            record(Edibility::Edible, &["x", "n"]),
        ];
        EncodingSchema::fit(&features(), &records)
    }

    #[test]
    fn fit_orders_by_feature_then_sorted_value() {
        assert_eq!(
            schema().columns(),
            &["cap-shape_b", "cap-shape_x", "odor_a", "odor_n", "odor_p"]
        );
    }

    #[test]
    fn encode_records_sets_one_indicator_per_feature() {
        let schema = schema();
        let x = schema.encode_records(&features(), &[record(Edibility::Edible, &["b", "n"])]);
        assert_eq!(x.shape(), &[1, 5]);
        assert_eq!(x.row(0).to_vec(), vec![1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn reindex_zero_fills_missing_columns() {
        let schema = schema();
        let encoded = schema.reindex([("odor", "a")]);
        assert_eq!(encoded.row.to_vec(), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(encoded.dropped.is_empty());
    }

    #[test]
    fn reindex_drops_unknown_pairs() {
        let schema = schema();
        let encoded = schema.reindex([("odor", "z"), ("colour", "x"), ("cap-shape", "x")]);
        assert_eq!(encoded.row.len(), schema.len());
        assert_eq!(encoded.row.sum(), 1.0);
        assert_eq!(encoded.dropped, vec!["odor_z", "colour_x"]);
    }

    #[test]
    fn into_matrix_is_single_row() {
        let schema = schema();
        let x = schema.reindex([("odor", "n")]).into_matrix();
        assert_eq!(x.shape(), &[1, schema.len()]);
    }
}
