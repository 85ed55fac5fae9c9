use crate::records::{AttributeField, VltRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One one-hot column: a (field, value) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureColumn {
    pub field: AttributeField,
    pub value: String,
}

impl FeatureColumn {
    pub fn name(&self) -> String {
        format!("{}_{}", self.field.feature_prefix(), self.value)
    }
}

/// Ordered set of one-hot columns.
///
/// A vocabulary derived from one batch does not line up with one derived from
/// another batch. Profiles freeze the vocabulary of their creating batch and
/// encode every later batch against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vocabulary {
    columns: Vec<FeatureColumn>,
}

impl Vocabulary {
    /// Collects the distinct values of every field observed in `records`.
    ///
    /// Columns follow [`AttributeField::ALL`] and, within a field, the
    /// lexicographic order of the values.
    pub fn from_records(records: &[VltRecord]) -> Self {
        let mut observed: BTreeMap<AttributeField, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            for field in AttributeField::ALL {
                if let Some(value) = record.field(field) {
                    observed.entry(field).or_default().insert(value.to_string());
                }
            }
        }
        let columns = observed
            .into_iter()
            .flat_map(|(field, values)| {
                values
                    .into_iter()
                    .map(move |value| FeatureColumn { field, value })
            })
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    /// Encodes records against this vocabulary. Values outside it are ignored.
    pub fn encode(&self, records: &[VltRecord]) -> FeatureMatrix {
        let slots: HashMap<(AttributeField, &str), usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| ((col.field, col.value.as_str()), idx))
            .collect();
        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![0.0; self.columns.len()];
                for field in AttributeField::ALL {
                    if let Some(idx) = record.field(field).and_then(|v| slots.get(&(field, v))) {
                        row[*idx] = 1.0;
                    }
                }
                row
            })
            .collect();
        FeatureMatrix {
            rows,
            names: self.feature_names(),
        }
    }
}

/// Dense numeric matrix, one row per record and one named column per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub rows: Vec<Vec<f64>>,
    pub names: Vec<String>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }
}

/// Derives a fresh vocabulary from `records` and encodes them with it.
pub fn extract_features(records: &[VltRecord]) -> (FeatureMatrix, Vocabulary) {
    let vocabulary = Vocabulary::from_records(records);
    let matrix = vocabulary.encode(records);
    (matrix, vocabulary)
}
