//! Garment observations ("VLT records") as delivered by the analysis stage.
//!
//! Every descriptive field is optional. A missing field, or one holding only
//! whitespace, is "no evidence" for that field and never a category of its own.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One analyzed garment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VltRecord {
    #[serde(default, rename = "imageId", skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garment_type: Option<String>,
    #[serde(default)]
    pub attributes: GarmentAttributes,
    #[serde(default)]
    pub colors: ColorInfo,
    #[serde(default)]
    pub style: StyleDescriptors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GarmentAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silhouette: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neckline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleeve_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waistline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabrication: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StyleDescriptors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aesthetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl VltRecord {
    /// Identifier used when the record is cited as a cluster representative.
    pub fn display_id(&self, batch_index: usize) -> String {
        present(&self.image_id)
            .or_else(|| present(&self.id))
            .map(str::to_string)
            .unwrap_or_else(|| format!("record_{batch_index}"))
    }

    /// Value of a categorical field, `None` when absent or blank.
    pub fn field(&self, field: AttributeField) -> Option<&str> {
        let raw = match field {
            AttributeField::Silhouette => &self.attributes.silhouette,
            AttributeField::Neckline => &self.attributes.neckline,
            AttributeField::SleeveLength => &self.attributes.sleeve_length,
            AttributeField::Length => &self.attributes.length,
            AttributeField::Waistline => &self.attributes.waistline,
            AttributeField::Fabrication => &self.attributes.fabrication,
            AttributeField::PrimaryColor => &self.colors.primary,
            AttributeField::Finish => &self.colors.finish,
            AttributeField::OverallStyle => &self.style.overall,
            AttributeField::Formality => &self.style.formality,
            AttributeField::Aesthetic => &self.style.aesthetic,
            AttributeField::Mood => &self.style.mood,
        };
        present(raw)
    }

    pub fn garment_type(&self) -> Option<&str> {
        present(&self.garment_type)
    }

    /// True when none of the categorical fields carries a value.
    pub fn is_blank(&self) -> bool {
        AttributeField::ALL.iter().all(|f| self.field(*f).is_none())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accepted shapes of a records file: a bare array, or an object carrying
/// the array under `vlt_records` (or `records`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordBatch {
    Bare(Vec<VltRecord>),
    Wrapped {
        #[serde(alias = "records")]
        vlt_records: Vec<VltRecord>,
    },
}

/// Parses a batch of records from JSON text.
pub fn parse_records(data: &str) -> Result<Vec<VltRecord>> {
    let batch: RecordBatch =
        serde_json::from_str(data).context("Failed parsing VLT records JSON")?;
    let records = match batch {
        RecordBatch::Bare(records) => records,
        RecordBatch::Wrapped { vlt_records } => vlt_records,
    };
    let blank = records.iter().filter(|r| r.is_blank()).count();
    if blank > 0 {
        debug!("{blank} of {} records carry no categorical fields", records.len());
    }
    Ok(records)
}

/// Reads a batch of records from a JSON file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<VltRecord>> {
    let path = path.as_ref();
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed reading records {:?}", path))?;
    parse_records(&data).with_context(|| format!("Invalid records file {:?}", path))
}

/// Categorical fields that feed one-hot encoding and cluster characterisation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributeField {
    Silhouette,
    Neckline,
    SleeveLength,
    Length,
    Waistline,
    Fabrication,
    PrimaryColor,
    Finish,
    OverallStyle,
    Formality,
    Aesthetic,
    Mood,
}

impl AttributeField {
    /// Column order of the encoded feature matrix.
    pub const ALL: [AttributeField; 12] = [
        AttributeField::Silhouette,
        AttributeField::Neckline,
        AttributeField::SleeveLength,
        AttributeField::Length,
        AttributeField::Waistline,
        AttributeField::Fabrication,
        AttributeField::PrimaryColor,
        AttributeField::Finish,
        AttributeField::OverallStyle,
        AttributeField::Formality,
        AttributeField::Aesthetic,
        AttributeField::Mood,
    ];

    /// Prefix used in feature column names, e.g. `silhouette_tailored`.
    pub fn feature_prefix(self) -> &'static str {
        match self {
            AttributeField::Silhouette => "silhouette",
            AttributeField::Neckline => "neckline",
            AttributeField::SleeveLength => "sleeveLength",
            AttributeField::Length => "length",
            AttributeField::Waistline => "waistline",
            AttributeField::Fabrication => "fabrication",
            AttributeField::PrimaryColor => "primary_color",
            AttributeField::Finish => "finish",
            AttributeField::OverallStyle => "overall",
            AttributeField::Formality => "formality",
            AttributeField::Aesthetic => "aesthetic",
            AttributeField::Mood => "mood",
        }
    }

    /// Key under which the field appears in a cluster's dominant attributes.
    pub fn dominant_key(self) -> &'static str {
        match self {
            AttributeField::Silhouette => "silhouette",
            AttributeField::Neckline => "neckline",
            AttributeField::SleeveLength => "sleeveLength",
            AttributeField::Length => "length",
            AttributeField::Waistline => "waistline",
            AttributeField::Fabrication => "fabrication",
            AttributeField::PrimaryColor => "color",
            AttributeField::Finish => "finish",
            AttributeField::OverallStyle => "style_overall",
            AttributeField::Formality => "style_formality",
            AttributeField::Aesthetic => "style_aesthetic",
            AttributeField::Mood => "style_mood",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sparse_json_records() {
        let raw = r#"[
            {"imageId": "img-1", "garment_type": "dress",
             "attributes": {"silhouette": "A-line", "sleeveLength": "short"},
             "colors": {"primary": "navy"},
             "style": {"aesthetic": "romantic"}},
            {"id": "rec-2"},
            {}
        ]"#;
        let records: Vec<VltRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].field(AttributeField::SleeveLength), Some("short"));
        assert_eq!(records[0].field(AttributeField::PrimaryColor), Some("navy"));
        assert_eq!(records[0].display_id(0), "img-1");
        assert_eq!(records[1].display_id(1), "rec-2");
        assert_eq!(records[2].display_id(2), "record_2");
        assert!(records[2].is_blank());
    }

    #[test]
    fn blank_strings_are_no_evidence() {
        let mut record = VltRecord::default();
        record.attributes.neckline = Some("   ".into());
        record.style.mood = Some(String::new());
        assert_eq!(record.field(AttributeField::Neckline), None);
        assert_eq!(record.field(AttributeField::Mood), None);
        assert!(record.is_blank());
    }

    #[test]
    fn accepts_wrapped_batches() {
        let wrapped = parse_records(r#"{"vlt_records": [{"id": "a"}, {"id": "b"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
        let aliased = parse_records(r#"{"records": [{"id": "a"}]}"#).unwrap();
        assert_eq!(aliased[0].display_id(0), "a");
        assert!(parse_records(r#"{"rows": []}"#).is_err());
    }
}
