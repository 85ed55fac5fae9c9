//! Characterisation of mixture components as style clusters.

use super::mixture::Assignment;
use super::naming::style_name;
use crate::records::{AttributeField, VltRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most frequent value of one field within a cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DominantValue {
    pub value: String,
    pub count: usize,
}

/// Keyed by [`AttributeField::dominant_key`].
pub type DominantAttributes = BTreeMap<String, DominantValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepresentativeRecord {
    pub record_id: String,
    pub probability: f64,
}

/// One mixture component seen through the records assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleCluster {
    pub id: usize,
    pub size: usize,
    pub percentage: f64,
    /// Mean posterior of the members for this component.
    pub centroid_confidence: f64,
    pub dominant_attributes: DominantAttributes,
    pub representative_records: Vec<RepresentativeRecord>,
    pub style_name: String,
}

/// Builds one cluster per distinct label, largest first.
pub fn analyze_clusters(
    records: &[VltRecord],
    assignment: &Assignment,
    representatives: usize,
) -> Vec<StyleCluster> {
    let mut clusters: Vec<StyleCluster> = group_by_label(&assignment.labels)
        .into_iter()
        .map(|(label, members)| {
            let mut cluster =
                build_cluster(label, &members, records, assignment, representatives, 0);
            cluster.percentage = percentage(cluster.size, records.len());
            cluster
        })
        .collect();
    sort_by_size(&mut clusters);
    clusters
}

/// Folds a newly scored batch into existing clusters without refitting.
///
/// Sizes grow by the new members, confidence becomes the size-weighted mean of
/// old and new posteriors, and representatives are the best of both sets.
/// Dominant attributes and the style name describe the new batch only.
/// Components that had no members before are added as new clusters.
/// Percentages are recomputed against `total_records`. Records without an
/// identifier are cited as `record_<i>` with `i` counted across the whole
/// profile, so they never collide with ids from earlier batches.
pub fn refresh_clusters(
    clusters: &mut Vec<StyleCluster>,
    records: &[VltRecord],
    assignment: &Assignment,
    representatives: usize,
    total_records: usize,
) {
    let offset = total_records.saturating_sub(records.len());
    for (label, members) in group_by_label(&assignment.labels) {
        let fresh = build_cluster(label, &members, records, assignment, representatives, offset);
        match clusters.iter_mut().find(|c| c.id == label) {
            Some(cluster) => {
                let combined = cluster.size + fresh.size;
                cluster.centroid_confidence = (cluster.centroid_confidence * cluster.size as f64
                    + fresh.centroid_confidence * fresh.size as f64)
                    / combined as f64;
                cluster.size = combined;
                cluster.dominant_attributes = fresh.dominant_attributes;
                cluster.style_name = fresh.style_name;
                cluster
                    .representative_records
                    .extend(fresh.representative_records);
                rank_representatives(&mut cluster.representative_records, representatives);
            }
            None => clusters.push(fresh),
        }
    }
    for cluster in clusters.iter_mut() {
        cluster.percentage = percentage(cluster.size, total_records);
    }
    sort_by_size(clusters);
}

/// Most frequent value per field; on equal counts the value seen first wins.
pub fn dominant_attributes<'a, I>(records: I) -> DominantAttributes
where
    I: IntoIterator<Item = &'a VltRecord>,
{
    let mut tallies: BTreeMap<AttributeField, Vec<(String, usize)>> = BTreeMap::new();
    for record in records {
        for field in AttributeField::ALL {
            let Some(value) = record.field(field) else {
                continue;
            };
            let tally = tallies.entry(field).or_default();
            match tally.iter_mut().find(|(v, _)| v == value) {
                Some((_, count)) => *count += 1,
                None => tally.push((value.to_string(), 1)),
            }
        }
    }
    tallies
        .into_iter()
        .filter_map(|(field, tally)| {
            let mut best: Option<(String, usize)> = None;
            for (value, count) in tally {
                if best.as_ref().map_or(true, |(_, c)| count > *c) {
                    best = Some((value, count));
                }
            }
            best.map(|(value, count)| {
                (
                    field.dominant_key().to_string(),
                    DominantValue { value, count },
                )
            })
        })
        .collect()
}

fn build_cluster(
    label: usize,
    members: &[usize],
    records: &[VltRecord],
    assignment: &Assignment,
    representatives: usize,
    index_offset: usize,
) -> StyleCluster {
    let posteriors: Vec<f64> = members
        .iter()
        .map(|&idx| assignment.probabilities[idx][label])
        .collect();
    let confidence = if posteriors.is_empty() {
        0.0
    } else {
        posteriors.iter().sum::<f64>() / posteriors.len() as f64
    };
    let dominant = dominant_attributes(members.iter().map(|&idx| &records[idx]));
    let mut reps: Vec<RepresentativeRecord> = members
        .iter()
        .zip(&posteriors)
        .map(|(&idx, &probability)| RepresentativeRecord {
            record_id: records[idx].display_id(index_offset + idx),
            probability,
        })
        .collect();
    rank_representatives(&mut reps, representatives);
    StyleCluster {
        id: label,
        size: members.len(),
        percentage: 0.0,
        centroid_confidence: confidence,
        style_name: style_name(&dominant),
        dominant_attributes: dominant,
        representative_records: reps,
    }
}

fn rank_representatives(reps: &mut Vec<RepresentativeRecord>, keep: usize) {
    reps.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    reps.truncate(keep);
}

fn group_by_label(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        groups.entry(*label).or_default().push(idx);
    }
    groups
}

fn percentage(size: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        size as f64 / total as f64 * 100.0
    }
}

fn sort_by_size(clusters: &mut [StyleCluster]) {
    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
}
