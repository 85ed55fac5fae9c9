use anyhow::Result;
use std::time::Instant;
use stylebase::profiles::ProfileError;
use stylebase::records::VltRecord;

use crate::support::portfolio::{mixed_portfolio, two_mode_portfolio};
use crate::IntegrationHarness;

fn assert_partition(profile: &stylebase::StyleProfile) {
    let sizes: usize = profile.clusters.iter().map(|c| c.size).sum();
    assert_eq!(sizes, profile.n_records, "cluster sizes must cover every record");
    let percentages: f64 = profile.clusters.iter().map(|c| c.percentage).sum();
    assert!(
        (percentages - 100.0).abs() < 1e-6,
        "percentages sum to {percentages}"
    );
    assert!(profile
        .clusters
        .windows(2)
        .all(|pair| pair[0].size >= pair[1].size));
}

#[test]
fn two_modes_are_named_and_confident() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let profile = store.create("designer-1", &two_mode_portfolio(), Some(2))?;

    assert_eq!(profile.n_clusters, 2);
    assert_eq!(profile.n_records, 10);
    assert_eq!(profile.version, 1);
    assert_partition(&profile);

    let names: Vec<&str> = profile
        .clusters
        .iter()
        .map(|c| c.style_name.as_str())
        .collect();
    assert_eq!(names, vec!["Minimalist Tailoring", "Romantic Bohemian"]);
    assert_eq!(profile.clusters[0].size, 8);
    assert!((profile.clusters[0].percentage - 80.0).abs() < 1e-9);
    assert!(profile
        .clusters
        .iter()
        .all(|c| c.centroid_confidence > 0.5));
    assert_eq!(
        profile.clusters[0].dominant_attributes["style_aesthetic"].value,
        "minimalist"
    );
    assert!(profile.clusters[0].representative_records.len() <= 3);
    assert!(profile.clusters[0]
        .representative_records
        .iter()
        .all(|r| r.record_id.starts_with("min-")));
    assert!(profile.clusters[1]
        .representative_records
        .iter()
        .all(|r| r.record_id.starts_with("rom-")));
    assert_eq!(
        profile.summary_message(),
        "Style profile created with 2 style modes"
    );
    Ok(())
}

#[test]
fn statistics_describe_the_portfolio() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let mut records = two_mode_portfolio();
    records.push(VltRecord::default());
    let profile = store.create("designer-stats", &records, Some(2))?;

    let stats = &profile.statistics;
    assert_eq!(stats.garment_distribution["blazer"], 8);
    assert_eq!(stats.garment_distribution["dress"], 2);
    assert_eq!(stats.garment_distribution["unknown"], 1);
    assert_eq!(stats.color_distribution["black"], 8);
    assert!(!stats.color_distribution.contains_key("unknown"));
    let expected = profile.clusters.len() as f64 / 11.0;
    assert!((stats.diversity_score - expected).abs() < 1e-9);
    assert!(
        (stats.largest_cluster_percentage - profile.clusters[0].percentage).abs() < 1e-9
    );
    assert!(!profile.feature_importance.is_empty());
    assert!(profile.feature_importance.len() <= 10);
    let total: f64 = profile.feature_importance.iter().map(|f| f.importance).sum();
    assert!(total <= 1.0 + 1e-9);
    Ok(())
}

#[test]
fn cluster_count_is_clamped_to_record_count() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let records = mixed_portfolio(3);
    let profile = store.create("small", &records, Some(5))?;
    assert_eq!(profile.n_clusters, 3);
    assert!(profile.clusters.len() <= 3);
    assert_partition(&profile);

    let single = store.create("single", &records[..1], None)?;
    assert_eq!(single.n_clusters, 1);
    assert_eq!(single.clusters.len(), 1);
    assert_eq!(single.clusters[0].size, 1);
    assert!((single.clusters[0].percentage - 100.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn empty_batch_is_insufficient_data() {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let err = store.create("nobody", &[], Some(3)).unwrap_err();
    assert!(matches!(err, ProfileError::InsufficientData));
    assert_eq!(err.status_code(), 400);
    assert!(store.get("nobody").unwrap().is_none());
}

#[test]
fn missing_fields_never_fail() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let mut sparse = VltRecord::default();
    sparse.attributes.neckline = Some("   ".into());
    let mut only_color = VltRecord::default();
    only_color.colors.primary = Some("navy".into());
    let records = vec![VltRecord::default(), sparse, only_color, VltRecord::default()];

    let profile = store.create("sparse", &records, Some(2))?;
    assert_eq!(profile.n_records, 4);
    assert_partition(&profile);
    for cluster in &profile.clusters {
        assert!(!cluster.style_name.is_empty());
        assert!(cluster.centroid_confidence.is_finite());
    }
    Ok(())
}

#[test]
fn identical_input_gives_identical_clusters() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let records = mixed_portfolio(24);
    let first = store.create("repeat-a", &records, Some(4))?;
    let second = store.create("repeat-b", &records, Some(4))?;

    assert_eq!(first.n_clusters, second.n_clusters);
    assert_eq!(first.clusters, second.clusters);
    assert_eq!(first.feature_importance, second.feature_importance);
    assert_ne!(first.model_id, second.model_id);
    Ok(())
}

fn one_of_a_kind(idx: usize) -> VltRecord {
    let tag = |field: &str| Some(format!("{field}-{idx}"));
    let mut record = VltRecord {
        image_id: tag("img"),
        garment_type: tag("garment"),
        ..VltRecord::default()
    };
    record.attributes.silhouette = tag("silhouette");
    record.attributes.neckline = tag("neckline");
    record.attributes.sleeve_length = tag("sleeve");
    record.attributes.length = tag("length");
    record.attributes.waistline = tag("waist");
    record.attributes.fabrication = tag("fabric");
    record.colors.primary = tag("color");
    record.colors.finish = tag("finish");
    record.style.overall = tag("overall");
    record.style.formality = tag("formality");
    record.style.aesthetic = tag("aesthetic");
    record.style.mood = tag("mood");
    record
}

#[test]
fn wide_vocabulary_create_stays_fast() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let records: Vec<_> = (0..60).map(one_of_a_kind).collect();

    let start = Instant::now();
    let profile = store.create("wide", &records, Some(5))?;
    let elapsed = start.elapsed();

    assert_eq!(profile.n_records, 60);
    assert_partition(&profile);
    assert!(
        elapsed.as_millis() < 10_000,
        "create over 60 one-of-a-kind records took {elapsed:?}"
    );
    Ok(())
}
