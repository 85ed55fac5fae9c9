use anyhow::Result;
use stylebase::profiles::ProfileError;

use crate::support::portfolio::{minimalist, mixed_portfolio, romantic, two_mode_portfolio};
use crate::IntegrationHarness;

#[test]
fn update_unknown_identity_is_not_found() {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let err = store.update("ghost", &[minimalist(0)]).unwrap_err();
    assert!(matches!(err, ProfileError::ProfileNotFound(ref id) if id == "ghost"));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn update_folds_new_records_into_existing_modes() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let created = store.create("designer-2", &two_mode_portfolio(), Some(2))?;
    let big_id = created.clusters[0].id;

    let batch: Vec<_> = (100..103).map(minimalist).collect();
    let updated = store.update("designer-2", &batch)?;

    assert_eq!(updated.n_records, 13);
    assert_eq!(updated.version, 2);
    assert_eq!(updated.model_id, created.model_id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.feature_importance, created.feature_importance);

    let big = updated
        .clusters
        .iter()
        .find(|c| c.id == big_id)
        .expect("largest cluster survives update");
    assert_eq!(big.size, 11);
    assert_eq!(big.style_name, "Minimalist Tailoring");
    assert!(big.representative_records.len() <= 3);

    let sizes: usize = updated.clusters.iter().map(|c| c.size).sum();
    assert_eq!(sizes, 13);
    let percentages: f64 = updated.clusters.iter().map(|c| c.percentage).sum();
    assert!((percentages - 100.0).abs() < 1e-6);
    assert_eq!(updated.statistics.garment_distribution["blazer"], 11);
    assert_eq!(updated.statistics.color_distribution["black"], 11);
    Ok(())
}

#[test]
fn repeated_updates_keep_counting() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let records = mixed_portfolio(20);
    store.create("designer-3", &records[..12], None)?;
    store.update("designer-3", &records[12..16])?;
    let latest = store.update("designer-3", &records[16..])?;
    assert_eq!(latest.n_records, 20);
    assert_eq!(latest.version, 3);
    let sizes: usize = latest.clusters.iter().map(|c| c.size).sum();
    assert_eq!(sizes, 20);

    let reloaded = harness.store().require("designer-3")?;
    assert_eq!(reloaded.n_records, 20);
    assert_eq!(reloaded.version, 3);
    Ok(())
}

#[test]
fn empty_update_returns_profile_unchanged() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let created = store.create("designer-4", &two_mode_portfolio(), Some(2))?;
    let same = store.update("designer-4", &[])?;
    assert_eq!(same, created);
    Ok(())
}

#[test]
fn unseen_values_do_not_break_scoring() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    store.create("designer-5", &two_mode_portfolio(), Some(2))?;
    let mut novel = romantic(50);
    novel.attributes.silhouette = Some("cocoon".into());
    novel.colors.finish = Some("metallic".into());
    let updated = store.update("designer-5", &[novel])?;
    assert_eq!(updated.n_records, 11);
    assert!(updated
        .clusters
        .iter()
        .all(|c| c.centroid_confidence.is_finite()));
    Ok(())
}
