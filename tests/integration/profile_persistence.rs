use anyhow::Result;
use std::fs;
use stylebase::profiles::ProfileError;

use crate::support::portfolio::{minimalist, two_mode_portfolio};
use crate::IntegrationHarness;

#[test]
fn get_reads_back_after_cache_eviction() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let created = store.create("designer-p1", &two_mode_portfolio(), Some(3))?;
    store.evict("designer-p1");

    let loaded = store.get("designer-p1")?.expect("profile persisted");
    assert_eq!(loaded.n_clusters, 3);
    assert_eq!(loaded.n_records, 10);
    assert_eq!(loaded.model_id, created.model_id);
    assert_eq!(loaded.models_hash, created.models_hash);
    assert_eq!(loaded.clusters.len(), created.clusters.len());
    for (a, b) in loaded.clusters.iter().zip(&created.clusters) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.size, b.size);
        assert_eq!(a.style_name, b.style_name);
    }
    Ok(())
}

#[test]
fn profiles_survive_a_new_store() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness
        .store()
        .create("Studio/Ana", &two_mode_portfolio(), Some(2))?;

    let reopened = harness.store();
    let profile = reopened.require("Studio/Ana")?;
    assert_eq!(profile.identity, "Studio/Ana");
    assert_eq!(profile.n_records, 10);

    let updated = reopened.update("Studio/Ana", &[minimalist(7)])?;
    assert_eq!(updated.n_records, 11);
    assert_eq!(updated.version, 2);

    let layout = reopened.layout();
    assert!(layout.profile_json("Studio/Ana").exists());
    assert!(layout.models_json("Studio/Ana").exists());
    assert!(layout
        .identity_dir("Studio/Ana")
        .starts_with(harness.workspace_path()));
    Ok(())
}

#[test]
fn unknown_identity_reads_as_absent() {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    assert!(store.get("nobody").unwrap().is_none());
    let err = store.require("nobody").unwrap_err();
    assert!(matches!(err, ProfileError::ProfileNotFound(_)));
}

#[test]
fn missing_models_fail_update() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    store.create("designer-p2", &two_mode_portfolio(), Some(2))?;
    fs::remove_file(store.layout().models_json("designer-p2"))?;

    let err = store.update("designer-p2", &[minimalist(9)]).unwrap_err();
    assert!(matches!(err, ProfileError::ModelLoadFailure { .. }), "{err}");
    assert_eq!(err.status_code(), 500);

    let untouched = store.require("designer-p2")?;
    assert_eq!(untouched.n_records, 10);
    assert_eq!(untouched.version, 1);
    Ok(())
}

#[test]
fn corrupt_models_fail_update() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    store.create("designer-p3", &two_mode_portfolio(), Some(2))?;
    fs::write(store.layout().models_json("designer-p3"), b"{ not json")?;

    let err = store.update("designer-p3", &[minimalist(9)]).unwrap_err();
    assert!(matches!(err, ProfileError::ModelLoadFailure { .. }), "{err}");
    Ok(())
}

#[test]
fn models_from_another_fit_are_rejected() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    store.create("designer-p4", &two_mode_portfolio(), Some(2))?;
    store.create("designer-p5", &two_mode_portfolio(), Some(2))?;
    let foreign = fs::read(store.layout().models_json("designer-p5"))?;
    fs::write(store.layout().models_json("designer-p4"), foreign)?;

    let err = store.update("designer-p4", &[minimalist(9)]).unwrap_err();
    match err {
        ProfileError::ModelLoadFailure { identity, .. } => assert_eq!(identity, "designer-p4"),
        other => panic!("expected model load failure, got {other}"),
    }
    Ok(())
}
