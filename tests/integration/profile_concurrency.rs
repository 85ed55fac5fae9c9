use anyhow::Result;
use std::fs;
use std::thread;
use stylebase::profiles::{compute_hash, read_artifact};
use stylebase::profiling::FittedModels;

use crate::support::portfolio::{minimalist, romantic, two_mode_portfolio};
use crate::IntegrationHarness;

const WRITERS: usize = 6;

#[test]
fn concurrent_updates_on_one_identity_all_land() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let created = store.create("shared", &two_mode_portfolio(), Some(2))?;

    let batches: Vec<Vec<_>> = (0..WRITERS)
        .map(|writer| {
            (0..writer + 1)
                .map(|i| {
                    let idx = 1000 + writer * 100 + i;
                    if writer % 2 == 0 {
                        minimalist(idx)
                    } else {
                        romantic(idx)
                    }
                })
                .collect()
        })
        .collect();
    let added: usize = batches.iter().map(Vec::len).sum();

    let shared = &store;
    thread::scope(|scope| {
        let handles: Vec<_> = batches
            .iter()
            .map(|batch| scope.spawn(move || shared.update("shared", batch)))
            .collect();
        for handle in handles {
            let profile = handle.join().expect("writer thread panicked");
            assert!(profile.is_ok(), "{:?}", profile.err());
        }
    });

    let profile = store.require("shared")?;
    assert_eq!(profile.n_records, created.n_records + added);
    assert_eq!(profile.version, 1 + WRITERS as u32);
    assert_eq!(profile.model_id, created.model_id);
    let members: usize = profile.clusters.iter().map(|c| c.size).sum();
    assert_eq!(members, profile.n_records);

    let models_path = store.layout().models_json("shared");
    let models: FittedModels = read_artifact(&models_path)?.expect("models persisted");
    models.validate()?;
    assert_eq!(models.model_id, profile.model_id);
    assert_eq!(compute_hash(&fs::read(&models_path)?), profile.models_hash);

    let reopened = harness.store().require("shared")?;
    assert_eq!(reopened.n_records, profile.n_records);
    assert_eq!(reopened.version, profile.version);
    assert_eq!(reopened.models_hash, profile.models_hash);
    Ok(())
}

#[test]
fn distinct_identities_update_in_parallel() -> Result<()> {
    let harness = IntegrationHarness::new();
    let store = harness.store();
    let identities: Vec<String> = (0..4).map(|i| format!("designer-c{i}")).collect();
    for identity in &identities {
        store.create(identity, &two_mode_portfolio(), Some(2))?;
    }

    thread::scope(|scope| {
        for identity in &identities {
            let store = &store;
            scope.spawn(move || {
                for round in 0..3 {
                    store
                        .update(identity, &[minimalist(500 + round)])
                        .expect("update succeeds");
                }
            });
        }
    });

    for identity in &identities {
        let profile = store.require(identity)?;
        assert_eq!(profile.n_records, 13);
        assert_eq!(profile.version, 4);
    }
    Ok(())
}
