use std::{env, time::Instant};

use anyhow::{Context, Result};
use stylebase::profiles::ProfileStore;
use stylebase::records::VltRecord;
use stylebase::workspace::load_or_default;
use tracing_subscriber::EnvFilter;

const SILHOUETTES: [&str; 4] = ["tailored", "fluid", "oversized", "fitted"];
const FABRICS: [&str; 4] = ["wool", "silk", "jersey", "chiffon"];
const COLORS: [&str; 5] = ["black", "navy", "ivory", "red", "olive"];
const AESTHETICS: [&str; 4] = ["minimalist", "romantic", "avant-garde", "sporty"];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut args = env::args().skip(1);
    let records = args
        .next()
        .unwrap_or_else(|| "200".into())
        .parse::<usize>()
        .context("records argument must be a positive integer")?;
    let clusters = args
        .next()
        .unwrap_or_else(|| "5".into())
        .parse::<usize>()
        .context("clusters argument must be a positive integer")?;
    run_benchmark(records, clusters)
}

fn run_benchmark(record_count: usize, clusters: usize) -> Result<()> {
    let store = ProfileStore::from_config(&load_or_default()?)?;
    let identity = format!("profile-bench-{record_count}");
    let portfolio: Vec<VltRecord> = (0..record_count).map(make_record).collect();
    let (initial, extra) = portfolio.split_at(record_count - record_count / 5);

    let start = Instant::now();
    let profile = store.create(&identity, initial, Some(clusters))?;
    let create_elapsed = start.elapsed();

    let start = Instant::now();
    let updated = store.update(&identity, extra)?;
    let update_elapsed = start.elapsed();

    println!(
        "style profile | records={} | clusters={} | create={:.3?} | update={:.3?} | version={}",
        updated.n_records,
        profile.n_clusters,
        create_elapsed,
        update_elapsed,
        updated.version
    );
    Ok(())
}

fn make_record(idx: usize) -> VltRecord {
    let mode = idx % AESTHETICS.len();
    let mut record = VltRecord {
        image_id: Some(format!("bench-{idx}")),
        garment_type: Some(if idx % 3 == 0 { "dress" } else { "jacket" }.into()),
        ..VltRecord::default()
    };
    record.attributes.silhouette = Some(SILHOUETTES[mode].into());
    record.attributes.fabrication = Some(FABRICS[(mode + idx / 7) % FABRICS.len()].into());
    record.colors.primary = Some(COLORS[idx % COLORS.len()].into());
    record.style.aesthetic = Some(AESTHETICS[mode].into());
    if idx % 4 == 0 {
        record.style.formality = Some("formal".into());
    }
    record
}
