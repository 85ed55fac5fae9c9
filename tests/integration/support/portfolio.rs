use stylebase::records::VltRecord;

/// Tailored minimalist wool pieces.
pub fn minimalist(idx: usize) -> VltRecord {
    let mut record = VltRecord {
        image_id: Some(format!("min-{idx}")),
        garment_type: Some("blazer".into()),
        ..VltRecord::default()
    };
    record.attributes.silhouette = Some("tailored".into());
    record.attributes.fabrication = Some("wool".into());
    record.colors.primary = Some("black".into());
    record.style.aesthetic = Some("minimalist".into());
    record.style.formality = Some("formal".into());
    record
}

/// Draped romantic chiffon dresses.
pub fn romantic(idx: usize) -> VltRecord {
    let mut record = VltRecord {
        id: Some(format!("rom-{idx}")),
        garment_type: Some("dress".into()),
        ..VltRecord::default()
    };
    record.attributes.silhouette = Some("draped".into());
    record.attributes.fabrication = Some("chiffon".into());
    record.colors.primary = Some("blush".into());
    record.style.aesthetic = Some("romantic".into());
    record.style.mood = Some("dreamy".into());
    record
}

/// Eight minimalist records followed by two romantic ones.
pub fn two_mode_portfolio() -> Vec<VltRecord> {
    let mut records: Vec<VltRecord> = (0..8).map(minimalist).collect();
    records.extend((0..2).map(romantic));
    records
}

/// Records cycling through a few looks, enough for a five-mode fit.
pub fn mixed_portfolio(count: usize) -> Vec<VltRecord> {
    const AESTHETICS: [&str; 4] = ["minimalist", "romantic", "edgy", "sporty"];
    const SILHOUETTES: [&str; 4] = ["tailored", "flowing", "oversized", "fitted"];
    const COLORS: [&str; 3] = ["black", "ivory", "red"];
    (0..count)
        .map(|idx| {
            let mode = idx % AESTHETICS.len();
            let mut record = VltRecord {
                image_id: Some(format!("mix-{idx}")),
                garment_type: Some(if idx % 2 == 0 { "dress" } else { "top" }.into()),
                ..VltRecord::default()
            };
            record.attributes.silhouette = Some(SILHOUETTES[mode].into());
            record.colors.primary = Some(COLORS[idx % COLORS.len()].into());
            record.style.aesthetic = Some(AESTHETICS[mode].into());
            if idx % 5 == 0 {
                record.attributes.neckline = Some("v-neck".into());
            }
            record
        })
        .collect()
}
