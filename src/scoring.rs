use crate::types::*;

/// Rank score: recency-weighted commit activity.
pub fn hotspot_score(record: &FileActivityRecord, weights: &Weights) -> u64 {
    record.recent_changes as u64 * weights.recent_changes
        + record.change_frequency as u64 * weights.change_frequency
}

/// Keeps records with at least `threshold` commits and orders them by
/// [`hotspot_score`], highest first. Equal scores keep their input order.
pub fn rank_hotspots(
    records:   &[FileActivityRecord],
    threshold: usize,
    weights:   &Weights,
) -> Vec<HotspotCandidate> {
    let mut candidates: Vec<HotspotCandidate> = records.iter()
        .filter(|r| r.change_frequency >= threshold)
        .map(|r| HotspotCandidate { score: hotspot_score(r, weights), record: r.clone() })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}
