pub mod json;
pub mod markdown;
pub mod terminal;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::types::{FileActivityRecord, Report};

#[derive(Serialize)]
struct HealthScoreEntry<'a> {
    file_path: &'a str,
    health_score: Option<f64>,
    summary: Option<&'a str>,
}

/// `<results_dir>/<repo>-<YYYYmmdd-HHMMSS>`
pub fn timestamped_dir(results_dir: &Path, repo_name: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let safe: String = repo_name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    results_dir.join(format!("{safe}-{stamp}"))
}

/// Writes `hotspots.json`, `git_metrics.json`, `health_scores.json`, and
/// `report.md` into `dir`, creating it if needed.
pub fn save_results(report: &Report, dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Cannot create results directory {}: {e}", dir.display()))?;

    json::write_json(report, Some(&dir.join("hotspots.json")))?;

    let metrics: Vec<&FileActivityRecord> = report.results.iter().map(|r| &r.git_metrics).collect();
    json::write_json(&metrics, Some(&dir.join("git_metrics.json")))?;

    let scores: Vec<HealthScoreEntry> = report.results.iter()
        .map(|r| HealthScoreEntry {
            file_path: &r.file_path,
            health_score: r.health_analysis.health_score(),
            summary: r.health_analysis.summary(),
        })
        .collect();
    json::write_json(&scores, Some(&dir.join("health_scores.json")))?;

    let md_path = dir.join("report.md");
    std::fs::write(&md_path, markdown::render(report))
        .map_err(|e| format!("Failed to write {}: {e}", md_path.display()))
}

/// Metrics-only mode: every measured record as `git_metrics.json`.
pub fn save_metrics(records: &[FileActivityRecord], dir: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Cannot create results directory {}: {e}", dir.display()))?;
    let path = dir.join("git_metrics.json");
    json::write_json(records, Some(&path))?;
    Ok(path)
}
