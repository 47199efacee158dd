use std::path::Path;

use crate::health::sort_by_priority;
use crate::types::*;

/// Collects per-file outcomes into the final report: results ordered by
/// priority, skipped files listed with their reasons.
pub fn build_report(
    repo_path:     &Path,
    file_count:    usize,
    hotspot_count: usize,
    mut skipped:   Vec<SkippedFile>,
    outcomes:      Vec<FileOutcome>,
) -> Report {
    let mut results = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Analyzed(result) => results.push(*result),
            FileOutcome::Skipped(skip) => skipped.push(skip),
        }
    }
    sort_by_priority(&mut results);

    let mut summary = PrioritySummary::default();
    for r in &results {
        match r.priority_analysis.priority() {
            Priority::Critical => summary.critical += 1,
            Priority::High     => summary.high += 1,
            Priority::Medium   => summary.medium += 1,
            Priority::Low      => summary.low += 1,
            Priority::Unknown  => summary.unknown += 1,
        }
    }

    Report {
        meta: ReportMeta {
            repo_name:      repo_name(repo_path),
            repo_path:      repo_path.display().to_string(),
            analyzed_at:    chrono::Utc::now().to_rfc3339(),
            file_count,
            hotspot_count,
            analyzed_count: results.len(),
        },
        summary,
        results,
        skipped,
    }
}

pub fn repo_name(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repo")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn result(path: &str, priority: &str) -> FileOutcome {
        let mut map = Map::new();
        map.insert("priority".into(), Value::from(priority));
        FileOutcome::Analyzed(Box::new(AnalysisResult {
            file_path: path.to_string(),
            git_metrics: FileActivityRecord::empty(path),
            health_analysis: HealthAnalysis(Map::new()),
            priority_analysis: PriorityAnalysis(map),
        }))
    }

    fn skipped(path: &str, reason: FileFailure) -> SkippedFile {
        SkippedFile { file_path: path.to_string(), reason }
    }

    #[test]
    fn test_results_ordered_and_counted() {
        let outcomes = vec![
            result("a.py", "MEDIUM"),
            FileOutcome::Skipped(skipped("b.rb", FileFailure::UnsupportedFileType { extension: ".rb".into() })),
            result("c.py", "CRITICAL"),
            result("d.py", "MEDIUM"),
        ];
        let history_skip = vec![skipped("old.py", FileFailure::History { message: "bad rename".into() })];
        let report = build_report(Path::new("/work/my-repo"), 40, 4, history_skip, outcomes);

        let order: Vec<&str> = report.results.iter().map(|r| r.file_path.as_str()).collect();
        assert_eq!(order, vec!["c.py", "a.py", "d.py"]);
        assert_eq!(report.summary.critical, 1);
        assert_eq!(report.summary.medium, 2);
        assert_eq!(report.meta.repo_name, "my-repo");
        assert_eq!(report.meta.analyzed_count, 3);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.file_path.as_str()).collect();
        assert_eq!(skipped, vec!["old.py", "b.rb"]);
    }

    #[test]
    fn test_report_serializes_result_fields() {
        let report = build_report(Path::new("repo"), 1, 1, Vec::new(), vec![result("a.py", "HIGH")]);
        let v = serde_json::to_value(&report).unwrap();
        let first = &v["results"][0];
        for key in ["file_path", "git_metrics", "health_analysis", "priority_analysis"] {
            assert!(first.get(key).is_some(), "result is missing '{key}': {first}");
        }
        assert_eq!(v["summary"]["high"], Value::from(1));
    }

    #[test]
    fn test_skipped_reason_is_tagged() {
        let report = build_report(
            Path::new("repo"), 1, 1, Vec::new(),
            vec![FileOutcome::Skipped(skipped("x.py", FileFailure::EmptyFile))],
        );
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["skipped"][0]["reason"]["kind"], Value::from("empty_file"));
        assert!(report.results.is_empty());
    }
}
