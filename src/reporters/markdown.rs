use serde_json::Value;

use crate::types::{value_text, AnalysisResult, Priority, Report};

/// Renders the full analysis report as Markdown.
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    let meta = &report.meta;

    out.push_str(&format!("# Hotspot Health Report: {}\n\n", meta.repo_name));
    out.push_str(&format!("**Repository:** `{}`  \n", meta.repo_path));
    out.push_str(&format!("**Analyzed:** {}  \n", meta.analyzed_at));
    out.push_str(&format!(
        "**Files:** {} tracked, {} hotspots, {} analyzed\n\n",
        meta.file_count, meta.hotspot_count, meta.analyzed_count,
    ));

    out.push_str("## Summary\n\n");
    out.push_str("| Priority | Files |\n|----------|-------|\n");
    for level in Priority::LEVELS {
        out.push_str(&format!("| {level} | {} |\n", report.summary.count(level)));
    }
    if report.summary.unknown > 0 {
        out.push_str(&format!("| {} | {} |\n", Priority::Unknown, report.summary.unknown));
    }
    out.push('\n');

    if !report.results.is_empty() {
        out.push_str("## Hotspots\n\n");
        for (i, result) in report.results.iter().enumerate() {
            render_result(&mut out, i + 1, result);
        }
    }

    if !report.skipped.is_empty() {
        out.push_str("## Skipped Files\n\n");
        for s in &report.skipped {
            out.push_str(&format!("- `{}`: {}\n", s.file_path, s.reason));
        }
        out.push('\n');
    }

    render_action_plan(&mut out, &report.results);

    out.push_str("---\n\n");
    out.push_str(&format!(
        "*Generated by hotspot-health {} on {}*\n",
        env!("CARGO_PKG_VERSION"),
        meta.analyzed_at,
    ));
    out
}

fn render_result(out: &mut String, rank: usize, result: &AnalysisResult) {
    let health = &result.health_analysis;
    let priority = &result.priority_analysis;
    let m = &result.git_metrics;

    out.push_str(&format!("### {rank}. `{}`\n\n", result.file_path));
    let score = health.health_score()
        .map(|s| format!("{s}/10"))
        .unwrap_or_else(|| "N/A".to_string());
    out.push_str(&format!(
        "**Priority:** {} | **Health Score:** {score}\n\n",
        priority.priority(),
    ));
    if let Some(error) = health.parse_error() {
        out.push_str(&format!("> Health analysis could not be parsed: {error}\n\n"));
    }
    if let Some(summary) = health.summary() {
        out.push_str(&format!("**Summary:** {summary}\n\n"));
    }

    out.push_str("#### Git Metrics\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Total commits | {} |\n", m.change_frequency));
    out.push_str(&format!("| Recent changes | {} |\n", m.recent_changes));
    out.push_str(&format!("| Unique authors | {} |\n", m.unique_authors));
    out.push_str(&format!("| Code churn | {} (+{} / -{}) |\n", m.code_churn, m.lines_added, m.lines_deleted));
    let last = if m.last_modified.is_empty() { "unknown" } else { m.last_modified.as_str() };
    out.push_str(&format!("| Last modified | {last} |\n"));
    if !m.coupling.is_empty() {
        let partners: Vec<String> = m.coupling.iter().map(|c| format!("`{c}`")).collect();
        out.push_str(&format!("| Changes with | {} |\n", partners.join(", ")));
    }
    out.push('\n');

    let issues = health.issues();
    if !issues.is_empty() {
        out.push_str("#### Issues\n\n");
        out.push_str("| Category | Issue | Location | Severity |\n|----------|-------|----------|----------|\n");
        for issue in &issues {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                cell(&issue.category), cell(&issue.issue), cell(&issue.location), cell(&issue.severity),
            ));
        }
        out.push('\n');
    }

    let recommendations = health.recommendation_items();
    if !recommendations.is_empty() {
        out.push_str("#### Recommendations\n\n");
        for rec in &recommendations {
            match &rec.priority {
                Some(p) => out.push_str(&format!("- **[P{p}]** {}\n", rec.action)),
                None => out.push_str(&format!("- {}\n", rec.action)),
            }
            if let Some(impact) = &rec.impact {
                out.push_str(&format!("  - Impact: {impact}\n"));
            }
        }
        out.push('\n');
    }

    out.push_str("#### Technical Debt Analysis\n\n");
    match priority.0.get("reasoning") {
        Some(Value::Object(reasons)) => {
            for (key, value) in reasons {
                out.push_str(&format!("- **{}:** {}\n", heading(key), value_text(value)));
            }
        }
        Some(Value::String(s)) => out.push_str(&format!("{s}\n")),
        _ => out.push_str("No reasoning provided.\n"),
    }
    for key in ["estimated_effort", "recommended_first_step"] {
        if let Some(value) = priority.0.get(key) {
            out.push_str(&format!("\n**{}:** {}\n", heading(key), value_text(value)));
        }
    }
    out.push('\n');
}

fn render_action_plan(out: &mut String, results: &[AnalysisResult]) {
    let pick = |level: Priority| {
        results.iter()
            .filter(|r| r.priority_analysis.priority() == level)
            .collect::<Vec<_>>()
    };
    let critical = pick(Priority::Critical);
    let high = pick(Priority::High);
    if critical.is_empty() && high.is_empty() {
        return;
    }

    out.push_str("## Recommended Action Plan\n\n");
    for (title, files) in [("Immediate (CRITICAL)", critical), ("Short-term (HIGH)", high)] {
        if files.is_empty() {
            continue;
        }
        out.push_str(&format!("### {title}\n\n"));
        for r in files {
            match r.priority_analysis.0.get("recommended_first_step") {
                Some(step) => out.push_str(&format!("- `{}`: {}\n", r.file_path, value_text(step))),
                None => out.push_str(&format!("- `{}`\n", r.file_path)),
            }
        }
        out.push('\n');
    }
}

fn heading(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

/// Table cells cannot carry pipes or line breaks.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
