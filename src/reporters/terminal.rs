use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};

use crate::types::{HotspotCandidate, Priority, Report};

const TOP_ISSUES: usize = 5;

pub fn report_terminal(report: &Report) {
    eprintln!();
    println!(
        "{} {} ({} tracked files, {} hotspots, {} analyzed)",
        "🔥 hotspot-health".red().bold(),
        report.meta.repo_name.cyan(),
        report.meta.file_count.to_string().bright_black(),
        report.meta.hotspot_count.to_string().bright_black(),
        report.meta.analyzed_count.to_string().bright_black(),
    );
    println!();

    // ── Priority breakdown ─────────────────────────────────────────────────
    println!("{}", "Priority breakdown:".bold());
    for level in Priority::LEVELS {
        println!("    {:<10} {}", priority_label(level), report.summary.count(level));
    }
    if report.summary.unknown > 0 {
        println!("    {:<10} {}", priority_label(Priority::Unknown), report.summary.unknown);
    }
    println!();

    if report.results.is_empty() {
        println!("{}", "  No files were analyzed.".yellow());
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["RANK", "FILE", "PRIORITY", "HEALTH", "COMMITS", "RECENT", "AUTHORS"]);

        for (i, r) in report.results.iter().enumerate() {
            let m = &r.git_metrics;
            table.add_row(vec![
                Cell::new(format!("{:3}", i + 1)),
                Cell::new(truncate_path(&r.file_path, 44)),
                priority_cell(r.priority_analysis.priority()),
                health_cell(r.health_analysis.health_score()),
                Cell::new(m.change_frequency.to_string()),
                Cell::new(m.recent_changes.to_string()),
                Cell::new(m.unique_authors.to_string()),
            ]);
        }
        println!("{table}");
    }

    // ── Top issues ─────────────────────────────────────────────────────────
    let top: Vec<_> = report.results.iter()
        .filter_map(|r| {
            let issue = r.health_analysis.issues().into_iter().next()?;
            Some((r.file_path.as_str(), issue))
        })
        .take(TOP_ISSUES)
        .collect();
    if !top.is_empty() {
        println!();
        println!("{}", "💡 Top issues:".cyan());
        for (file, issue) in &top {
            let severity = if issue.severity.is_empty() {
                String::new()
            } else {
                format!(" [{}]", issue.severity)
            };
            println!("    {} {}: {}{}", "•".white(), file.yellow(), issue.issue, severity.bright_black());
        }
    }

    // ── Next steps for urgent files ────────────────────────────────────────
    let urgent: Vec<_> = report.results.iter()
        .filter(|r| matches!(r.priority_analysis.priority(), Priority::Critical | Priority::High))
        .collect();
    if !urgent.is_empty() {
        println!();
        println!("{}", "🛠  Next steps:".cyan());
        for r in urgent {
            let first = r.health_analysis.recommendations().into_iter().next()
                .unwrap_or_else(|| "review manually".to_string());
            println!("    {} {}: {}", "•".white(), r.file_path.yellow(), first);
            if let Some(reasoning) = r.priority_analysis.reasoning() {
                println!("      {}", reasoning.bright_black());
            }
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!("{}", format!("⚠️  {} file(s) skipped:", report.skipped.len()).yellow());
        for s in &report.skipped {
            println!("    {} {}", s.file_path.cyan(), format!("({})", s.reason).bright_black());
        }
    }

    println!();
}

/// Ranked hotspots without any health analysis.
pub fn report_hotspots(candidates: &[HotspotCandidate]) {
    eprintln!();
    if candidates.is_empty() {
        println!("{}", "  No hotspots found with current threshold.".yellow());
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["RANK", "FILE", "SCORE", "COMMITS", "RECENT", "AUTHORS", "CHURN", "COUPLED"]);

    for (i, c) in candidates.iter().enumerate() {
        let r = &c.record;
        table.add_row(vec![
            Cell::new(format!("{:3}", i + 1)),
            Cell::new(truncate_path(&r.file_path, 44)),
            Cell::new(c.score.to_string()).add_attribute(Attribute::Bold),
            Cell::new(r.change_frequency.to_string()),
            Cell::new(r.recent_changes.to_string()),
            Cell::new(r.unique_authors.to_string()),
            Cell::new(r.code_churn.to_string()),
            Cell::new(r.coupling.len().to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
}

// ─── Cell builders ────────────────────────────────────────────────────────────

fn priority_cell(priority: Priority) -> Cell {
    let cell = Cell::new(priority_label(priority));
    match priority {
        Priority::Critical => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        Priority::High     => cell.fg(Color::Yellow),
        Priority::Medium   => cell,
        Priority::Low      => cell.fg(Color::Green),
        Priority::Unknown  => cell.fg(Color::DarkGrey),
    }
}

fn health_cell(score: Option<f64>) -> Cell {
    match score {
        None => Cell::new("N/A").fg(Color::DarkGrey),
        Some(s) => {
            let cell = Cell::new(format!("{s}/10"));
            if s < 4.0 {
                cell.fg(Color::Red)
            } else if s < 7.0 {
                cell.fg(Color::Yellow)
            } else {
                cell.fg(Color::Green)
            }
        }
    }
}

fn priority_label(priority: Priority) -> String {
    let marker = match priority {
        Priority::Critical => "🔴",
        Priority::High     => "🟠",
        Priority::Medium   => "🟡",
        Priority::Low      => "🟢",
        Priority::Unknown  => "⚪",
    };
    format!("{marker} {priority}")
}

fn truncate_path(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max { return s.to_string(); }
    let tail: String = s.chars().skip(count - (max - 1)).collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_path_keeps_tail() {
        assert_eq!(truncate_path("src/a.py", 44), "src/a.py");
        let long = format!("{}/file.py", "d".repeat(60));
        let out = truncate_path(&long, 20);
        assert_eq!(out.chars().count(), 20);
        assert!(out.starts_with('…') && out.ends_with("/file.py"));
    }

    #[test]
    fn test_priority_label_names_level() {
        assert!(priority_label(Priority::Critical).ends_with("CRITICAL"));
        assert!(priority_label(Priority::Unknown).ends_with("UNKNOWN"));
    }
}
