use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use super::runner::GitRunner;

// "<added>\t<deleted>\t<path>"; binary files report "-"
static NUMSTAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+|-)\s+(\d+|-)(?:\s|$)").unwrap());

pub fn list_tracked_files(git: &dyn GitRunner, repo: &Path) -> Result<Vec<String>, String> {
    let output = git.run(repo, &["ls-files"])?;
    Ok(non_empty_lines(&output))
}

pub fn commit_count(git: &dyn GitRunner, repo: &Path, file: &str) -> Result<usize, String> {
    let output = git.run(repo, &["rev-list", "--count", "HEAD", "--", file])?;
    parse_count(&output)
}

/// Commits touching `file` on or after `since` (a `YYYY-MM-DD` date).
pub fn commit_count_since(
    git: &dyn GitRunner,
    repo: &Path,
    file: &str,
    since: &str,
) -> Result<usize, String> {
    let since_arg = format!("--since={since}");
    let output = git.run(repo, &["rev-list", "--count", &since_arg, "HEAD", "--", file])?;
    parse_count(&output)
}

/// Distinct author names, in order of first appearance (newest commit first).
pub fn authors(git: &dyn GitRunner, repo: &Path, file: &str) -> Result<Vec<String>, String> {
    let output = git.run(repo, &["log", "--format=%an", "--", file])?;
    Ok(distinct_lines(&output))
}

/// Total (added, deleted) lines across the file's whole history.
pub fn churn(git: &dyn GitRunner, repo: &Path, file: &str) -> Result<(usize, usize), String> {
    let output = git.run(repo, &["log", "--numstat", "--format=", "--", file])?;
    Ok(parse_numstat(&output))
}

/// Date (`YYYY-MM-DD`) of the newest commit touching `file` and its age in days.
pub fn last_modified(
    git: &dyn GitRunner,
    repo: &Path,
    file: &str,
    now: DateTime<Utc>,
) -> Result<(String, i64), String> {
    let output = git.run(repo, &["log", "-1", "--format=%aI", "--", file])?;
    parse_last_modified(&output, now)
}

/// Hashes of the `limit` most recent commits, newest first.
pub fn recent_commits(git: &dyn GitRunner, repo: &Path, limit: usize) -> Result<Vec<String>, String> {
    let limit_arg = format!("-{limit}");
    let output = git.run(repo, &["log", &limit_arg, "--format=%H"])?;
    Ok(non_empty_lines(&output))
}

pub fn changed_files(git: &dyn GitRunner, repo: &Path, hash: &str) -> Result<Vec<String>, String> {
    let output = git.run(repo, &["show", "--name-only", "--format=", hash])?;
    Ok(distinct_lines(&output))
}

/// `now - days`, formatted for `--since`.
pub fn since_date(now: DateTime<Utc>, days: u32) -> String {
    (now - Duration::days(i64::from(days))).format("%Y-%m-%d").to_string()
}

// ─── Parsers ──────────────────────────────────────────────────────────────────

fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn distinct_lines(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    non_empty_lines(output)
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect()
}

fn parse_count(output: &str) -> Result<usize, String> {
    let t = output.trim();
    if t.is_empty() {
        return Ok(0);
    }
    t.parse()
        .map_err(|e| format!("Unexpected commit count '{t}': {e}"))
}

fn parse_numstat(output: &str) -> (usize, usize) {
    output
        .lines()
        .filter_map(|line| NUMSTAT_RE.captures(line.trim()))
        .fold((0, 0), |(added, deleted), caps| {
            let a = caps[1].parse().unwrap_or(0);
            let d = caps[2].parse().unwrap_or(0);
            (added + a, deleted + d)
        })
}

fn parse_last_modified(output: &str, now: DateTime<Utc>) -> Result<(String, i64), String> {
    let t = output.trim();
    if t.is_empty() {
        return Ok((String::new(), 0));
    }
    let date = DateTime::parse_from_rfc3339(t)
        .map_err(|e| format!("Unexpected commit date '{t}': {e}"))?;
    let age_days = (now - date.with_timezone(&Utc)).num_days().max(0);
    Ok((date.format("%Y-%m-%d").to_string(), age_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42\n"), Ok(42));
        assert_eq!(parse_count(""), Ok(0), "empty output means no commits");
        assert!(parse_count("fatal").is_err());
    }

    #[test]
    fn test_numstat_sums_and_treats_binary_as_zero() {
        let out = "10\t2\tsrc/app.py\n-\t-\tlogo.png\n3\t0\tsrc/app.py\nnot a stat line\n\n";
        assert_eq!(parse_numstat(out), (13, 2));
    }

    #[test]
    fn test_authors_are_distinct_in_first_seen_order() {
        let out = "alice\nbob\nalice\n\ncarol\nbob\n";
        assert_eq!(distinct_lines(out), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_last_modified_date_and_age() {
        let (date, age) = parse_last_modified("2024-05-22T09:30:00+02:00\n", now()).unwrap();
        assert_eq!(date, "2024-05-22");
        assert_eq!(age, 10);
    }

    #[test]
    fn test_last_modified_empty_history() {
        assert_eq!(parse_last_modified("  \n", now()), Ok((String::new(), 0)));
        assert!(parse_last_modified("yesterday", now()).is_err());
    }

    #[test]
    fn test_since_date() {
        assert_eq!(since_date(now(), 90), "2024-03-03");
        assert_eq!(since_date(now(), 0), "2024-06-01");
    }

    #[test]
    fn test_commit_count_since_passes_date_flag() {
        let git = |_: &Path, args: &[&str]| -> Result<String, String> {
            assert!(args.contains(&"--since=2024-03-03"), "args: {args:?}");
            assert_eq!(args.last(), Some(&"a.py"));
            Ok("7\n".to_string())
        };
        let count = commit_count_since(&git, Path::new("."), "a.py", "2024-03-03").unwrap();
        assert_eq!(count, 7);
    }
}
