use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::path::Path;
use tracing::{info, warn};

use crate::analyzers::coupling::{analyze_coupling, CouplingMap};
use crate::config::Settings;
use crate::filters::filter_files;
use crate::git::{is_repository, queries, GitRunner};
use crate::types::{FileActivityRecord, FileFailure, SkippedFile};

/// Records for every file that could be measured, plus the files that could not.
#[derive(Debug, Default)]
pub struct MetricsExtraction {
    pub records: Vec<FileActivityRecord>,
    pub skipped: Vec<SkippedFile>,
}

/// Derives a [`FileActivityRecord`] per tracked source file, one independent
/// history query per metric.
pub struct MetricsEngine<'a> {
    git: &'a dyn GitRunner,
    settings: &'a Settings,
    now: DateTime<Utc>,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(git: &'a dyn GitRunner, settings: &'a Settings) -> Self {
        MetricsEngine { git, settings, now: Utc::now() }
    }

    /// Pins the clock used for the recency window and file age.
    #[cfg(test)]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Fails only when the repository itself is unusable. A file whose
    /// history cannot be read is skipped and reported, never fatal.
    pub fn extract(&self, repo: &Path) -> Result<MetricsExtraction, String> {
        if !is_repository(repo) {
            return Err(format!("Not a git repository: {}", repo.display()));
        }

        let tracked = queries::list_tracked_files(self.git, repo)
            .map_err(|e| format!("Cannot list tracked files in {}: {e}", repo.display()))?;
        let files = filter_files(&tracked, &self.settings.exclude_patterns);
        info!(tracked = tracked.len(), supported = files.len(), "listing tracked files");

        let coupling = analyze_coupling(
            self.git,
            repo,
            self.settings.coupling_commit_limit,
            self.settings.max_files_per_commit,
        );
        let since = queries::since_date(self.now, self.settings.recent_days);

        let mut extraction = MetricsExtraction::default();
        let total = files.len();
        for (i, file) in files.iter().enumerate() {
            info!(file = %file, "extracting metrics {}/{total}", i + 1);
            match self.extract_file(repo, file, &coupling, &since) {
                Ok(record) => extraction.records.push(record),
                Err(e) => {
                    warn!(file = %file, error = %e, "skipping file");
                    extraction.skipped.push(SkippedFile {
                        file_path: file.clone(),
                        reason: FileFailure::History { message: e },
                    });
                }
            }
        }
        Ok(extraction)
    }

    fn extract_file(
        &self,
        repo: &Path,
        file: &str,
        coupling: &CouplingMap,
        since: &str,
    ) -> Result<FileActivityRecord, String> {
        // The total count is the one query a record cannot exist without.
        let change_frequency = queries::commit_count(self.git, repo, file)?;

        let recent_changes = or_default(
            file,
            "recent commit count",
            queries::commit_count_since(self.git, repo, file, since),
        )
        .min(change_frequency);
        let authors = or_default(file, "authors", queries::authors(self.git, repo, file));
        let (lines_added, lines_deleted) =
            or_default(file, "churn", queries::churn(self.git, repo, file));
        let (last_modified, age_days) = or_default(
            file,
            "last modified",
            queries::last_modified(self.git, repo, file, self.now),
        );

        let coupling = coupling
            .get(file)
            .map(|partners| partners.iter().filter(|p| p.as_str() != file).cloned().collect())
            .unwrap_or_default();

        Ok(FileActivityRecord {
            file_path: file.to_string(),
            change_frequency,
            recent_changes,
            unique_authors: authors.len(),
            code_churn: lines_added + lines_deleted,
            lines_added,
            lines_deleted,
            coupling,
            last_modified,
            age_days,
            authors,
        })
    }
}

fn or_default<T: Default, E: Display>(file: &str, metric: &str, result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        warn!(file = %file, metric, error = %e, "history query failed, defaulting");
        T::default()
    })
}
