use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::client::Reasoner;
use super::language::{detect_language, display_extension};
use super::prompt::{self, PromptTemplates};
use super::response::parse_response;
use crate::types::*;

/// A candidate's source text, loaded once and shared by both phases.
struct SourceFile {
    path: PathBuf,
    language: &'static str,
    text: String,
}

/// Runs the health phase and then the priority phase for each hotspot, one
/// file at a time.
pub struct Orchestrator<'a> {
    repo: &'a Path,
    templates: &'a PromptTemplates,
    reasoner: &'a dyn Reasoner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(repo: &'a Path, templates: &'a PromptTemplates, reasoner: &'a dyn Reasoner) -> Self {
        Orchestrator { repo, templates, reasoner }
    }

    /// One outcome per candidate, in candidate order. A failing file is
    /// reported as skipped and the batch moves on.
    pub fn analyze_all(&self, candidates: &[HotspotCandidate]) -> Vec<FileOutcome> {
        let total = candidates.len();
        candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let file = &candidate.record.file_path;
                info!(file = %file, "analyzing hotspot {}/{total}", i + 1);
                match self.analyze_candidate(&candidate.record) {
                    Ok(result) => FileOutcome::Analyzed(Box::new(result)),
                    Err(reason) => {
                        warn!(file = %file, reason = %reason, "skipping hotspot");
                        FileOutcome::Skipped(SkippedFile { file_path: file.clone(), reason })
                    }
                }
            })
            .collect()
    }

    /// Health first, then priority; the priority request embeds the health
    /// result, so it is never sent when the health phase failed.
    pub fn analyze_candidate(&self, record: &FileActivityRecord) -> Result<AnalysisResult, FileFailure> {
        let source = self.load_source(&record.file_path)?;
        let health = self.analyze_health(&source)?;
        let priority = self.analyze_priority(&source, &health, record)?;
        Ok(AnalysisResult {
            file_path: record.file_path.clone(),
            git_metrics: record.clone(),
            health_analysis: health,
            priority_analysis: priority,
        })
    }

    fn load_source(&self, file: &str) -> Result<SourceFile, FileFailure> {
        let path = self.repo.join(file);
        if !path.is_file() {
            return Err(FileFailure::NotFound);
        }
        let language = detect_language(&path).ok_or_else(|| FileFailure::UnsupportedFileType {
            extension: display_extension(&path),
        })?;
        let text = std::fs::read_to_string(&path)
            .map_err(|e| FileFailure::Unreadable { message: e.to_string() })?;
        if text.trim().is_empty() {
            return Err(FileFailure::EmptyFile);
        }
        Ok(SourceFile { path, language, text })
    }

    fn analyze_health(&self, source: &SourceFile) -> Result<HealthAnalysis, FileFailure> {
        let request = prompt::substitute(
            &self.templates.health,
            &[(prompt::LANGUAGE, source.language), (prompt::CODE_CONTENT, source.text.as_str())],
        )
        .map_err(|message| FileFailure::Service { phase: Phase::Health, message })?;

        let reply = self
            .reasoner
            .complete(&request)
            .map_err(|message| FileFailure::Service { phase: Phase::Health, message })?;

        let mut analysis = parse_response(&reply);
        analysis.insert("file_path".into(), Value::from(source.path.display().to_string()));
        analysis.insert("language".into(), Value::from(source.language));
        analysis.insert("lines_of_code".into(), Value::from(source.text.lines().count()));
        Ok(HealthAnalysis(analysis))
    }

    fn analyze_priority(
        &self,
        source: &SourceFile,
        health: &HealthAnalysis,
        record: &FileActivityRecord,
    ) -> Result<PriorityAnalysis, FileFailure> {
        let failure = |message: String| FileFailure::Service { phase: Phase::Priority, message };

        let health_json = serde_json::to_string_pretty(health)
            .map_err(|e| failure(format!("cannot serialize health analysis: {e}")))?;
        let metrics_json = serde_json::to_string_pretty(record)
            .map_err(|e| failure(format!("cannot serialize git metrics: {e}")))?;
        let code = prompt::truncate_chars(&source.text, prompt::PRIORITY_CODE_CHARS);

        let request = prompt::substitute(
            &self.templates.priority,
            &[
                (prompt::HEALTH_ANALYSIS, health_json.as_str()),
                (prompt::GIT_METRICS, metrics_json.as_str()),
                (prompt::LANGUAGE, source.language),
                (prompt::CODE_CONTENT, code),
            ],
        )
        .map_err(failure)?;

        let reply = self.reasoner.complete(&request).map_err(failure)?;
        Ok(PriorityAnalysis(parse_response(&reply)))
    }
}

/// Orders results CRITICAL > HIGH > MEDIUM > LOW > unknown, keeping the
/// incoming order within a level.
pub fn sort_by_priority(results: &mut [AnalysisResult]) {
    results.sort_by_key(|r| std::cmp::Reverse(r.priority_analysis.priority().ordinal()));
}
