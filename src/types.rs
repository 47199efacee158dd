use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

// ─── Git Activity ─────────────────────────────────────────────────────────────

/// Change-history metrics for one tracked file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileActivityRecord {
    pub file_path: String,
    pub change_frequency: usize,
    pub recent_changes: usize,
    pub unique_authors: usize,
    pub code_churn: usize,
    pub lines_added: usize,
    pub lines_deleted: usize,
    /// Up to five co-changed partners, strongest first.
    pub coupling: Vec<String>,
    /// `YYYY-MM-DD` of the most recent commit, empty when unknown.
    pub last_modified: String,
    pub age_days: i64,
    pub authors: Vec<String>,
}

#[cfg(test)]
impl FileActivityRecord {
    /// A record with every counter at zero.
    pub fn empty(file_path: impl Into<String>) -> Self {
        FileActivityRecord {
            file_path: file_path.into(),
            change_frequency: 0,
            recent_changes: 0,
            unique_authors: 0,
            code_churn: 0,
            lines_added: 0,
            lines_deleted: 0,
            coupling: Vec::new(),
            last_modified: String::new(),
            age_days: 0,
            authors: Vec::new(),
        }
    }
}

// ─── Ranking ──────────────────────────────────────────────────────────────────

/// Multipliers applied to the two activity counters when ranking hotspots.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub recent_changes: u64,
    pub change_frequency: u64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            recent_changes:   2,
            change_frequency: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotCandidate {
    pub score: u64,
    pub record: FileActivityRecord,
}

// ─── Priority ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Priority {
    pub const LEVELS: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Sort key used when ordering the final report.
    pub fn ordinal(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High     => 3,
            Priority::Medium   => 2,
            Priority::Low      => 1,
            Priority::Unknown  => 0,
        }
    }

    pub fn from_label(label: &str) -> Priority {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Priority::Critical,
            "HIGH"     => Priority::High,
            "MEDIUM"   => Priority::Medium,
            "LOW"      => Priority::Low,
            _          => Priority::Unknown,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "CRITICAL"),
            Priority::High     => write!(f, "HIGH"),
            Priority::Medium   => write!(f, "MEDIUM"),
            Priority::Low      => write!(f, "LOW"),
            Priority::Unknown  => write!(f, "UNKNOWN"),
        }
    }
}

// ─── Analysis Outputs ─────────────────────────────────────────────────────────
//
// Both analyses are whatever JSON object the reasoning service produced. The
// accessors below apply defaults only for the fields the pipeline reads.

/// One entry from a health analysis `factors` category.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthIssue {
    pub category: String,
    pub issue: String,
    pub location: String,
    pub severity: String,
}

/// One entry from a health analysis `recommendations` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub priority: Option<String>,
    pub action: String,
    pub impact: Option<String>,
}

impl Recommendation {
    pub fn label(&self) -> String {
        match &self.priority {
            Some(p) => format!("[P{p}] {}", self.action),
            None => self.action.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HealthAnalysis(pub Map<String, Value>);

impl HealthAnalysis {
    pub fn health_score(&self) -> Option<f64> {
        number_field(&self.0, "health_score")
    }

    pub fn summary(&self) -> Option<&str> {
        self.0.get("summary").and_then(Value::as_str)
    }

    /// Set when the service reply could not be decoded.
    pub fn parse_error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Flattens `factors: { category: [ {issue, location, severity}, .. ] }`.
    pub fn issues(&self) -> Vec<HealthIssue> {
        let Some(factors) = self.0.get("factors").and_then(Value::as_object) else {
            return Vec::new();
        };
        factors
            .iter()
            .filter_map(|(category, items)| Some((category, items.as_array()?)))
            .flat_map(|(category, items)| {
                items.iter().filter_map(Value::as_object).map(move |item| HealthIssue {
                    category: category.clone(),
                    issue:    text_field(item, "issue"),
                    location: text_field(item, "location"),
                    severity: text_field(item, "severity"),
                })
            })
            .collect()
    }

    /// `recommendations` entries; a bare string becomes an action alone.
    pub fn recommendation_items(&self) -> Vec<Recommendation> {
        let Some(items) = self.0.get("recommendations").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .map(|rec| match rec {
                Value::Object(obj) => Recommendation {
                    priority: obj.get("priority").map(value_text),
                    action:   text_field(obj, "action"),
                    impact:   obj.get("impact").map(value_text),
                },
                other => Recommendation { priority: None, action: value_text(other), impact: None },
            })
            .collect()
    }

    /// Recommendations as display lines, `[P<n>] action` when prioritized.
    pub fn recommendations(&self) -> Vec<String> {
        self.recommendation_items().iter().map(Recommendation::label).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriorityAnalysis(pub Map<String, Value>);

impl PriorityAnalysis {
    /// An absent priority counts as LOW. An explicit null, a non-string or
    /// an unrecognized label is `Unknown`.
    pub fn priority(&self) -> Priority {
        match self.0.get("priority") {
            None => Priority::Low,
            Some(Value::String(label)) => Priority::from_label(label),
            Some(_) => Priority::Unknown,
        }
    }

    /// Reasoning may be plain text or an object of named impacts.
    pub fn reasoning(&self) -> Option<String> {
        match self.0.get("reasoning")? {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => Some(
                obj.iter()
                    .map(|(k, v)| format!("{}: {}", k.replace('_', " "), value_text(v)))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).map(value_text).unwrap_or_default()
}

/// Display text for a JSON value: strings unquoted, arrays comma-joined.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub git_metrics: FileActivityRecord,
    pub health_analysis: HealthAnalysis,
    pub priority_analysis: PriorityAnalysis,
}

// ─── Per-file Failures ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Health,
    Priority,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Health   => write!(f, "health"),
            Phase::Priority => write!(f, "priority"),
        }
    }
}

/// Why a file produced no result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileFailure {
    History { message: String },
    NotFound,
    Unreadable { message: String },
    UnsupportedFileType { extension: String },
    EmptyFile,
    Service { phase: Phase, message: String },
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFailure::History { message }   => write!(f, "history query failed: {message}"),
            FileFailure::NotFound              => write!(f, "file not found"),
            FileFailure::Unreadable { message } => write!(f, "file unreadable: {message}"),
            FileFailure::UnsupportedFileType { extension } => {
                write!(f, "unsupported file type: {extension}")
            }
            FileFailure::EmptyFile => write!(f, "file is empty"),
            FileFailure::Service { phase, message } => {
                write!(f, "{phase} request failed: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub file_path: String,
    pub reason: FileFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Analyzed(Box<AnalysisResult>),
    Skipped(SkippedFile),
}

// ─── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub repo_name: String,
    pub repo_path: String,
    pub analyzed_at: String,
    pub file_count: usize,
    pub hotspot_count: usize,
    pub analyzed_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrioritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl PrioritySummary {
    pub fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::High     => self.high,
            Priority::Medium   => self.medium,
            Priority::Low      => self.low,
            Priority::Unknown  => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub summary: PrioritySummary,
    pub results: Vec<AnalysisResult>,
    pub skipped: Vec<SkippedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_missing_priority_defaults_to_low() {
        let analysis = PriorityAnalysis(object(json!({"reasoning": "fine"})));
        assert_eq!(analysis.priority(), Priority::Low);
    }

    #[test]
    fn test_null_priority_is_unknown_not_low() {
        let analysis = PriorityAnalysis(object(json!({"priority": null})));
        assert_eq!(analysis.priority(), Priority::Unknown, "only a missing key defaults to LOW");
    }

    #[test]
    fn test_recommendation_items_keep_impact() {
        let health = HealthAnalysis(object(json!({
            "recommendations": [{"priority": 2, "action": "extract helper", "impact": "less duplication"}]
        })));
        let items = health.recommendation_items();
        assert_eq!(items[0].priority.as_deref(), Some("2"));
        assert_eq!(items[0].impact.as_deref(), Some("less duplication"));
        assert_eq!(items[0].label(), "[P2] extract helper");
    }

    #[test]
    fn test_unrecognized_priority_is_unknown() {
        let analysis = PriorityAnalysis(object(json!({"priority": "URGENT"})));
        assert_eq!(analysis.priority(), Priority::Unknown);
        assert_eq!(analysis.priority().ordinal(), 0);
    }

    #[test]
    fn test_priority_label_is_case_insensitive() {
        assert_eq!(Priority::from_label(" high "), Priority::High);
        assert_eq!(Priority::from_label("Critical"), Priority::Critical);
    }

    #[test]
    fn test_health_score_accepts_numeric_string() {
        let health = HealthAnalysis(object(json!({"health_score": "6.5"})));
        assert_eq!(health.health_score(), Some(6.5));
        let missing = HealthAnalysis(Map::new());
        assert_eq!(missing.health_score(), None, "absent score must not be invented");
    }

    #[test]
    fn test_issues_flatten_factor_categories() {
        let health = HealthAnalysis(object(json!({
            "factors": {
                "complexity": [{"issue": "deep nesting", "location": "L10", "severity": "high"}],
                "naming": [{"issue": "vague names"}, "not an object"],
                "notes": "ignored"
            }
        })));
        let issues = health.issues();
        assert_eq!(issues.len(), 2, "only object entries inside lists count: {issues:?}");
        assert!(issues.iter().any(|i| i.category == "complexity" && i.location == "L10"));
        assert!(issues.iter().any(|i| i.category == "naming" && i.severity.is_empty()));
    }

    #[test]
    fn test_recommendations_render_priority_prefix() {
        let health = HealthAnalysis(object(json!({
            "recommendations": [{"action": "split module", "priority": 1}, "add tests"]
        })));
        assert_eq!(health.recommendations(), vec!["[P1] split module", "add tests"]);
    }

    #[test]
    fn test_reasoning_object_is_flattened() {
        let analysis = PriorityAnalysis(object(json!({
            "reasoning": {"health_score_impact": "low score"}
        })));
        assert_eq!(analysis.reasoning().as_deref(), Some("health score impact: low score"));
    }

    #[test]
    fn test_failure_messages() {
        let f = FileFailure::UnsupportedFileType { extension: ".rb".to_string() };
        assert_eq!(f.to_string(), "unsupported file type: .rb");
        let f = FileFailure::Service { phase: Phase::Priority, message: "timeout".to_string() };
        assert_eq!(f.to_string(), "priority request failed: timeout");
    }
}
