use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::filters::DEFAULT_EXCLUDE_PATTERNS;
use crate::types::Weights;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// All settings that can be placed in a .hotspot-health.yml config file.
/// Every field is optional; omitted fields fall back to built-in defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotspotConfig {
    // Reasoning service
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,

    // History mining
    pub recent_days: Option<u32>,
    pub hotspot_threshold: Option<usize>,
    pub max_files: Option<usize>,
    pub coupling_commit_limit: Option<usize>,
    pub max_files_per_commit: Option<usize>,
    pub exclude_patterns: Option<Vec<String>>,

    // Locations
    pub prompts_dir: Option<String>,
    pub results_dir: Option<String>,

    pub weights: Option<ConfigWeights>,
}

/// Optional multipliers for the hotspot rank score.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWeights {
    pub recent_changes: Option<u64>,
    pub change_frequency: Option<u64>,
}

/// Fully resolved configuration handed to every pipeline component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
    /// `None` waits for the service as long as it takes.
    pub request_timeout_secs: Option<u64>,
    pub recent_days: u32,
    pub hotspot_threshold: usize,
    pub max_files: usize,
    pub coupling_commit_limit: usize,
    pub max_files_per_commit: usize,
    pub exclude_patterns: Vec<String>,
    /// Explicit template directory; `None` uses the user config dir or the
    /// templates compiled into the binary.
    pub prompts_dir: Option<PathBuf>,
    pub results_dir: PathBuf,
    pub weights: Weights,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            api_base_url: "https://api.anthropic.com".to_string(),
            request_timeout_secs: None,
            recent_days: 90,
            hotspot_threshold: 5,
            max_files: 10,
            coupling_commit_limit: 100,
            max_files_per_commit: 50,
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            prompts_dir: None,
            results_dir: PathBuf::from("results"),
            weights: Weights::default(),
        }
    }
}

impl Settings {
    /// Overlays every field set in `cfg` onto these settings.
    pub fn apply(mut self, cfg: &HotspotConfig) -> Self {
        if let Some(v) = &cfg.model { self.model = v.clone(); }
        if let Some(v) = cfg.max_tokens { self.max_tokens = v; }
        if let Some(v) = &cfg.api_base_url { self.api_base_url = v.clone(); }
        if let Some(v) = cfg.request_timeout_secs { self.request_timeout_secs = Some(v); }
        if let Some(v) = cfg.recent_days { self.recent_days = v; }
        if let Some(v) = cfg.hotspot_threshold { self.hotspot_threshold = v; }
        if let Some(v) = cfg.max_files { self.max_files = v; }
        if let Some(v) = cfg.coupling_commit_limit { self.coupling_commit_limit = v; }
        if let Some(v) = cfg.max_files_per_commit { self.max_files_per_commit = v; }
        if let Some(v) = &cfg.exclude_patterns { self.exclude_patterns = v.clone(); }
        if let Some(v) = &cfg.prompts_dir { self.prompts_dir = Some(PathBuf::from(v)); }
        if let Some(v) = &cfg.results_dir { self.results_dir = PathBuf::from(v); }
        if let Some(w) = &cfg.weights {
            if let Some(v) = w.recent_changes { self.weights.recent_changes = v; }
            if let Some(v) = w.change_frequency { self.weights.change_frequency = v; }
        }
        self
    }
}

impl HotspotConfig {
    /// Validates semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<(), String> {
        let positive: &[(&str, Option<usize>)] = &[
            ("max_files", self.max_files),
            ("coupling_commit_limit", self.coupling_commit_limit),
            ("max_files_per_commit", self.max_files_per_commit),
        ];
        for (name, val) in positive {
            if let Some(0) = val {
                return Err(format!("Invalid '{name}' value: 0. Must be 1 or greater"));
            }
        }

        if let Some(0) = self.request_timeout_secs {
            return Err("Invalid 'request_timeout_secs' value: 0. Omit it to wait without a limit".to_string());
        }

        if let Some(0) = self.max_tokens {
            return Err("Invalid 'max_tokens' value: 0. Must be 1 or greater".to_string());
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("Invalid 'model' value: must not be empty".to_string());
            }
        }

        if let Some(url) = &self.api_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!(
                    "Invalid 'api_base_url' value: \"{url}\". Must start with http:// or https://"
                ));
            }
        }

        // One weight may be zero; both zero ranks every file equally.
        if let Some(w) = &self.weights {
            if w.recent_changes == Some(0) && w.change_frequency == Some(0) {
                return Err("Invalid weights: 'weights.recent_changes' and \
                     'weights.change_frequency' cannot both be 0"
                    .to_string());
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<HotspotConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {e}", path.display()))?;
    let cfg: HotspotConfig = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid config file '{}': {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| format!("Config file '{}': {e}", path.display()))?;
    Ok(cfg)
}

/// Reads the reasoning-service credential, after loading `.env` from the
/// working directory when present.
pub fn api_key() -> Result<String, String> {
    let _ = dotenvy::dotenv();
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(format!(
            "{API_KEY_VAR} environment variable is required. \
             Set it with: export {API_KEY_VAR}='your-key'"
        )),
    }
}

/// Annotated YAML template, printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# hotspot-health configuration file
# Generated by: hotspot-health --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
# Save this file as .hotspot-health.yml, then run:
#
#   hotspot-health --config .hotspot-health.yml [path]

# ── Reasoning service ──────────────────────────────────────────────────────────

# Model identifier sent with every request.
# model: "claude-sonnet-4-20250514"

# Upper bound on the size of each response.
# max_tokens: 4096

# Base URL of the messages API.
# api_base_url: "https://api.anthropic.com"

# Seconds to wait for each response. Unset means no limit.
# request_timeout_secs: 300

# ── History mining ─────────────────────────────────────────────────────────────

# Commits within this many days count as "recent".
# recent_days: 90

# Minimum total commits for a file to be considered a hotspot.
# hotspot_threshold: 5

# Number of top hotspots sent for health analysis.
# max_files: 10

# Newest commits sampled when looking for co-changed files.
# coupling_commit_limit: 100

# Commits touching more files than this are ignored for coupling.
# max_files_per_commit: 50

# Paths containing any of these fragments are ignored ('*' is stripped).
# exclude_patterns:
#   - "*.pyc"
#   - "__pycache__"
#   - "node_modules"
#   - "*.min.js"

# ── Locations ──────────────────────────────────────────────────────────────────

# Directory holding code_health_score.md and hotspot_priority.md.
# Unset: <config_dir>/hotspot-health/prompts if present, else the built-in prompts.
# prompts_dir: "prompts"

# Parent directory for timestamped result folders.
# results_dir: "results"

# ── Ranking weights ────────────────────────────────────────────────────────────
# score = recent_changes * weights.recent_changes
#       + change_frequency * weights.change_frequency

# weights:
#   recent_changes:   2
#   change_frequency: 1
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| format!("Cannot write config template to '{}': {e}", path.display())),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid_yaml() {
        let result: Result<HotspotConfig, _> = serde_yaml::from_str(TEMPLATE);
        assert!(
            result.is_ok(),
            "TEMPLATE must parse as valid HotspotConfig: {:?}",
            result.err()
        );
        let cfg = result.unwrap();
        // everything is commented out in the template
        assert!(cfg.model.is_none());
        assert!(cfg.max_files.is_none());
        assert!(cfg.weights.is_none());
    }

    #[test]
    fn test_empty_config_keeps_defaults() {
        let cfg: HotspotConfig = serde_yaml::from_str("{}").expect("empty map should parse");
        let settings = Settings::default().apply(&cfg);
        assert_eq!(settings.recent_days, 90);
        assert_eq!(settings.hotspot_threshold, 5);
        assert_eq!(settings.max_files, 10);
        assert_eq!(settings.coupling_commit_limit, 100);
        assert_eq!(settings.weights, Weights::default());
        assert!(settings.exclude_patterns.contains(&"node_modules".to_string()));
    }

    #[test]
    fn test_fields_override_defaults() {
        let yaml = "model: claude-x\nrecent_days: 30\nexclude_patterns:\n  - vendor\n\
                    weights:\n  recent_changes: 3\n";
        let cfg: HotspotConfig = serde_yaml::from_str(yaml).expect("should parse");
        let settings = Settings::default().apply(&cfg);
        assert_eq!(settings.model, "claude-x");
        assert_eq!(settings.recent_days, 30);
        assert_eq!(settings.exclude_patterns, vec!["vendor"]);
        assert_eq!(settings.weights.recent_changes, 3);
        assert_eq!(settings.weights.change_frequency, 1, "unset weight keeps default");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<HotspotConfig, _> = serde_yaml::from_str("unknown_setting: true\n");
        assert!(result.is_err(), "Unknown fields should be rejected by deny_unknown_fields");
    }

    #[test]
    fn test_validate_zero_limits_rejected() {
        for field in ["max_files", "coupling_commit_limit", "max_files_per_commit", "max_tokens"] {
            let cfg: HotspotConfig =
                serde_yaml::from_str(&format!("{field}: 0\n")).expect("should parse");
            let msg = cfg.validate().expect_err("zero must be rejected");
            assert!(msg.contains(field), "Error for '{field}' should name the field: {msg}");
        }
    }

    #[test]
    fn test_validate_both_weights_zero_rejected() {
        let yaml = "weights:\n  recent_changes: 0\n  change_frequency: 0\n";
        let cfg: HotspotConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.validate().is_err());

        let yaml = "weights:\n  recent_changes: 0\n";
        let cfg: HotspotConfig = serde_yaml::from_str(yaml).expect("should parse");
        assert!(cfg.validate().is_ok(), "a single zero weight is allowed");
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let cfg: HotspotConfig =
            serde_yaml::from_str("api_base_url: api.anthropic.com\n").expect("should parse");
        let msg = cfg.validate().unwrap_err();
        assert!(msg.contains("api_base_url"), "{msg}");
    }

    #[test]
    fn test_load_example_file() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let example_path = manifest_dir.join(".hotspot-health.example.yml");

        let cfg = load_config(&example_path).unwrap_or_else(|e| {
            panic!("Example config file should parse and validate successfully: {e}")
        });
        assert_eq!(cfg.recent_days, Some(60));
        assert_eq!(cfg.hotspot_threshold, Some(5));
        assert_eq!(cfg.max_files, Some(15));
        let patterns = cfg.exclude_patterns.as_ref().expect("exclude_patterns set");
        assert!(patterns.contains(&"migrations/".to_string()));
        let w = cfg.weights.as_ref().expect("weights set");
        assert_eq!(w.recent_changes, Some(2));

        let settings = Settings::default().apply(&cfg);
        assert_eq!(settings.results_dir, PathBuf::from("results"));
        assert_eq!(settings.prompts_dir, None, "example leaves the built-in prompts in use");
        assert_eq!(settings.request_timeout_secs, None);
    }

    #[test]
    fn test_request_timeout_defaults_to_no_limit() {
        assert_eq!(Settings::default().request_timeout_secs, None);
        let cfg: HotspotConfig = serde_yaml::from_str("request_timeout_secs: 300\n").expect("should parse");
        assert_eq!(Settings::default().apply(&cfg).request_timeout_secs, Some(300));

        let cfg: HotspotConfig = serde_yaml::from_str("request_timeout_secs: 0\n").expect("should parse");
        let msg = cfg.validate().unwrap_err();
        assert!(msg.contains("request_timeout_secs"), "{msg}");
    }

    #[test]
    fn test_prompts_dir_is_explicit_only_when_set() {
        assert_eq!(Settings::default().prompts_dir, None);
        let cfg: HotspotConfig = serde_yaml::from_str("prompts_dir: my-prompts\n").expect("should parse");
        assert_eq!(Settings::default().apply(&cfg).prompts_dir, Some(PathBuf::from("my-prompts")));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_config(Path::new("/nonexistent/.hotspot-health.yml")).unwrap_err();
        assert!(err.contains("/nonexistent/.hotspot-health.yml"), "{err}");
    }
}
