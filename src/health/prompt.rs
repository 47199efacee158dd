use aho_corasick::{AhoCorasick, MatchKind};
use std::path::{Path, PathBuf};

pub const HEALTH_TEMPLATE: &str = "code_health_score";
pub const PRIORITY_TEMPLATE: &str = "hotspot_priority";

pub const LANGUAGE: &str = "{language}";
pub const CODE_CONTENT: &str = "{code_content}";
pub const HEALTH_ANALYSIS: &str = "{health_analysis}";
pub const GIT_METRICS: &str = "{git_metrics}";

const BUILTIN_HEALTH: &str = include_str!("../../prompts/code_health_score.md");
const BUILTIN_PRIORITY: &str = include_str!("../../prompts/hotspot_priority.md");

/// Characters of source text sent with the priority request.
pub const PRIORITY_CODE_CHARS: usize = 10_000;

/// The two raw prompt templates, placeholders intact.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub health: String,
    pub priority: String,
}

impl PromptTemplates {
    /// Loads `<dir>/code_health_score.md` and `<dir>/hotspot_priority.md`.
    /// A missing template is a configuration error.
    pub fn load(dir: &Path) -> Result<Self, String> {
        Ok(PromptTemplates {
            health: read_template(dir, HEALTH_TEMPLATE)?,
            priority: read_template(dir, PRIORITY_TEMPLATE)?,
        })
    }

    /// The templates compiled into the binary.
    pub fn builtin() -> Self {
        PromptTemplates {
            health: BUILTIN_HEALTH.to_string(),
            priority: BUILTIN_PRIORITY.to_string(),
        }
    }

    /// An explicit directory must exist. Otherwise the per-user config
    /// directory (`<config_dir>/hotspot-health/prompts`) is used when present,
    /// then the built-in templates.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(dir) = explicit {
            if !dir.is_dir() {
                return Err(format!("Prompt directory not found: {}", dir.display()));
            }
            return Self::load(dir);
        }
        match user_prompts_dir() {
            Some(dir) if dir.is_dir() => Self::load(&dir),
            _ => Ok(Self::builtin()),
        }
    }
}

fn user_prompts_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hotspot-health").join("prompts"))
}

fn read_template(dir: &Path, name: &str) -> Result<String, String> {
    let path = dir.join(format!("{name}.md"));
    std::fs::read_to_string(&path)
        .map_err(|e| format!("Prompt not found: {} ({e})", path.display()))
}

/// Replaces every placeholder token in one left-to-right pass. Inserted
/// values are never rescanned, so file content that happens to contain a
/// token is passed through verbatim. Tokens appearing in the template text
/// itself are always replaced.
///
/// This intentionally departs from replacing tokens one after another, where
/// a `{language}` inside the inserted source would itself be rewritten and
/// the prompt would no longer show the file as written.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> Result<String, String> {
    let tokens: Vec<&str> = values.iter().map(|(token, _)| *token).collect();
    let replacements: Vec<&str> = values.iter().map(|(_, value)| *value).collect();
    let matcher = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build(&tokens)
        .map_err(|e| format!("Invalid placeholder set: {e}"))?;
    Ok(matcher.replace_all(template, &replacements))
}

/// The first `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
