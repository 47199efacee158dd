use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Source-text extensions the health analysis knows how to read.
static SUPPORTED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from([
    "py", "sql", "js", "ts", "tsx", "jsx", "tf", "hcl",
]));

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "*.pyc", "__pycache__", ".git", "node_modules",
    "*.min.js", "*.min.css", "package-lock.json", "yarn.lock",
];

pub fn is_supported(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Keeps supported source files and drops any path containing an exclude
/// fragment. Patterns are not globs: `*` is removed and the rest is matched
/// as a plain substring.
pub fn filter_files(files: &[String], exclude_patterns: &[String]) -> Vec<String> {
    let fragments: Vec<String> = exclude_patterns
        .iter()
        .map(|p| p.replace('*', ""))
        .filter(|p| !p.is_empty())
        .collect();

    files.iter()
        .filter(|f| is_supported(f))
        .filter(|f| !fragments.iter().any(|frag| f.contains(frag.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn defaults() -> Vec<String> {
        to_strings(DEFAULT_EXCLUDE_PATTERNS)
    }

    #[test]
    fn test_keeps_only_supported_extensions() {
        let files = to_strings(&["app.py", "main.rs", "infra/main.tf", "README.md", "ui/App.TSX"]);
        let filtered = filter_files(&files, &[]);
        assert_eq!(filtered, to_strings(&["app.py", "infra/main.tf", "ui/App.TSX"]));
    }

    #[test]
    fn test_exclude_patterns_degrade_to_substrings() {
        let files = to_strings(&[
            "web/app.min.js",
            "web/app.js",
            "node_modules/lodash/index.js",
            "pkg/__pycache__/mod.py",
        ]);
        let filtered = filter_files(&files, &defaults());
        assert_eq!(filtered, to_strings(&["web/app.js"]), "got {filtered:?}");
    }

    #[test]
    fn test_bare_wildcard_pattern_is_ignored() {
        let files = to_strings(&["a.py", "b.sql"]);
        let filtered = filter_files(&files, &to_strings(&["*"]));
        assert_eq!(filtered.len(), 2, "'*' degrades to an empty fragment and must not exclude everything");
    }

    #[test]
    fn test_file_without_extension_is_unsupported() {
        assert!(!is_supported("Makefile"));
        assert!(!is_supported("scripts/.py"), "dotfile has no extension");
        assert!(is_supported("db/schema.SQL"));
    }
}
