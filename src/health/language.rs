use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

static EXTENSION_TO_LANGUAGE: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| HashMap::from([
    ("py",  "python"),
    ("sql", "sql"),
    ("js",  "javascript"),
    ("jsx", "javascript"),
    ("ts",  "typescript"),
    ("tsx", "typescript"),
    ("tf",  "terraform"),
    ("hcl", "hcl"),
]));

/// Language name for the file's extension, or `None` when unsupported.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    EXTENSION_TO_LANGUAGE.get(ext.as_str()).copied()
}

/// The extension as shown in an "unsupported file type" message.
pub fn display_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| "(none)".to_string())
}
