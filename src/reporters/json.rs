use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `value` as pretty JSON to a file if given, otherwise stdout.
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_file: Option<&Path>) -> Result<(), String> {
    if let Some(path) = output_file {
        let file = File::create(path)
            .map_err(|e| format!("Failed to open {} for writing: {e}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        writer
            .write_all(b"\n")
            .map_err(|e| format!("Failed to finalize {}: {e}", path.display()))?;
        writer
            .flush()
            .map_err(|e| format!("Failed to finalize {}: {e}", path.display()))?;
    } else {
        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        writer
            .write_all(b"\n")
            .map_err(|e| format!("Failed to write stdout: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_writes_pretty_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_json(&json!({"a": [1, 2]}), Some(&path)).expect("write succeeds");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"), "file ends with a newline");
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let err = write_json(&json!({}), Some(Path::new("/nonexistent/dir/out.json"))).unwrap_err();
        assert!(err.contains("/nonexistent/dir/out.json"), "{err}");
    }
}
