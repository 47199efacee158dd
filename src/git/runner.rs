use std::path::Path;
use std::process::Command;

/// Issues one version-control command and returns its standard output.
///
/// A non-zero exit status is an `Err` carrying the command's stderr, so each
/// caller decides whether that single query failure is fatal.
pub trait GitRunner {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, String>;
}

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl GitRunner for SystemGit {
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| format!("Failed to run git: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or(""),
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// Scripted histories in tests are plain closures.
impl<F> GitRunner for F
where
    F: Fn(&Path, &[&str]) -> Result<String, String>,
{
    fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, String> {
        self(cwd, args)
    }
}

/// True when `path` is the root of a git work tree (`.git` dir or file).
pub fn is_repository(path: &Path) -> bool {
    path.join(".git").exists()
}
