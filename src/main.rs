mod aggregate;
mod analyzers;
mod config;
mod filters;
mod git;
mod health;
mod logging;
mod reporters;
mod scoring;
mod types;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use analyzers::metrics::MetricsEngine;
use config::Settings;
use git::SystemGit;
use health::{AnthropicClient, Orchestrator, PromptTemplates};

const DEFAULT_CONFIG_FILE: &str = ".hotspot-health.yml";

#[derive(Parser, Debug)]
#[command(
    name = "hotspot-health",
    about = "🔥 Find frequently changed files and ask a model how healthy they are",
    version,
    long_about = "Mines git history for hotspots (files that change often and recently),\n\
                  then asks a reasoning service to score the code health of each one and\n\
                  to prioritize the resulting technical debt.\n\n\
                  Requires ANTHROPIC_API_KEY in the environment or a .env file,\n\
                  unless --metrics-only is given."
)]
struct Args {
    /// Path to the git repository to analyze.
    #[arg(value_name = "REPO", default_value = ".")]
    repo_path: PathBuf,

    /// Number of top hotspots to analyze.
    #[arg(short = 'n', long)]
    max_files: Option<usize>,

    /// Only mine git metrics; no reasoning-service calls.
    #[arg(long)]
    metrics_only: bool,

    /// Directory for result files (default: <results_dir>/<repo>-<timestamp>).
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// YAML config file (default: <REPO>/.hotspot-health.yml when present).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print an annotated config template, or write it to FILE.
    #[arg(long, value_name = "FILE")]
    generate_config: Option<Option<PathBuf>>,

    /// Output format: terminal, json
    #[arg(long, default_value = "terminal")]
    format: String,

    /// Commits within this many days count as recent.
    #[arg(long)]
    recent_days: Option<u32>,

    /// Minimum total commits for a file to be a hotspot.
    #[arg(long)]
    threshold: Option<usize>,

    /// Debug-level diagnostics on stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    if let Some(target) = &args.generate_config {
        if let Err(e) = config::print_template(target.as_deref()) {
            fail(&e);
        }
        return;
    }

    if let Err(e) = logging::init(args.verbose) {
        fail(&e);
    }

    if let Err(e) = run(&args) {
        fail(&e);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Built-in defaults, then the config file, then CLI flags.
fn resolve_settings(args: &Args, repo: &Path) -> Result<Settings, String> {
    let mut settings = Settings::default();

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(repo.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };
    if let Some(path) = config_path {
        let cfg = config::load_config(&path)?;
        info!(config = %path.display(), "loaded config file");
        settings = settings.apply(&cfg);
    }

    if let Some(v) = args.max_files { settings.max_files = v; }
    if let Some(v) = args.recent_days { settings.recent_days = v; }
    if let Some(v) = args.threshold { settings.hotspot_threshold = v; }
    if settings.max_files == 0 {
        return Err("Invalid --max-files value: 0. Must be 1 or greater".to_string());
    }
    Ok(settings)
}

fn run(args: &Args) -> Result<(), String> {
    if !matches!(args.format.as_str(), "terminal" | "json") {
        return Err(format!("Unknown format '{}'. Use terminal or json", args.format));
    }

    let repo = args.repo_path.canonicalize()
        .map_err(|e| format!("Cannot resolve repository path {}: {e}", args.repo_path.display()))?;
    if !git::is_repository(&repo) {
        return Err(format!("Not a git repository: {}", repo.display()));
    }
    let settings = resolve_settings(args, &repo)?;
    let repo_name = aggregate::repo_name(&repo);
    let out_dir = args.output.clone()
        .unwrap_or_else(|| reporters::timestamped_dir(&settings.results_dir, &repo_name));

    // Configuration problems surface before any history is mined.
    let service = if args.metrics_only {
        None
    } else {
        let key = config::api_key()?;
        let templates = PromptTemplates::locate(settings.prompts_dir.as_deref())?;
        Some((AnthropicClient::new(&settings, key)?, templates))
    };

    let pb = spinner();
    let total_start = Instant::now();
    let mut step_start = Instant::now();

    pb.set_message("[1/3] Mining git history...");
    let git = SystemGit;
    let extraction = match MetricsEngine::new(&git, &settings).extract(&repo) {
        Ok(x) => x,
        Err(e) => {
            pb.finish_and_clear();
            logging::detach_spinner();
            return Err(e);
        }
    };
    let file_count = extraction.records.len() + extraction.skipped.len();
    pb.println(format!(
        "  ✓ [1/3] Mined {file_count} files                  {}",
        fmt_dur(step_start.elapsed()),
    ));
    step_start = Instant::now();

    pb.set_message("[2/3] Ranking hotspots...");
    let mut hotspots = scoring::rank_hotspots(
        &extraction.records,
        settings.hotspot_threshold,
        &settings.weights,
    );
    let hotspot_count = hotspots.len();
    hotspots.truncate(settings.max_files);
    pb.println(format!(
        "  ✓ [2/3] {hotspot_count} hotspots (threshold {})         {}",
        settings.hotspot_threshold,
        fmt_dur(step_start.elapsed()),
    ));
    step_start = Instant::now();

    let Some((client, templates)) = service else {
        pb.finish_and_clear();
        logging::detach_spinner();
        let path = reporters::save_metrics(&extraction.records, &out_dir)?;
        match args.format.as_str() {
            "json" => reporters::json::write_json(&hotspots, None)?,
            _ => reporters::terminal::report_hotspots(&hotspots),
        }
        eprintln!("✔ Metrics saved to {} (⏱ {})", path.display(), fmt_dur(total_start.elapsed()));
        return Ok(());
    };

    pb.set_message(format!("[3/3] Analyzing {} hotspots (two requests each)...", hotspots.len()));
    let orchestrator = Orchestrator::new(&repo, &templates, &client);
    let outcomes = orchestrator.analyze_all(&hotspots);
    pb.println(format!(
        "  ✓ [3/3] Health and priority analysis       {}",
        fmt_dur(step_start.elapsed()),
    ));
    pb.finish_and_clear();
    logging::detach_spinner();

    let report = aggregate::build_report(&repo, file_count, hotspot_count, extraction.skipped, outcomes);
    reporters::save_results(&report, &out_dir)?;

    match args.format.as_str() {
        "json" => reporters::json::write_json(&report, None)?,
        _ => reporters::terminal::report_terminal(&report),
    }
    eprintln!("✔ Results saved to {} (⏱ {})", out_dir.display(), fmt_dur(total_start.elapsed()));
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    logging::attach_spinner(&pb);
    pb
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["hotspot-health"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_fmt_dur() {
        assert_eq!(fmt_dur(Duration::from_millis(250)), "250ms");
        assert_eq!(fmt_dur(Duration::from_millis(1500)), "1.5s");
    }

    #[test]
    fn test_defaults() {
        let a = args(&[]);
        assert_eq!(a.repo_path, PathBuf::from("."));
        assert!(a.generate_config.is_none());
        assert!(!a.metrics_only);
    }

    #[test]
    fn test_generate_config_value_is_optional() {
        assert_eq!(args(&["--generate-config"]).generate_config, Some(None));
        assert_eq!(
            args(&["--generate-config", "out.yml"]).generate_config,
            Some(Some(PathBuf::from("out.yml"))),
        );
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(DEFAULT_CONFIG_FILE), "max_files: 3\nrecent_days: 30\n").unwrap();
        let a = args(&["-n", "7"]);
        let settings = resolve_settings(&a, tmp.path()).expect("config resolves");
        assert_eq!(settings.max_files, 7, "CLI wins over config file");
        assert_eq!(settings.recent_days, 30, "config file wins over defaults");
        assert_eq!(settings.hotspot_threshold, 5, "default kept");
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(DEFAULT_CONFIG_FILE), "bogus_key: 1\n").unwrap();
        assert!(resolve_settings(&args(&[]), tmp.path()).is_err());
    }

    #[test]
    fn test_zero_max_files_flag_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(resolve_settings(&args(&["-n", "0"]), tmp.path()).is_err());
    }
}
