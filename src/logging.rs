use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Spinner currently drawn on stderr, if any. Log lines are written while it
/// is suspended so they land above it instead of through it.
static ACTIVE_BAR: Lazy<Mutex<Option<ProgressBar>>> = Lazy::new(|| Mutex::new(None));

/// Diagnostics go to stderr so stdout stays reserved for report output.
/// `RUST_LOG` overrides the default level; `verbose` lowers it to debug.
pub fn init(verbose: bool) -> Result<(), String> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hotspot_health={default_level},warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(SpinnerAwareStderr)
                .with_target(false)
                .without_time(),
        )
        .try_init()
        .map_err(|e| format!("Failed to set global subscriber: {e}"))
}

/// Routes log output around `bar` until [`detach_spinner`] is called.
pub fn attach_spinner(bar: &ProgressBar) {
    if let Ok(mut slot) = ACTIVE_BAR.lock() {
        *slot = Some(bar.clone());
    }
}

pub fn detach_spinner() {
    if let Ok(mut slot) = ACTIVE_BAR.lock() {
        *slot = None;
    }
}

fn active_bar() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().ok().and_then(|slot| slot.clone())
}

#[derive(Clone, Copy)]
struct SpinnerAwareStderr;

impl<'a> MakeWriter<'a> for SpinnerAwareStderr {
    type Writer = SpinnerAwareStderr;

    fn make_writer(&'a self) -> Self::Writer {
        SpinnerAwareStderr
    }
}

impl Write for SpinnerAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match active_bar() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_attach_and_detach() {
        let bar = ProgressBar::hidden();
        attach_spinner(&bar);
        assert!(active_bar().is_some(), "attached spinner is visible to the writer");
        let mut w = SpinnerAwareStderr;
        w.write_all(b"").expect("writing while suspended succeeds");
        detach_spinner();
        assert!(active_bar().is_none());
    }
}
